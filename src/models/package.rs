use crate::models::pointer::Pointer;
use crate::models::version::{NewVersionDescriptor, VersionSummary};
use crate::schema::{names, packages};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Package row - identity, current name, counters and the descriptive document
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Package {
    pub pointer: Pointer,
    pub name: String,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
    pub creation_method: String,
    pub downloads: i64,
    pub stargazers_count: i64,
    pub original_stargazers: i64,
    pub package_type: String,
    pub data: String, // JSON document as text
}

#[derive(Insertable, Debug)]
#[diesel(table_name = packages)]
pub struct NewPackage {
    pub pointer: Pointer,
    pub name: String,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
    pub creation_method: String,
    pub downloads: i64,
    pub stargazers_count: i64,
    pub original_stargazers: i64,
    pub package_type: String,
    pub data: String,
}

// Name history row - any name a package has ever carried
#[derive(Insertable, Debug)]
#[diesel(table_name = names)]
pub struct NewName {
    pub name: String,
    pub pointer: Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Package,
    Theme,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "package" => Ok(Self::Package),
            "theme" => Ok(Self::Theme),
            other => Err(format!("Unknown package type '{other}'")),
        }
    }
}

/// Repository reference, e.g. `{"type": "git", "url": "https://github.com/owner/repo"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl Repository {
    /// `owner/repo` slug used for provider ownership checks.
    pub fn slug(&self) -> Option<String> {
        let trimmed = self
            .url
            .trim_end_matches('/')
            .trim_end_matches(".git");
        let mut parts = trimmed.rsplit('/');
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let owner = parts.next().filter(|s| !s.is_empty() && !s.contains(':'))?;
        Some(format!("{owner}/{repo}"))
    }
}

/// Everything needed to create a package together with its first version.
#[derive(Deserialize, Debug, Clone)]
pub struct NewPackageDescriptor {
    pub name: String,
    pub repository: Repository,
    #[serde(default)]
    pub readme: String,
    pub creation_method: String,
    pub owner: String,
    #[serde(default)]
    pub package_type: PackageType,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub version: NewVersionDescriptor,
}

/// Read view of a package: the row plus its versions, oldest first.
///
/// Counters are rendered as strings so large values survive JSON clients that
/// parse numbers as doubles.
#[derive(Serialize, Debug, Clone)]
pub struct PackageDetails {
    pub pointer: Pointer,
    pub name: String,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
    pub creation_method: String,
    pub downloads: String,
    pub stargazers_count: String,
    pub package_type: String,
    pub data: serde_json::Value,
    pub versions: Vec<VersionSummary>,
}

/// Package row without versions, returned by counter operations.
#[derive(Serialize, Debug, Clone)]
pub struct PackageSummary {
    pub pointer: Pointer,
    pub name: String,
    pub downloads: String,
    pub stargazers_count: String,
    pub package_type: String,
    pub updated: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct RenameRequest {
    pub new_name: String,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: String) -> Self {
        Self { ok: true, message }
    }
}

impl NewPackage {
    /// `name` must already be normalized; it is stored as given.
    pub fn from_descriptor(
        pointer: Pointer,
        name: &str,
        descriptor: &NewPackageDescriptor,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let data = serde_json::json!({
            "name": name,
            "owner": descriptor.owner,
            "readme": descriptor.readme,
            "repository": descriptor.repository,
            "metadata": descriptor.metadata,
        });
        Self {
            pointer,
            name: name.to_string(),
            created: now,
            updated: now,
            creation_method: descriptor.creation_method.clone(),
            downloads: 0,
            stargazers_count: 0,
            original_stargazers: 0,
            package_type: descriptor.package_type.to_string(),
            data: data.to_string(),
        }
    }
}

impl NewName {
    pub fn new(name: &str, pointer: Pointer) -> Self {
        Self {
            name: name.to_string(),
            pointer,
        }
    }
}

impl Package {
    pub fn document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// Star count shown to users: real star edges plus the imported offset.
    pub fn displayed_stars(&self) -> i64 {
        self.stargazers_count + self.original_stargazers
    }

    pub fn summary(&self) -> PackageSummary {
        PackageSummary {
            pointer: self.pointer,
            name: self.name.clone(),
            downloads: self.downloads.to_string(),
            stargazers_count: self.displayed_stars().to_string(),
            package_type: self.package_type.clone(),
            updated: self.updated,
        }
    }
}
