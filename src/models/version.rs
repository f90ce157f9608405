use crate::models::pointer::Pointer;
use crate::schema::versions;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::serde::{Deserialize, Serialize};
use std::fmt;

/// License recorded when a version does not declare one.
pub const NO_LICENSE: &str = "NONE";

// Version row - one published semver of a package
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Version {
    pub id: i32,
    pub package: Pointer,
    pub status: String,
    pub semver: String,
    pub license: String,
    pub engine: String, // JSON object as text
    pub meta: String,   // JSON object as text
    pub created: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = versions)]
pub struct NewVersion {
    pub package: Pointer,
    pub status: String,
    pub semver: String,
    pub license: String,
    pub engine: String,
    pub meta: String,
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Latest,
    Published,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A version as supplied by a publisher.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewVersionDescriptor {
    pub semver: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub engines: serde_json::Value,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
}

/// Version entry as returned inside a package read.
#[derive(Serialize, Debug, Clone)]
pub struct VersionSummary {
    pub semver: String,
    pub status: String,
    pub license: String,
    pub engines: serde_json::Value,
    pub meta: serde_json::Value,
    pub created: NaiveDateTime,
}

impl NewVersion {
    pub fn from_descriptor(
        package: Pointer,
        descriptor: &NewVersionDescriptor,
        status: VersionStatus,
    ) -> Self {
        // Tarball location and checksum travel inside the per-version document
        let mut meta = match &descriptor.metadata {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if let Some(url) = &descriptor.tarball_url {
            meta.insert("tarball_url".to_string(), url.clone().into());
        }
        if let Some(sha) = &descriptor.sha {
            meta.insert("sha".to_string(), sha.clone().into());
        }

        let engine = match &descriptor.engines {
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };

        Self {
            package,
            status: status.to_string(),
            semver: descriptor.semver.clone(),
            license: descriptor
                .license
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| NO_LICENSE.to_string()),
            engine: engine.to_string(),
            meta: serde_json::Value::Object(meta).to_string(),
            created: chrono::Utc::now().naive_utc(),
        }
    }
}

impl Version {
    pub fn is_latest(&self) -> bool {
        self.status == VersionStatus::Latest.as_str()
    }

    pub fn parsed_semver(&self) -> Result<semver::Version, semver::Error> {
        semver::Version::parse(&self.semver)
    }

    pub fn tarball_url(&self) -> Option<String> {
        serde_json::from_str::<serde_json::Value>(&self.meta)
            .ok()?
            .get("tarball_url")?
            .as_str()
            .map(|s| s.to_string())
    }

    pub fn summary(&self) -> Result<VersionSummary, serde_json::Error> {
        Ok(VersionSummary {
            semver: self.semver.clone(),
            status: self.status.clone(),
            license: self.license.clone(),
            engines: serde_json::from_str(&self.engine)?,
            meta: serde_json::from_str(&self.meta)?,
            created: self.created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(license: Option<&str>) -> NewVersionDescriptor {
        NewVersionDescriptor {
            semver: "1.2.3".to_string(),
            license: license.map(|l| l.to_string()),
            engines: serde_json::Value::Null,
            metadata: serde_json::json!({"main": "./lib/main"}),
            tarball_url: Some("https://example.test/t.tgz".to_string()),
            sha: Some("abc123".to_string()),
        }
    }

    #[test]
    fn test_missing_license_uses_sentinel() {
        let version =
            NewVersion::from_descriptor(Pointer::generate(), &descriptor(None), VersionStatus::Latest);
        assert_eq!(version.license, NO_LICENSE);
        assert_eq!(version.engine, "{}");
    }

    #[test]
    fn test_tarball_reference_stored_in_meta() {
        let version = NewVersion::from_descriptor(
            Pointer::generate(),
            &descriptor(Some("MIT")),
            VersionStatus::Published,
        );
        let meta: serde_json::Value = serde_json::from_str(&version.meta).unwrap();
        assert_eq!(meta["tarball_url"], "https://example.test/t.tgz");
        assert_eq!(meta["sha"], "abc123");
        assert_eq!(meta["main"], "./lib/main");
        assert_eq!(version.status, "published");
    }
}
