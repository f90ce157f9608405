use super::connection::{DbPool, get_connection_with_retry};
use super::names;
use crate::error::{RegistryError, RegistryResult};
use crate::models::pointer::Pointer;
use crate::models::version::*;
use crate::schema::{packages, versions};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};

/// Version lifecycle: publish, demote/promote and removal of versions.
///
/// Every pointer keeps exactly one `latest` row. Mutations run inside
/// `BEGIN IMMEDIATE` so the read of the current latest row and the
/// demote/promote writes that follow it cannot interleave with another
/// writer; the partial unique index on `versions(package)` backs this up.
pub struct VersionOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> VersionOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Publishes a new version for the pointer
    pub fn add_version(
        &self,
        pointer: &Pointer,
        descriptor: &NewVersionDescriptor,
    ) -> RegistryResult<String> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            add_version(conn, pointer, descriptor)
        })
    }

    /// Removes a version, promoting the highest remaining one if needed
    pub fn remove_version(&self, name: &str, semver: &str) -> RegistryResult<String> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            remove_version(conn, name, semver)
        })
    }

    /// Gets a single version addressed by package name and semver
    pub fn get_by_semver(&self, name: &str, semver: &str) -> RegistryResult<Version> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            find_by_semver(conn, &pointer, semver)?.ok_or_else(|| version_not_found(name, semver))
        })
    }

    /// Gets the current latest version of a package
    pub fn get_latest(&self, name: &str) -> RegistryResult<Version> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            find_latest(conn, &pointer)?.ok_or_else(|| {
                RegistryError::NotFound(format!("Package '{}' has no latest version", name))
            })
        })
    }

    /// Gets all versions of a pointer, oldest first
    pub fn list_versions(&self, pointer: &Pointer) -> RegistryResult<Vec<Version>> {
        let mut conn = get_connection_with_retry(self.pool)?;
        Ok(list_for(&mut conn, pointer)?)
    }
}

pub(crate) fn list_for(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
) -> Result<Vec<Version>, diesel::result::Error> {
    versions::table
        .filter(versions::package.eq(pointer))
        .order(versions::id.asc())
        .load::<Version>(conn)
}

pub(crate) fn find_latest(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
) -> Result<Option<Version>, diesel::result::Error> {
    versions::table
        .filter(versions::package.eq(pointer))
        .filter(versions::status.eq(VersionStatus::Latest.as_str()))
        .first::<Version>(conn)
        .optional()
}

pub(crate) fn find_by_semver(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
    semver: &str,
) -> Result<Option<Version>, diesel::result::Error> {
    versions::table
        .filter(versions::package.eq(pointer))
        .filter(versions::semver.eq(semver))
        .first::<Version>(conn)
        .optional()
}

/// Inserts the first version of a freshly created package as `latest`.
pub(crate) fn insert_initial(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
    descriptor: &NewVersionDescriptor,
) -> RegistryResult<()> {
    parse_semver(&descriptor.semver)?;
    let new_version = NewVersion::from_descriptor(*pointer, descriptor, VersionStatus::Latest);
    diesel::insert_into(versions::table)
        .values(&new_version)
        .execute(conn)?;
    Ok(())
}

pub(crate) fn add_version(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
    descriptor: &NewVersionDescriptor,
) -> RegistryResult<String> {
    let incoming = parse_semver(&descriptor.semver)?;

    let (package_name, data) = packages::table
        .filter(packages::pointer.eq(pointer))
        .select((packages::name, packages::data))
        .first::<(String, String)>(conn)
        .optional()?
        .ok_or_else(|| RegistryError::NotFound(format!("Package {pointer} not found")))?;

    if find_by_semver(conn, pointer, &descriptor.semver)?.is_some() {
        return Err(RegistryError::Conflict(format!(
            "Version {} of '{}' already exists",
            descriptor.semver, package_name
        )));
    }

    let current = find_latest(conn, pointer)?;
    let becomes_latest = match &current {
        Some(latest) => incoming > stored_semver(latest)?,
        None => {
            warn!("Package '{package_name}' had no latest version; promoting {incoming}");
            true
        }
    };

    let status = if becomes_latest {
        // Demote first so the one-latest index never sees two rows
        if let Some(latest) = &current {
            diesel::update(versions::table.filter(versions::id.eq(latest.id)))
                .set(versions::status.eq(VersionStatus::Published.as_str()))
                .execute(conn)?;
            debug!("Demoted {}@{} to published", package_name, latest.semver);
        }
        VersionStatus::Latest
    } else {
        VersionStatus::Published
    };

    let new_version = NewVersion::from_descriptor(*pointer, descriptor, status);
    diesel::insert_into(versions::table)
        .values(&new_version)
        .execute(conn)?;

    let now = chrono::Utc::now().naive_utc();
    if becomes_latest {
        // The package document mirrors the metadata of its latest version
        let mut document: serde_json::Value = serde_json::from_str(&data)?;
        if let Some(map) = document.as_object_mut() {
            map.insert("metadata".to_string(), descriptor.metadata.clone());
        }
        diesel::update(packages::table.filter(packages::pointer.eq(pointer)))
            .set((
                packages::data.eq(document.to_string()),
                packages::updated.eq(now),
            ))
            .execute(conn)?;
    } else {
        diesel::update(packages::table.filter(packages::pointer.eq(pointer)))
            .set(packages::updated.eq(now))
            .execute(conn)?;
    }

    info!("Published {}@{} as {}", package_name, descriptor.semver, status);

    Ok(format!(
        "Successfully added new version: {}@{}",
        package_name, descriptor.semver
    ))
}

pub(crate) fn remove_version(
    conn: &mut SqliteConnection,
    name: &str,
    semver: &str,
) -> RegistryResult<String> {
    let pointer = names::resolve(conn, name)?;
    let package_name = packages::table
        .filter(packages::pointer.eq(&pointer))
        .select(packages::name)
        .first::<String>(conn)?;

    let target =
        find_by_semver(conn, &pointer, semver)?.ok_or_else(|| version_not_found(name, semver))?;

    let version_count: i64 = versions::table
        .filter(versions::package.eq(&pointer))
        .count()
        .get_result(conn)?;

    if version_count <= 1 {
        return Err(RegistryError::Conflict(format!(
            "Cannot remove {}@{}: a package cannot be left without a published version",
            package_name, semver
        )));
    }

    diesel::delete(versions::table.filter(versions::id.eq(target.id))).execute(conn)?;

    let latest_semver = if target.is_latest() {
        let remaining = list_for(conn, &pointer)?;
        let successor = highest(&remaining)?.ok_or_else(|| {
            RegistryError::ServerError(format!("No remaining versions for '{package_name}'"))
        })?;

        diesel::update(versions::table.filter(versions::id.eq(successor.id)))
            .set(versions::status.eq(VersionStatus::Latest.as_str()))
            .execute(conn)?;
        info!(
            "Promoted {}@{} to latest after removing {}",
            package_name, successor.semver, semver
        );
        successor.semver.clone()
    } else {
        find_latest(conn, &pointer)?
            .map(|v| v.semver)
            .ok_or_else(|| {
                RegistryError::ServerError(format!("Package '{package_name}' has no latest version"))
            })?
    };

    diesel::update(packages::table.filter(packages::pointer.eq(&pointer)))
        .set(packages::updated.eq(chrono::Utc::now().naive_utc()))
        .execute(conn)?;

    info!("Removed {}@{}", package_name, semver);

    Ok(format!(
        "Successfully removed {}@{}; {} is now the latest version",
        package_name, semver, latest_semver
    ))
}

/// Picks the version with the highest semver precedence
pub(crate) fn highest(versions: &[Version]) -> RegistryResult<Option<&Version>> {
    let mut best: Option<(&Version, semver::Version)> = None;
    for version in versions {
        let parsed = stored_semver(version)?;
        let replace = match &best {
            Some((_, current)) => parsed > *current,
            None => true,
        };
        if replace {
            best = Some((version, parsed));
        }
    }
    Ok(best.map(|(version, _)| version))
}

pub fn parse_semver(semver: &str) -> RegistryResult<semver::Version> {
    semver::Version::parse(semver)
        .map_err(|e| RegistryError::BadRequest(format!("Invalid semver '{semver}': {e}")))
}

fn stored_semver(version: &Version) -> RegistryResult<semver::Version> {
    version.parsed_semver().map_err(|e| {
        RegistryError::ServerError(format!(
            "Stored version '{}' is not valid semver: {e}",
            version.semver
        ))
    })
}

fn version_not_found(name: &str, semver: &str) -> RegistryError {
    RegistryError::NotFound(format!(
        "Version {} of '{}' not found",
        semver,
        names::normalize(name)
    ))
}
