use super::connection::{DbPool, get_connection_with_retry};
use super::{names, versions};
use crate::error::{RegistryError, RegistryResult};
use crate::models::package::*;
use crate::models::pointer::Pointer;
use crate::schema::{names as names_table, packages, stars, versions as versions_table};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info};

/// Package lifecycle: create with a first version, rename, delete and read
pub struct PackageOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> PackageOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Creates the package row, its name row and its first (latest) version
    /// in one transaction and returns the new pointer
    pub fn create_package(&self, descriptor: &NewPackageDescriptor) -> RegistryResult<Pointer> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            create_package(conn, descriptor)
        })
    }

    /// Adds `new_name` to the name history of the package currently known
    /// as `current_name` and makes it the display name
    pub fn rename_package(&self, new_name: &str, current_name: &str) -> RegistryResult<Package> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, current_name)?;
            let new_name = names::normalize(new_name);

            if names::is_taken(conn, &new_name)? {
                return Err(RegistryError::Conflict(format!(
                    "Package name '{new_name}' is already taken"
                )));
            }

            diesel::insert_into(names_table::table)
                .values(&NewName::new(&new_name, pointer))
                .execute(conn)?;

            diesel::update(packages::table.filter(packages::pointer.eq(&pointer)))
                .set((
                    packages::name.eq(&new_name),
                    packages::updated.eq(chrono::Utc::now().naive_utc()),
                ))
                .execute(conn)?;

            info!("Renamed package {} to '{}'", pointer, new_name);

            Ok(packages::table
                .filter(packages::pointer.eq(&pointer))
                .first::<Package>(conn)?)
        })
    }

    /// Deletes a package with its names, versions and star edges
    pub fn delete_package(&self, name: &str) -> RegistryResult<String> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            let package_name = packages::table
                .filter(packages::pointer.eq(&pointer))
                .select(packages::name)
                .first::<String>(conn)?;

            let removed_stars =
                diesel::delete(stars::table.filter(stars::package.eq(&pointer))).execute(conn)?;
            let removed_versions =
                diesel::delete(versions_table::table.filter(versions_table::package.eq(&pointer)))
                    .execute(conn)?;
            let removed_names =
                diesel::delete(names_table::table.filter(names_table::pointer.eq(&pointer)))
                    .execute(conn)?;
            diesel::delete(packages::table.filter(packages::pointer.eq(&pointer))).execute(conn)?;

            info!(
                "Deleted package '{}' ({} versions, {} names, {} stars)",
                package_name, removed_versions, removed_names, removed_stars
            );

            Ok(format!("Successfully deleted package: {package_name}"))
        })
    }

    /// Gets the bare package row by any of its names
    pub fn get_package(&self, name: &str) -> RegistryResult<Package> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            Ok(find_by_pointer(conn, &pointer)?)
        })
    }

    /// Gets a package joined with its versions (oldest first)
    pub fn get_package_details(&self, name: &str) -> RegistryResult<PackageDetails> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            let package = find_by_pointer(conn, &pointer)?;
            let versions = versions::list_for(conn, &pointer)?;

            let versions = versions
                .iter()
                .map(|v| v.summary())
                .collect::<Result<Vec<_>, _>>()?;

            debug!("Loaded '{}' with {} versions", package.name, versions.len());

            Ok(PackageDetails {
                pointer: package.pointer,
                data: package.document()?,
                stargazers_count: package.displayed_stars().to_string(),
                downloads: package.downloads.to_string(),
                name: package.name,
                created: package.created,
                updated: package.updated,
                creation_method: package.creation_method,
                package_type: package.package_type,
                versions,
            })
        })
    }

    /// Gets package rows for a list of pointers; missing pointers are skipped
    pub fn get_packages_by_pointers(&self, pointers: &[Pointer]) -> RegistryResult<Vec<Package>> {
        if pointers.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection_with_retry(self.pool)?;
        Ok(packages::table
            .filter(packages::pointer.eq_any(pointers))
            .order(packages::name.asc())
            .load::<Package>(&mut conn)?)
    }
}

pub(crate) fn find_by_pointer(
    conn: &mut SqliteConnection,
    pointer: &Pointer,
) -> Result<Package, diesel::result::Error> {
    packages::table
        .filter(packages::pointer.eq(pointer))
        .first::<Package>(conn)
}

pub(crate) fn create_package(
    conn: &mut SqliteConnection,
    descriptor: &NewPackageDescriptor,
) -> RegistryResult<Pointer> {
    let name = names::normalize(&descriptor.name);

    // Historical names count as taken, not only current ones
    if names::is_taken(conn, &name)? {
        return Err(RegistryError::Conflict(format!(
            "Package name '{name}' is already taken"
        )));
    }

    let pointer = Pointer::generate();
    let new_package = NewPackage::from_descriptor(pointer, &name, descriptor);

    diesel::insert_into(packages::table)
        .values(&new_package)
        .execute(conn)?;

    diesel::insert_into(names_table::table)
        .values(&NewName::new(&name, pointer))
        .execute(conn)?;

    versions::insert_initial(conn, &pointer, &descriptor.version)?;

    info!(
        "Created package '{}' ({}) at {}",
        name, pointer, descriptor.version.semver
    );

    Ok(pointer)
}
