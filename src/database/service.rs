use super::connection::{DbConnection, DbPool, create_pool, get_connection_with_retry};
use super::counters::CounterOperations;
use super::names::NameOperations;
use super::packages::PackageOperations;
use super::stars::StarOperations;
use super::users::UserOperations;
use super::versions::VersionOperations;
use crate::error::RegistryResult;
use crate::models::*;

/// Main database service that provides a unified interface to all registry operations.
///
/// The service owns the connection pool; construct one per store (and per
/// test) and drop it to release every connection.
#[derive(Debug)]
pub struct DatabaseService {
    pub pool: DbPool,
}

impl DatabaseService {
    /// Creates a new DatabaseService with an initialized connection pool
    pub fn new(
        database_url: &str,
        pool_size: u32,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let pool = create_pool(database_url, pool_size)?;
        Ok(Self { pool })
    }

    /// Gets a connection from the pool with retry logic
    pub fn get_connection(&self) -> Result<DbConnection, diesel::r2d2::Error> {
        get_connection_with_retry(&self.pool)
    }

    // Identity resolution
    pub fn resolve_pointer(&self, name: &str) -> RegistryResult<Pointer> {
        NameOperations::new(&self.pool).resolve(name)
    }

    pub fn find_pointer(&self, name: &str) -> RegistryResult<Option<Pointer>> {
        NameOperations::new(&self.pool).find_pointer(name)
    }

    pub fn name_history(&self, pointer: &Pointer) -> RegistryResult<Vec<String>> {
        NameOperations::new(&self.pool).name_history(pointer)
    }

    // Package operations
    pub fn create_package(&self, descriptor: &NewPackageDescriptor) -> RegistryResult<Pointer> {
        PackageOperations::new(&self.pool).create_package(descriptor)
    }

    pub fn rename_package(&self, new_name: &str, current_name: &str) -> RegistryResult<Package> {
        PackageOperations::new(&self.pool).rename_package(new_name, current_name)
    }

    pub fn delete_package(&self, name: &str) -> RegistryResult<String> {
        PackageOperations::new(&self.pool).delete_package(name)
    }

    pub fn get_package(&self, name: &str) -> RegistryResult<Package> {
        PackageOperations::new(&self.pool).get_package(name)
    }

    pub fn get_package_details(&self, name: &str) -> RegistryResult<PackageDetails> {
        PackageOperations::new(&self.pool).get_package_details(name)
    }

    pub fn get_packages_by_pointers(&self, pointers: &[Pointer]) -> RegistryResult<Vec<Package>> {
        PackageOperations::new(&self.pool).get_packages_by_pointers(pointers)
    }

    // Version operations
    pub fn add_version(
        &self,
        pointer: &Pointer,
        descriptor: &NewVersionDescriptor,
    ) -> RegistryResult<String> {
        VersionOperations::new(&self.pool).add_version(pointer, descriptor)
    }

    pub fn remove_version(&self, name: &str, semver: &str) -> RegistryResult<String> {
        VersionOperations::new(&self.pool).remove_version(name, semver)
    }

    pub fn get_version(&self, name: &str, semver: &str) -> RegistryResult<Version> {
        VersionOperations::new(&self.pool).get_by_semver(name, semver)
    }

    pub fn get_latest_version(&self, name: &str) -> RegistryResult<Version> {
        VersionOperations::new(&self.pool).get_latest(name)
    }

    pub fn list_versions(&self, pointer: &Pointer) -> RegistryResult<Vec<Version>> {
        VersionOperations::new(&self.pool).list_versions(pointer)
    }

    // Counter operations
    pub fn increment_downloads(&self, name: &str) -> RegistryResult<PackageSummary> {
        CounterOperations::new(&self.pool).increment_downloads(name)
    }

    pub fn decrement_downloads(&self, name: &str) -> RegistryResult<PackageSummary> {
        CounterOperations::new(&self.pool).decrement_downloads(name)
    }

    pub fn increment_stars(&self, name: &str) -> RegistryResult<PackageSummary> {
        CounterOperations::new(&self.pool).increment_stars(name)
    }

    pub fn decrement_stars(&self, name: &str) -> RegistryResult<PackageSummary> {
        CounterOperations::new(&self.pool).decrement_stars(name)
    }

    pub fn reconcile_star_counts(&self) -> RegistryResult<usize> {
        CounterOperations::new(&self.pool).reconcile_star_counts()
    }

    // User operations
    pub fn create_user(&self, profile: &UserProfile) -> RegistryResult<User> {
        UserOperations::new(&self.pool).create_user(profile)
    }

    pub fn get_user_by_node_id(&self, node_id: &str) -> RegistryResult<User> {
        UserOperations::new(&self.pool).get_user_by_node_id(node_id)
    }

    pub fn get_user_by_name(&self, username: &str) -> RegistryResult<User> {
        UserOperations::new(&self.pool).get_user_by_name(username)
    }

    pub fn get_user_by_id(&self, id: i32) -> RegistryResult<User> {
        UserOperations::new(&self.pool).get_user_by_id(id)
    }

    pub fn get_users_by_ids(&self, ids: &[i32]) -> RegistryResult<Vec<User>> {
        UserOperations::new(&self.pool).get_users_by_ids(ids)
    }

    /// Returns the user for the node id, creating it on first sign-in
    pub fn find_or_create_user(&self, profile: &UserProfile) -> RegistryResult<User> {
        match self.get_user_by_node_id(&profile.node_id) {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => match self.create_user(profile) {
                // Lost a race with a concurrent first sign-in
                Err(e) if e.is_conflict() => self.get_user_by_node_id(&profile.node_id),
                other => other,
            },
            Err(e) => Err(e),
        }
    }

    // Star operations
    pub fn star_package(&self, user_id: i32, name: &str) -> RegistryResult<String> {
        StarOperations::new(&self.pool).star_package(user_id, name)
    }

    pub fn unstar_package(&self, user_id: i32, name: &str) -> RegistryResult<String> {
        StarOperations::new(&self.pool).unstar_package(user_id, name)
    }

    pub fn list_starred_pointers(&self, user_id: i32) -> RegistryResult<Vec<Pointer>> {
        StarOperations::new(&self.pool).list_starred_pointers(user_id)
    }

    pub fn list_stargazers(&self, name: &str) -> RegistryResult<Vec<i32>> {
        StarOperations::new(&self.pool).list_stargazers(name)
    }

    /// Packages the user has starred, resolved from the star edges
    pub fn get_starred_packages(&self, user_id: i32) -> RegistryResult<Vec<Package>> {
        let pointers = self.list_starred_pointers(user_id)?;
        self.get_packages_by_pointers(&pointers)
    }
}
