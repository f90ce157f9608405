use super::connection::{DbPool, get_connection_with_retry};
use crate::error::{RegistryError, RegistryResult};
use crate::models::pointer::Pointer;
use crate::schema::names;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// Identity resolution: any current or historical name to the package pointer
pub struct NameOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> NameOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Resolves a name, returning `None` when no package ever carried it
    pub fn find_pointer(&self, name: &str) -> RegistryResult<Option<Pointer>> {
        let mut conn = get_connection_with_retry(self.pool)?;
        Ok(lookup(&mut conn, name)?)
    }

    /// Resolves a name or fails with `NotFound`
    pub fn resolve(&self, name: &str) -> RegistryResult<Pointer> {
        let mut conn = get_connection_with_retry(self.pool)?;
        resolve(&mut conn, name)
    }

    /// Every name that resolves to the pointer, current name included
    pub fn name_history(&self, pointer: &Pointer) -> RegistryResult<Vec<String>> {
        let mut conn = get_connection_with_retry(self.pool)?;
        Ok(names::table
            .filter(names::pointer.eq(pointer))
            .select(names::name)
            .order(names::name.asc())
            .load::<String>(&mut conn)?)
    }
}

/// Names are stored lowercase; every lookup goes through this.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn lookup(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Pointer>, diesel::result::Error> {
    names::table
        .filter(names::name.eq(normalize(name)))
        .select(names::pointer)
        .first::<Pointer>(conn)
        .optional()
}

pub(crate) fn resolve(conn: &mut SqliteConnection, name: &str) -> RegistryResult<Pointer> {
    lookup(conn, name)?
        .ok_or_else(|| RegistryError::NotFound(format!("Package '{}' not found", normalize(name))))
}

pub(crate) fn is_taken(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<bool, diesel::result::Error> {
    Ok(lookup(conn, name)?.is_some())
}
