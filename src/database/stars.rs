use super::connection::{DbPool, get_connection_with_retry};
use super::counters::{self, Counter, Delta};
use super::names;
use crate::error::{RegistryError, RegistryResult};
use crate::models::pointer::Pointer;
use crate::models::user::*;
use crate::schema::{stars, users};
use diesel::prelude::*;
use log::{debug, info};

/// Star edges between users and packages.
///
/// The edge table is authoritative. `packages.stargazers_count` is moved in
/// the same transaction as the edge insert or delete.
pub struct StarOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> StarOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Stars a package for a user. Starring twice is a no-op success.
    pub fn star_package(&self, user_id: i32, name: &str) -> RegistryResult<String> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            ensure_user(conn, user_id)?;

            let inserted = diesel::insert_or_ignore_into(stars::table)
                .values(&NewStar::new(pointer, user_id))
                .execute(conn)?;

            if inserted > 0 {
                counters::adjust(conn, &pointer, Counter::Stargazers, Delta::Increment)?;
                info!("User {} starred {}", user_id, pointer);
            } else {
                debug!("User {} had already starred {}", user_id, pointer);
            }

            Ok(format!("Package Successfully Starred by user {user_id}"))
        })
    }

    /// Removes a star. Unstarring a package that was never starred is `NotFound`.
    pub fn unstar_package(&self, user_id: i32, name: &str) -> RegistryResult<String> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;

            let removed = diesel::delete(
                stars::table
                    .filter(stars::package.eq(&pointer))
                    .filter(stars::userid.eq(user_id)),
            )
            .execute(conn)?;

            if removed == 0 {
                return Err(RegistryError::NotFound(format!(
                    "User {} has not starred '{}'",
                    user_id,
                    names::normalize(name)
                )));
            }

            counters::adjust(conn, &pointer, Counter::Stargazers, Delta::Decrement)?;
            info!("User {} unstarred {}", user_id, pointer);

            Ok(format!("Package Successfully Unstarred by user {user_id}"))
        })
    }

    /// Pointers of every package the user has starred
    pub fn list_starred_pointers(&self, user_id: i32) -> RegistryResult<Vec<Pointer>> {
        let mut conn = get_connection_with_retry(self.pool)?;
        Ok(stars::table
            .filter(stars::userid.eq(user_id))
            .order(stars::created.asc())
            .select(stars::package)
            .load::<Pointer>(&mut conn)?)
    }

    /// Ids of every user that starred the package
    pub fn list_stargazers(&self, name: &str) -> RegistryResult<Vec<i32>> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.transaction::<_, RegistryError, _>(|conn| {
            let pointer = names::resolve(conn, name)?;
            Ok(stars::table
                .filter(stars::package.eq(&pointer))
                .order(stars::userid.asc())
                .select(stars::userid)
                .load::<i32>(conn)?)
        })
    }
}

fn ensure_user(conn: &mut diesel::sqlite::SqliteConnection, user_id: i32) -> RegistryResult<()> {
    let found: i64 = users::table
        .filter(users::id.eq(user_id))
        .count()
        .get_result(conn)?;

    if found == 0 {
        return Err(RegistryError::NotFound(format!("User {user_id} not found")));
    }
    Ok(())
}
