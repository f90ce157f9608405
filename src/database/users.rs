use super::connection::{DbPool, get_connection_with_retry};
use crate::error::{RegistryError, RegistryResult};
use crate::models::user::*;
use crate::schema::users;
use diesel::prelude::*;
use log::info;

/// User directory operations
pub struct UserOperations<'a> {
    pool: &'a DbPool,
}

impl<'a> UserOperations<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Creates a user keyed by the provider node id
    pub fn create_user(&self, profile: &UserProfile) -> RegistryResult<User> {
        let mut conn = get_connection_with_retry(self.pool)?;
        conn.immediate_transaction::<_, RegistryError, _>(|conn| {
            let exists: i64 = users::table
                .filter(users::node_id.eq(&profile.node_id))
                .count()
                .get_result(conn)?;
            if exists > 0 {
                return Err(RegistryError::Conflict(format!(
                    "User with node id '{}' already exists",
                    profile.node_id
                )));
            }

            diesel::insert_into(users::table)
                .values(&NewUser::from_profile(profile))
                .execute(conn)?;

            let user = users::table
                .filter(users::node_id.eq(&profile.node_id))
                .first::<User>(conn)?;

            info!("Created user '{}' with id {}", user.username, user.id);
            Ok(user)
        })
    }

    pub fn get_user_by_node_id(&self, node_id: &str) -> RegistryResult<User> {
        let mut conn = get_connection_with_retry(self.pool)?;
        users::table
            .filter(users::node_id.eq(node_id))
            .first::<User>(&mut conn)
            .optional()?
            .ok_or_else(|| RegistryError::NotFound(format!("User with node id '{node_id}' not found")))
    }

    pub fn get_user_by_name(&self, username: &str) -> RegistryResult<User> {
        let mut conn = get_connection_with_retry(self.pool)?;
        users::table
            .filter(users::username.eq(username))
            .order(users::id.asc())
            .first::<User>(&mut conn)
            .optional()?
            .ok_or_else(|| RegistryError::NotFound(format!("User '{username}' not found")))
    }

    pub fn get_user_by_id(&self, id: i32) -> RegistryResult<User> {
        let mut conn = get_connection_with_retry(self.pool)?;
        users::table
            .find(id)
            .first::<User>(&mut conn)
            .optional()?
            .ok_or_else(|| RegistryError::NotFound(format!("User {id} not found")))
    }

    /// One entry per id that exists; unknown ids are skipped
    pub fn get_users_by_ids(&self, ids: &[i32]) -> RegistryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection_with_retry(self.pool)?;
        Ok(users::table
            .filter(users::id.eq_any(ids))
            .order(users::id.asc())
            .load::<User>(&mut conn)?)
    }
}
