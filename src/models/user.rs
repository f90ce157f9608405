use crate::models::pointer::Pointer;
use crate::schema::{stars, users};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::serde::{Deserialize, Serialize};

// User row - created on first sign-in through the provider
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub node_id: String,
    pub username: String,
    pub avatar: String,
    pub data: String, // JSON profile as text
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub node_id: String,
    pub username: String,
    pub avatar: String,
    pub data: String,
    pub created_at: NaiveDateTime,
}

/// Profile handed over by the sign-in flow.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UserProfile {
    pub node_id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

// Star edge - a user favoriting a package
#[derive(Insertable, Debug)]
#[diesel(table_name = stars)]
pub struct NewStar {
    pub package: Pointer,
    pub userid: i32,
    pub created: NaiveDateTime,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub avatar: String,
    pub created_at: NaiveDateTime,
    pub data: serde_json::Value,
}

impl NewUser {
    pub fn from_profile(profile: &UserProfile) -> Self {
        let data = match &profile.data {
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        Self {
            node_id: profile.node_id.clone(),
            username: profile.username.clone(),
            avatar: profile.avatar.clone(),
            data: data.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

impl NewStar {
    pub fn new(package: Pointer, userid: i32) -> Self {
        Self {
            package,
            userid,
            created: chrono::Utc::now().naive_utc(),
        }
    }
}

impl User {
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            created_at: self.created_at,
            data: serde_json::from_str(&self.data).unwrap_or_else(|_| serde_json::json!({})),
        }
    }
}
