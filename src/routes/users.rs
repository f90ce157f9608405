use crate::error::RegistryError;
use crate::models::*;
use crate::state::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{State, get, post};

/// Sign in with a provider token; the user row is created on first use
#[post("/api/users/session")]
pub async fn sign_in(
    token: BearerToken,
    state: &State<AppState>,
) -> Result<Json<UserResponse>, RegistryError> {
    let identity = state.vcs.identify(&token.0).await?;
    let profile = UserProfile {
        node_id: identity.node_id,
        username: identity.username,
        avatar: identity.avatar,
        data: serde_json::json!({}),
    };

    let user = state.database.find_or_create_user(&profile)?;
    info!("User '{}' signed in", user.username);
    Ok(Json(user.to_response()))
}

#[get("/api/users/<username>")]
pub async fn get_user(
    username: &str,
    state: &State<AppState>,
) -> Result<Json<UserResponse>, RegistryError> {
    Ok(Json(state.database.get_user_by_name(username)?.to_response()))
}

/// Packages starred by the named user
#[get("/api/users/<username>/stars")]
pub async fn get_user_stars(
    username: &str,
    state: &State<AppState>,
) -> Result<Json<Vec<PackageSummary>>, RegistryError> {
    let user = state.database.get_user_by_name(username)?;
    let packages = state.database.get_starred_packages(user.id)?;
    Ok(Json(packages.iter().map(Package::summary).collect()))
}

/// Packages starred by the caller
#[get("/api/stars")]
pub async fn get_own_stars(
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<Vec<PackageSummary>>, RegistryError> {
    let packages = state.database.get_starred_packages(user.user_id)?;
    Ok(Json(packages.iter().map(Package::summary).collect()))
}
