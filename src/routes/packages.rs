use crate::error::RegistryError;
use crate::models::*;
use crate::state::AppState;
use log::{debug, info};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};

/// Checks the caller's role on the repository a package was published from
pub(crate) async fn authorize_package(
    state: &AppState,
    user: &AuthenticatedUser,
    name: &str,
) -> Result<OwnershipRole, RegistryError> {
    let package = state.database.get_package(name)?;
    let document = package.document()?;
    let repository: Repository = serde_json::from_value(document["repository"].clone())?;
    let slug = repository.slug().ok_or_else(|| {
        RegistryError::ServerError(format!(
            "Package '{}' has an unusable repository reference",
            package.name
        ))
    })?;

    let role = state.vcs.check_ownership(&user.token, &slug).await?;
    debug!("User {} holds {} on {}", user.username, role, slug);
    Ok(role)
}

/// Publish a new package with its first version
#[post("/api/packages", data = "<descriptor>")]
pub async fn create_package(
    descriptor: Json<NewPackageDescriptor>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<(Status, Json<PackageDetails>), RegistryError> {
    let slug = descriptor.repository.slug().ok_or_else(|| {
        RegistryError::BadRequest(format!(
            "Repository '{}' is not an owner/repo reference",
            descriptor.repository.url
        ))
    })?;

    let role = state.vcs.check_ownership(&user.token, &slug).await?;
    if !role.can_publish() {
        return Err(RegistryError::BadAuth(format!(
            "Role '{role}' cannot publish from {slug}"
        )));
    }

    let pointer = state.database.create_package(&descriptor)?;
    info!(
        "User {} published '{}' ({})",
        user.username, descriptor.name, pointer
    );

    let details = state.database.get_package_details(&descriptor.name)?;
    Ok((Status::Created, Json(details)))
}

/// Get a package by current or former name
#[get("/api/packages/<name>")]
pub async fn get_package(
    name: &str,
    state: &State<AppState>,
) -> Result<Json<PackageDetails>, RegistryError> {
    Ok(Json(state.database.get_package_details(name)?))
}

/// Delete a package and everything attached to it
#[delete("/api/packages/<name>")]
pub async fn delete_package(
    name: &str,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let role = authorize_package(state, &user, name).await?;
    if !role.can_delete() {
        return Err(RegistryError::BadAuth(format!(
            "Role '{role}' cannot delete '{name}'"
        )));
    }

    let message = state.database.delete_package(name)?;
    Ok(Json(MessageResponse::new(message)))
}

/// Rename a package; the old name keeps resolving
#[post("/api/packages/<name>/rename", data = "<request>")]
pub async fn rename_package(
    name: &str,
    request: Json<RenameRequest>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<PackageDetails>, RegistryError> {
    let role = authorize_package(state, &user, name).await?;
    if !role.can_publish() {
        return Err(RegistryError::BadAuth(format!(
            "Role '{role}' cannot rename '{name}'"
        )));
    }

    let package = state.database.rename_package(&request.new_name, name)?;
    Ok(Json(state.database.get_package_details(&package.name)?))
}

/// Users that starred the package
#[get("/api/packages/<name>/stargazers")]
pub async fn get_stargazers(
    name: &str,
    state: &State<AppState>,
) -> Result<Json<Vec<UserResponse>>, RegistryError> {
    let ids = state.database.list_stargazers(name)?;
    let users = state.database.get_users_by_ids(&ids)?;
    Ok(Json(users.iter().map(User::to_response).collect()))
}

#[post("/api/packages/<name>/star")]
pub async fn star_package(
    name: &str,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let message = state.database.star_package(user.user_id, name)?;
    Ok(Json(MessageResponse::new(message)))
}

#[delete("/api/packages/<name>/star")]
pub async fn unstar_package(
    name: &str,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let message = state.database.unstar_package(user.user_id, name)?;
    Ok(Json(MessageResponse::new(message)))
}
