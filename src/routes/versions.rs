use crate::error::RegistryError;
use crate::models::*;
use crate::routes::packages::authorize_package;
use crate::state::AppState;
use log::debug;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post};

/// Publish a new version of an existing package
#[post("/api/packages/<name>/versions", data = "<descriptor>")]
pub async fn add_version(
    name: &str,
    descriptor: Json<NewVersionDescriptor>,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<(Status, Json<MessageResponse>), RegistryError> {
    let role = authorize_package(state, &user, name).await?;
    if !role.can_publish() {
        return Err(RegistryError::BadAuth(format!(
            "Role '{role}' cannot publish versions of '{name}'"
        )));
    }

    let pointer = state.database.resolve_pointer(name)?;
    let message = state.database.add_version(&pointer, &descriptor)?;
    Ok((Status::Created, Json(MessageResponse::new(message))))
}

#[get("/api/packages/<name>/versions/<semver>")]
pub async fn get_version(
    name: &str,
    semver: &str,
    state: &State<AppState>,
) -> Result<Json<VersionSummary>, RegistryError> {
    let version = state.database.get_version(name, semver)?;
    Ok(Json(version.summary()?))
}

#[delete("/api/packages/<name>/versions/<semver>")]
pub async fn remove_version(
    name: &str,
    semver: &str,
    user: AuthenticatedUser,
    state: &State<AppState>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let role = authorize_package(state, &user, name).await?;
    if !role.can_publish() {
        return Err(RegistryError::BadAuth(format!(
            "Role '{role}' cannot remove versions of '{name}'"
        )));
    }

    let message = state.database.remove_version(name, semver)?;
    Ok(Json(MessageResponse::new(message)))
}

/// Counts a download and redirects to the stored tarball
#[get("/api/packages/<name>/versions/<semver>/tarball")]
pub async fn download_tarball(
    name: &str,
    semver: &str,
    state: &State<AppState>,
) -> Result<Redirect, RegistryError> {
    let version = state.database.get_version(name, semver)?;
    let tarball_url = version.tarball_url().ok_or_else(|| {
        RegistryError::NotFound(format!("No tarball recorded for {name}@{semver}"))
    })?;

    let summary = state.database.increment_downloads(name)?;
    debug!("{} downloads for '{}'", summary.downloads, summary.name);

    Ok(Redirect::to(tarball_url))
}
