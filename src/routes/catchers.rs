use crate::error::RegistryError;
use crate::models::GuardFailure;
use rocket::{Request, catch};

fn guard_failure(request: &Request<'_>) -> Option<RegistryError> {
    request.local_cache(GuardFailure::default).0.clone()
}

#[catch(401)]
pub fn unauthorized(request: &Request<'_>) -> RegistryError {
    guard_failure(request)
        .unwrap_or_else(|| RegistryError::BadAuth("Authentication required".to_string()))
}

#[catch(404)]
pub fn not_found(request: &Request<'_>) -> RegistryError {
    RegistryError::NotFound(format!("No route for {} {}", request.method(), request.uri()))
}

#[catch(422)]
pub fn unprocessable(_: &Request<'_>) -> RegistryError {
    RegistryError::BadRequest("Request body could not be parsed".to_string())
}

#[catch(500)]
pub fn internal_error(request: &Request<'_>) -> RegistryError {
    guard_failure(request)
        .unwrap_or_else(|| RegistryError::ServerError("Internal server error".to_string()))
}
