use crate::error::RegistryError;
use crate::state::AppState;
use log::debug;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

/// Records a guard failure so the error catcher can render it as JSON
fn fail<T>(
    request: &Request<'_>,
    status: Status,
    error: RegistryError,
) -> Outcome<T, RegistryError> {
    request.local_cache(|| GuardFailure(Some(error.clone())));
    Outcome::Error((status, error))
}

/// Last guard error seen while handling a request
#[derive(Debug, Clone, Default)]
pub struct GuardFailure(pub Option<RegistryError>);

// Raw provider token from the Authorization header
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = RegistryError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.headers().get_one("Authorization") {
            Some(value) => match value.strip_prefix("Bearer ") {
                Some(token) if !token.trim().is_empty() => {
                    Outcome::Success(BearerToken(token.trim().to_string()))
                }
                _ => fail(
                    request,
                    Status::Unauthorized,
                    RegistryError::BadAuth("Invalid authorization format".to_string()),
                ),
            },
            None => fail(
                request,
                Status::Unauthorized,
                RegistryError::BadAuth("Authorization header required".to_string()),
            ),
        }
    }
}

// Authentication guard: provider token resolved to a registry user
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub token: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = RegistryError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match request.guard::<BearerToken>().await {
            Outcome::Success(token) => token.0,
            Outcome::Error(failure) => return Outcome::Error(failure),
            Outcome::Forward(status) => return Outcome::Forward(status),
        };

        let Some(state) = request.rocket().state::<AppState>() else {
            return fail(
                request,
                Status::InternalServerError,
                RegistryError::ServerError("Application state unavailable".to_string()),
            );
        };

        let identity = match state.vcs.identify(&token).await {
            Ok(identity) => identity,
            Err(e) => return fail(request, e.status(), e),
        };

        match state.database.get_user_by_node_id(&identity.node_id) {
            Ok(user) => {
                debug!("Authenticated user {} ({})", user.username, user.id);
                Outcome::Success(AuthenticatedUser {
                    user_id: user.id,
                    username: user.username,
                    token,
                })
            }
            Err(e) if e.is_not_found() => fail(
                request,
                Status::Unauthorized,
                RegistryError::BadAuth(format!(
                    "User '{}' has not signed in to the registry",
                    identity.username
                )),
            ),
            Err(e) => fail(request, e.status(), e),
        }
    }
}
