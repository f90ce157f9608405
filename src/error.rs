use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::error;
use rocket::http::{ContentType, Status};
use rocket::response::{Responder, Response};
use rocket::Request;
use std::fmt;
use std::io::Cursor;

/// Failure categories surfaced by every registry operation.
///
/// Each variant carries a short human-readable detail; the machine-readable
/// code is available through [`RegistryError::category`]. Raw storage errors
/// never reach callers, they are logged and collapsed into `ServerError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    NotFound(String),
    Conflict(String),
    BadRequest(String),
    BadAuth(String),
    ServerError(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn category(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "not_found",
            RegistryError::Conflict(_) => "conflict",
            RegistryError::BadRequest(_) => "bad_request",
            RegistryError::BadAuth(_) => "bad_auth",
            RegistryError::ServerError(_) => "server_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RegistryError::NotFound(msg)
            | RegistryError::Conflict(msg)
            | RegistryError::BadRequest(msg)
            | RegistryError::BadAuth(msg)
            | RegistryError::ServerError(msg) => msg,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            RegistryError::NotFound(_) => Status::NotFound,
            RegistryError::Conflict(_) => Status::Conflict,
            RegistryError::BadRequest(_) => Status::BadRequest,
            RegistryError::BadAuth(_) => Status::Unauthorized,
            RegistryError::ServerError(_) => Status::InternalServerError,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::Conflict(_))
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category(), self.message())
    }
}

impl std::error::Error for RegistryError {}

impl From<DieselError> for RegistryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => RegistryError::NotFound("Not Found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RegistryError::Conflict(format!("Duplicate entry: {}", info.message()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                RegistryError::Conflict(format!("Constraint violated: {}", info.message()))
            }
            other => {
                error!("Database error: {other}");
                RegistryError::ServerError("Database operation failed".to_string())
            }
        }
    }
}

impl From<diesel::r2d2::Error> for RegistryError {
    fn from(err: diesel::r2d2::Error) -> Self {
        error!("Database connection error: {err}");
        RegistryError::ServerError("Database connection unavailable".to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        error!("JSON document error: {err}");
        RegistryError::ServerError("Stored document is malformed".to_string())
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        error!("Provider request failed: {err}");
        RegistryError::ServerError("Version control provider unavailable".to_string())
    }
}

impl<'r> Responder<'r, 'static> for RegistryError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let body = serde_json::json!({
            "ok": false,
            "category": self.category(),
            "message": self.message(),
        })
        .to_string();

        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
