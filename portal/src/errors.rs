use crate::api::envelope::Envelope;
use crate::db::errors::DbError;
use crate::types::{Operation, Profile, Resource};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// No valid session for an action that needs one, or rejected credentials
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller's profile is not allowed to perform the operation
    #[error("Insufficient permissions to {action} {resource}")]
    InsufficientPermissions {
        action: Operation,
        resource: Resource,
        allowed: &'static [Profile],
    },

    /// Malformed body, missing required fields or out-of-range values
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Action name outside the closed set a resource understands
    #[error("Unrecognized action '{action}' for {resource}")]
    UnrecognizedAction { action: String, resource: Resource },

    #[error("Failed to {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Database(#[from] DbError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::UnrecognizedAction { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message placed in the error envelope. Never contains credentials or hashes.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { action, resource, allowed } => {
                let roles: Vec<&str> = allowed.iter().map(Profile::as_str).collect();
                format!("Insufficient permissions to {action} {resource} (requires {})", roles.join(" or "))
            }
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::UnrecognizedAction { action, resource } => {
                format!("Unrecognized action '{action}' for {resource}")
            }
            Error::Internal { operation } => format!("Failed to {operation}"),
            Error::Database(db_err) => match db_err {
                DbError::UniqueViolation { table, column, .. } => match (table.as_deref(), column.as_deref()) {
                    (Some("employees"), Some("email")) => "An employee with this email address already exists".to_string(),
                    (Some("users"), Some("email")) => "An account with this email address already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(e) => format!("Database error: {e}"),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Conflict or constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::UnrecognizedAction { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), Json(Envelope::error(self.user_message()))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_cover_every_kind() {
        let cases = [
            (Error::BadRequest { message: "x".into() }, StatusCode::BAD_REQUEST),
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED),
            (
                Error::InsufficientPermissions {
                    action: Operation::Create,
                    resource: Resource::Slideshow,
                    allowed: &[Profile::AdminGlobal, Profile::Diseno],
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::NotFound {
                    resource: "Employee".into(),
                    id: "3".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::UnrecognizedAction {
                    action: "explode".into(),
                    resource: Resource::Directory,
                },
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (
                Error::Database(DbError::UniqueViolation {
                    table: Some("employees".into()),
                    column: Some("email".into()),
                    message: "UNIQUE constraint failed: employees.email".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                Error::Database(DbError::Other(anyhow::anyhow!("disk I/O error"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error:?}");
        }
    }

    #[test]
    fn test_store_failure_message_carries_store_text() {
        let err = Error::Database(DbError::Other(anyhow::anyhow!("disk I/O error")));
        assert_eq!(err.user_message(), "Database error: disk I/O error");
    }

    #[test]
    fn test_forbidden_message_names_required_roles() {
        let err = Error::InsufficientPermissions {
            action: Operation::Delete,
            resource: Resource::Slideshow,
            allowed: &[Profile::AdminGlobal, Profile::Diseno],
        };
        assert_eq!(
            err.user_message(),
            "Insufficient permissions to Delete slideshow (requires admin_global or diseno)"
        );
    }
}
