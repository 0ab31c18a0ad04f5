use axum::{Json, http::StatusCode, response::IntoResponse};
use validator::ValidationErrors;

use crate::{auth::error::AuthError, db::error::DatabaseError, library::LibraryError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error")]
    Database(DatabaseError),

    #[error("Auth error")]
    Auth(AuthError),

    #[error("Validation error")]
    Validation(ValidationErrors),

    #[error("Library error: {0}")]
    Library(LibraryError),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<DatabaseError> for Error {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<LibraryError> for Error {
    fn from(value: LibraryError) -> Self {
        Self::Library(value)
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Database(database_error) => match database_error {
                DatabaseError::DatabaseError(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "Database Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                DatabaseError::NotFound => StatusCode::NOT_FOUND.into_response(),
                DatabaseError::Conflict(message) => {
                    (StatusCode::CONFLICT, message).into_response()
                }
            },
            Error::Auth(auth_error) => match auth_error {
                AuthError::JwtError(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "JWT Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                AuthError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
                AuthError::InvalidAppKey => StatusCode::FORBIDDEN.into_response(),
                AuthError::PasswordError(error) => {
                    tracing::error!(err.msg = %error, err.details=?error, "Password Hash Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                AuthError::RegistrationClosed => StatusCode::FORBIDDEN.into_response(),
                AuthError::IncorrectCredential => StatusCode::UNAUTHORIZED.into_response(),
            },
            Error::Library(library_error) => {
                tracing::info!(err.msg = %library_error, "Rejected library operation");

                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": library_error.to_string() })),
                )
                    .into_response()
            }
            Error::Other(error) => {
                tracing::error!(err.msg = %error, err.details=?error, "Other Error");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Error::Validation(validation_error) => {
                tracing::info!(err.msg = %validation_error, err.details=?validation_error, "Validation Error");

                (StatusCode::BAD_REQUEST, validation_error.to_string()).into_response()
            }
        }
    }
}
