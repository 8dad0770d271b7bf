//! Domain error taxonomy shared by services, the token layer and the session recorder.
//!
//! Handlers never forward these to clients verbatim; see `response::ApiError`.

use axum::http::StatusCode;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input, one message per offending field.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("file storage failed: {0}")]
    Storage(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl AppError {
    /// Status used when a handler reports this error to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_)
            | AppError::EmailTaken
            | AppError::InvalidCredentials
            | AppError::Signing(_)
            | AppError::Storage(_)
            | AppError::Persistence(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation(vec!["x".into()]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::StoreUnavailable("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::NotFound("user").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Persistence(anyhow::anyhow!("boom")).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = AppError::Validation(vec!["Name is required".into(), "Email is invalid".into()]);
        assert_eq!(
            err.to_string(),
            "validation failed: Name is required, Email is invalid"
        );
    }
}
