//! JSON envelope returned by every API route:
//! `{"meta": {"message", "code", "status"}, "data": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct Meta {
    pub message: String,
    pub code: u16,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub meta: Meta,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, code: StatusCode, data: T) -> Self {
        let status = if code.is_success() { "success" } else { "error" };
        Self {
            meta: Meta {
                message: message.into(),
                code: code.as_u16(),
                status,
            },
            data,
        }
    }
}

/// 200 response with the success envelope.
pub fn success<T: Serialize>(message: &str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::new(message, StatusCode::OK, data))
}

/// Error envelope; `data` carries whatever the route wants to tell the client
/// (validation messages, `is_uploaded: false`, ...), never internal detail.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
    pub data: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// Translate a domain error under the route's failure message. Validation
    /// errors keep their field messages; everything else is reduced to the status.
    pub fn from_app(err: AppError, message: &'static str) -> Self {
        let status = err.status_code();
        match err {
            AppError::Validation(errors) => {
                warn!(?errors, "{}", message);
                Self::new(status, message).with_data(json!({ "errors": errors }))
            }
            AppError::Persistence(_) | AppError::StoreUnavailable(_) | AppError::Signing(_) => {
                error!(error = %err, "{}", message);
                Self::new(status, message)
            }
            other => {
                warn!(error = %other, "{}", message);
                Self::new(status, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::new(self.message, self.status, self.data)),
        )
            .into_response()
    }
}
