//! Application error types.

use athletiq_core::identity::IdentityError;
use athletiq_core::models::coach::RequestError;
use athletiq_core::provider::ProviderError;
use athletiq_core::tenant::TenantError;
use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application-level errors with HTTP status mapping.
///
/// These can only be rendered before the response is committed; once the
/// event stream has started, failures truncate the body instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Provider(String),

    #[error("Server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Config(_) | AppError::Provider(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(detail) = &self {
            warn!(%status, "request failed: {detail}");
        } else if status.is_server_error() {
            warn!(%status, "request failed: {self}");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<RequestError> for AppError {
    fn from(e: RequestError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::MissingToken | IdentityError::InvalidToken(_) => {
                AppError::Unauthorized(e.to_string())
            }
            IdentityError::Unavailable(_) => AppError::Config(e.to_string()),
        }
    }
}

impl From<TenantError> for AppError {
    fn from(e: TenantError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::Provider(e.to_string())
    }
}

impl From<BytesRejection> for AppError {
    fn from(e: BytesRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(e.body_text())
        }
    }
}
