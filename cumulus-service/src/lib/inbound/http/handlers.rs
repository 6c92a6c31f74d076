use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::account::errors::AccountError;
use crate::domain::instance::errors::InstanceError;
use crate::domain::reset::errors::ResetError;

pub mod instances;
pub mod login;
pub mod password_reset;

/// HTTP error envelope.
///
/// Deliberately coarse: everything security-relevant is a bodyless 401
/// or 429, and upstream failures are a bodyless 500 with the detail
/// confined to server-side logs. Only plain input rejections carry a
/// terse message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    RateLimited,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorBody { error: message }),
            )
                .into_response(),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS.into_response(),
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => ApiError::Unauthorized,
            AccountError::WeakPassword => {
                ApiError::BadRequest("password does not meet the strength policy".to_string())
            }
            AccountError::InvalidName(_)
            | AccountError::InvalidEmail(_)
            | AccountError::InvalidRole(_) => ApiError::BadRequest(err.to_string()),
            AccountError::NotFound(_)
            | AccountError::NameAlreadyExists(_)
            | AccountError::EmailAlreadyExists(_)
            | AccountError::Password(_)
            | AccountError::Token(_)
            | AccountError::Database(_) => {
                tracing::error!(error = %err, "Account operation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::WeakPassword => {
                ApiError::BadRequest("password does not meet the strength policy".to_string())
            }
            // One message for every token-shaped rejection; the precise
            // reason lives in the server-side logs only.
            ResetError::UnknownAccount
            | ResetError::NoPendingRequest
            | ResetError::Expired
            | ResetError::TokenMismatch
            | ResetError::AlreadyConsumed => {
                ApiError::BadRequest("invalid or expired reset token".to_string())
            }
            ResetError::RateLimited => ApiError::RateLimited,
            ResetError::Hashing(_) | ResetError::Mail(_) | ResetError::Database(_) => {
                tracing::error!(error = %err, "Password reset operation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<InstanceError> for ApiError {
    fn from(err: InstanceError) -> Self {
        match err {
            InstanceError::Unauthorized => ApiError::Unauthorized,
            InstanceError::Provider(_) | InstanceError::Database(_) => {
                tracing::error!(error = %err, "Instance operation failed");
                ApiError::Internal
            }
        }
    }
}
