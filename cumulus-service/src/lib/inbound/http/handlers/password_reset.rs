use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::inbound::http::router::AppState;

/// `POST /password-reset/request`: open a reset request.
///
/// Responds 201 with an empty body whether or not the email belongs to
/// an account; only the rate limit (429) and upstream failures (500)
/// break the pattern.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<RequestResetBody>,
) -> Result<StatusCode, ApiError> {
    state.resets.request_reset(&body.email).await?;

    Ok(StatusCode::CREATED)
}

/// `POST /password-reset/confirm`: redeem a reset token and set the new
/// password.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ConfirmResetBody>,
) -> Result<StatusCode, ApiError> {
    state
        .resets
        .confirm_reset(&body.email, &body.token, &body.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestResetBody {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmResetBody {
    pub email: String,
    pub token: String,
    pub password: String,
}
