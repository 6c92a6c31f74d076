use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use crate::inbound::http::router::AppState;

/// `POST /login`: verify credentials, answer with a session token.
///
/// Unknown usernames and wrong passwords produce the same bare 401.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<Json<LoginResponseBody>, ApiError> {
    let token = state.accounts.login(&body.username, &body.password).await?;

    Ok(Json(LoginResponseBody { token }))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseBody {
    pub token: String,
}
