use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::inbound::http::router::AppState;

/// Extension type carrying the authenticated subject through request
/// extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub subject: String,
}

/// Middleware validating the bearer token on protected routes.
///
/// Every failure (missing header, malformed scheme, bad signature,
/// foreign algorithm, expiry, missing subject) produces the same bare
/// 401; the reason is only visible in server-side logs.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let subject = state.authenticator.subject_from_header(header).map_err(|e| {
        tracing::warn!(error = %e, "Rejecting request with invalid bearer credentials");
        StatusCode::UNAUTHORIZED.into_response()
    })?;

    req.extensions_mut().insert(AuthenticatedAccount { subject });

    Ok(next.run(req).await)
}
