use std::collections::HashMap;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Serialize;

use super::ApiError;
use crate::domain::instance::models::Instance;
use crate::domain::instance::models::InstanceId;
use crate::inbound::http::middleware::AuthenticatedAccount;
use crate::inbound::http::router::AppState;

/// `GET /instances`: the instances owned by the authenticated subject.
pub async fn list_instances(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<Vec<InstanceData>>, ApiError> {
    let instances = state.instances.list_owned(&account.subject).await?;

    Ok(Json(instances.iter().map(InstanceData::from).collect()))
}

/// `GET /instance/{id}/state`: lifecycle state of one owned instance.
pub async fn instance_state(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<Json<InstanceStateData>, ApiError> {
    let id = parse_instance_id(&id)?;
    let state = state.instances.state(&account.subject, &id).await?;

    Ok(Json(InstanceStateData { state }))
}

/// `GET /instance/{id}/start`: start one owned instance.
pub async fn start_instance(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_instance_id(&id)?;
    state.instances.start(&account.subject, &id).await?;

    Ok(StatusCode::OK)
}

/// `GET /instance/{id}/stop`: stop one owned instance.
pub async fn stop_instance(
    State(state): State<AppState>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_instance_id(&id)?;
    state.instances.stop(&account.subject, &id).await?;

    Ok(StatusCode::OK)
}

/// A malformed path segment reveals nothing about existing instances,
/// so it may be a 400 rather than the undifferentiated 401.
fn parse_instance_id(raw: &str) -> Result<InstanceId, ApiError> {
    InstanceId::from_string(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceData {
    pub id: String,
    pub name: String,
    pub labels: HashMap<String, String>,
    pub ip: Option<String>,
    pub state: String,
}

impl From<&Instance> for InstanceData {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id.to_string(),
            name: instance.name.clone(),
            labels: instance.labels.clone(),
            ip: instance.ip.clone(),
            state: instance.state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceStateData {
    pub state: String,
}
