use std::collections::HashMap;

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::Duration;
use chrono::Utc;
use hmac::Hmac;
use hmac::Mac;
use reqwest::Client;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::account::models::ApiAccess;
use crate::domain::instance::errors::ProviderError;
use crate::domain::instance::models::Instance;
use crate::domain::instance::models::InstanceId;
use crate::domain::instance::ports::CloudProvider;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed request stays acceptable to the provider.
const SIGNATURE_VALIDITY_MINUTES: i64 = 10;

/// Cloud-provider adapter against the Exoscale v2 REST API.
///
/// Stateless apart from the HTTP client: per-tenant credentials come in
/// with every call, and every call signs its own request.
pub struct ExoscaleProvider {
    client: Client,
}

impl ExoscaleProvider {
    /// # Errors
    /// * `ProviderError` - the HTTP client could not be constructed
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("cumulus-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError(format!("create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        access: &ApiAccess,
        method: Method,
        path: &str,
        body: Option<&'static str>,
    ) -> Result<reqwest::Response, ProviderError> {
        let body = body.unwrap_or("");
        let authorization = sign_request(access, method.as_str(), path, body)?;
        let url = format!("https://api-{}.exoscale.com{}", access.zone, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", authorization);
        if !body.is_empty() {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        request
            .send()
            .await
            .map_err(|e| ProviderError(format!("request {url}: {e}")))
    }
}

/// Build the `EXO2-HMAC-SHA256` authorization header for one request.
///
/// The signed message covers method, path, body, and an expiry a few
/// minutes out; query parameters and additional headers stay unsigned
/// (this adapter uses neither).
fn sign_request(
    access: &ApiAccess,
    method: &str,
    path: &str,
    body: &str,
) -> Result<String, ProviderError> {
    let expires = (Utc::now() + Duration::minutes(SIGNATURE_VALIDITY_MINUTES)).timestamp();
    let message = format!("{method} {path}\n{body}\n\n\n{expires}");

    let mut mac = HmacSha256::new_from_slice(access.secret.as_bytes())
        .map_err(|e| ProviderError(format!("create request signature: {e}")))?;
    mac.update(message.as_bytes());
    let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

    Ok(format!(
        "EXO2-HMAC-SHA256 credential={},expires={},signature={}",
        access.key, expires, signature
    ))
}

#[derive(Debug, Deserialize)]
struct ListInstancesResponse {
    #[serde(default)]
    instances: Vec<InstancePayload>,
}

#[derive(Debug, Deserialize)]
struct InstancePayload {
    id: Uuid,
    #[serde(default)]
    name: String,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(rename = "public-ip")]
    public_ip: Option<String>,
    #[serde(default)]
    state: String,
}

impl From<InstancePayload> for Instance {
    fn from(payload: InstancePayload) -> Self {
        Instance {
            id: InstanceId(payload.id),
            name: payload.name,
            labels: payload.labels,
            ip: payload.public_ip,
            state: payload.state,
        }
    }
}

fn expect_success(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError(format!("{context}: status {status}")));
    }
    Ok(response)
}

#[async_trait]
impl CloudProvider for ExoscaleProvider {
    async fn list_instances(&self, access: &ApiAccess) -> Result<Vec<Instance>, ProviderError> {
        let response = self
            .send(access, Method::GET, "/v2/instance", None)
            .await?;
        let response = expect_success(response, "list instances")?;

        let payload: ListInstancesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError(format!("decode instance list: {e}")))?;

        Ok(payload.instances.into_iter().map(Instance::from).collect())
    }

    async fn get_instance(
        &self,
        access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<Option<Instance>, ProviderError> {
        let response = self
            .send(access, Method::GET, &format!("/v2/instance/{id}"), None)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = expect_success(response, &format!("get instance {id}"))?;

        let payload: InstancePayload = response
            .json()
            .await
            .map_err(|e| ProviderError(format!("decode instance {id}: {e}")))?;

        Ok(Some(Instance::from(payload)))
    }

    async fn start_instance(
        &self,
        access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<(), ProviderError> {
        let response = self
            .send(
                access,
                Method::PUT,
                &format!("/v2/instance/{id}:start"),
                Some("{}"),
            )
            .await?;
        expect_success(response, &format!("start instance {id}"))?;
        Ok(())
    }

    async fn stop_instance(
        &self,
        access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<(), ProviderError> {
        let response = self
            .send(
                access,
                Method::PUT,
                &format!("/v2/instance/{id}:stop"),
                Some("{}"),
            )
            .await?;
        expect_success(response, &format!("stop instance {id}"))?;
        Ok(())
    }
}
