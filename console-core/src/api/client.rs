//! ``src/api/client.rs``
//! ============================================================================
//! # Discovery Agent REST Client
//!
//! [`CollectorApi`] is the seam between the controller and the agent; the
//! controller only ever holds an `Arc<dyn CollectorApi>`. [`HttpCollectorClient`]
//! is the reqwest implementation against the agent's `/api/v1` endpoints.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    AppError,
    config::ApiConfig,
    model::{
        agent::{AgentMode, AgentStatus},
        lifecycle::{Credentials, StatusReport},
        vm::VmRecord,
    },
};

#[async_trait]
pub trait CollectorApi: Send + Sync {
    async fn collector_status(&self) -> Result<StatusReport, AppError>;

    async fn start_collector(&self, credentials: &Credentials) -> Result<StatusReport, AppError>;

    /// `None` when the agent answers with an empty body.
    async fn stop_collector(&self) -> Result<Option<StatusReport>, AppError>;

    async fn inventory(&self) -> Result<Vec<VmRecord>, AppError>;

    async fn agent_status(&self) -> Result<AgentStatus, AppError>;

    async fn set_agent_mode(&self, mode: AgentMode) -> Result<AgentStatus, AppError>;
}

#[derive(Debug, Serialize)]
struct AgentModeRequest {
    mode: AgentMode,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Inventory arrives as a bare array or wrapped under `vms`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InventoryPayload {
    List(Vec<VmRecord>),
    Wrapped { vms: Vec<VmRecord> },
}

impl From<InventoryPayload> for Vec<VmRecord> {
    fn from(payload: InventoryPayload) -> Self {
        match payload {
            InventoryPayload::List(vms) | InventoryPayload::Wrapped { vms } => vms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpCollectorClient {
    base_url: Url,
    http_client: Client,
}

impl HttpCollectorClient {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            base_url: normalize_base(&config.base_url)?,
            http_client,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::InvalidConfig(format!("bad endpoint {path}: {e}")))
    }

    /// Send a request and return the raw body of a 2xx response.
    async fn send<T: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<(Url, Vec<u8>), AppError> {
        let url = self.endpoint(path)?;
        debug!(
            marker = "API_REQUEST",
            operation_type = "http",
            method = %method,
            url = %url,
            "Agent request"
        );

        let mut request = self.http_client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();

        if !status.is_success() {
            let message = error_message(status, &bytes);
            warn!(
                marker = "API_REQUEST",
                operation_type = "http",
                status = status.as_u16(),
                url = %url,
                error = %message,
                "Agent returned an error"
            );
            return Err(AppError::api(status.as_u16(), message));
        }

        Ok((url, bytes))
    }

    async fn request<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<R, AppError> {
        let (url, bytes) = self.send(method, path, body).await?;
        decode_body(&url, &bytes)
    }
}

fn normalize_base(base: &str) -> Result<Url, AppError> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| AppError::InvalidConfig(format!("api.base_url: {e}")))
}

fn decode_body<R: DeserializeOwned>(url: &Url, bytes: &[u8]) -> Result<R, AppError> {
    serde_json::from_slice(bytes).map_err(|e| AppError::decode(url.path(), e.to_string()))
}

/// Prefer the agent's `{"error": ...}` message, then the raw body, then the reason phrase.
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes) {
        return body.error;
    }
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
}

#[async_trait]
impl CollectorApi for HttpCollectorClient {
    #[instrument(level = "debug", skip(self))]
    async fn collector_status(&self) -> Result<StatusReport, AppError> {
        self.request::<(), _>(Method::GET, "collector", None).await
    }

    #[instrument(level = "info", skip(self, credentials), fields(url = %credentials.url))]
    async fn start_collector(&self, credentials: &Credentials) -> Result<StatusReport, AppError> {
        self.request(Method::POST, "collector", Some(credentials))
            .await
    }

    #[instrument(level = "info", skip(self))]
    async fn stop_collector(&self) -> Result<Option<StatusReport>, AppError> {
        let (url, bytes) = self.send::<()>(Method::DELETE, "collector", None).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        decode_body(&url, &bytes).map(Some)
    }

    #[instrument(level = "info", skip(self))]
    async fn inventory(&self) -> Result<Vec<VmRecord>, AppError> {
        let payload: InventoryPayload = self.request::<(), _>(Method::GET, "inventory", None).await?;
        Ok(payload.into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn agent_status(&self) -> Result<AgentStatus, AppError> {
        self.request::<(), _>(Method::GET, "agent", None).await
    }

    #[instrument(level = "info", skip(self))]
    async fn set_agent_mode(&self, mode: AgentMode) -> Result<AgentStatus, AppError> {
        self.request(Method::POST, "agent/mode", Some(&AgentModeRequest { mode }))
            .await
    }
}
