//! Remote analysis service: the two-phase analyze API and its REST client.
//!
//! Analysis is a long-running operation. [`AnalysisService::begin_analyze`]
//! submits the document and returns an [`OperationHandle`];
//! [`AnalysisService::poll_operation`] makes one status round trip for that
//! handle. The wait loop that repeats polls until the operation resolves
//! lives in [`crate::pipeline::wait`], where the caller's cancellation token
//! is observed.
//!
//! ## REST shape
//!
//! ```text
//! POST {endpoint}/formrecognizer/documentModels/{model}:analyze?api-version=…
//!      body: raw document bytes           → 202 + Operation-Location
//! GET  {Operation-Location}               → { status, analyzeResult?, error? }
//! ```

use crate::config::{AuthMode, DocIntelConfig};
use crate::credential::{TokenCredential, COGNITIVE_SERVICES_SCOPE};
use crate::error::DecodeError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

const OPERATION_LOCATION: &str = "operation-location";
const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

// ── Wire types ───────────────────────────────────────────────────────────

/// Result of a completed analyze operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub pages: Vec<DocumentPage>,
}

/// One analysed page, in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub lines: Vec<DocumentLine>,
}

/// One recognised line of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentLine {
    pub content: String,
}

impl DocumentPage {
    /// Convenience constructor for a page made only of line text.
    pub fn from_lines<I, S>(page_number: u32, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page_number,
            lines: lines
                .into_iter()
                .map(|l| DocumentLine { content: l.into() })
                .collect(),
        }
    }
}

/// `{ "code", "message" }` body the service uses for every failure.
#[derive(Debug, Clone, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceErrorBody>,
}

// ── Two-phase operation ──────────────────────────────────────────────────

/// Handle to a submitted analyze operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// Status URL returned in `Operation-Location`.
    pub location: String,
    /// Server-suggested delay before the first poll.
    pub retry_after: Option<Duration>,
}

/// State of an operation after one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// Queued or running; poll again after `retry_after` if given.
    InProgress { retry_after: Option<Duration> },
    /// Finished; the result is final.
    Succeeded(AnalyzeResult),
}

/// The outbound capability the decoder depends on.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Submit `document` to `model_id` and return without waiting.
    async fn begin_analyze(
        &self,
        model_id: &str,
        document: Bytes,
    ) -> Result<OperationHandle, DecodeError>;

    /// Fetch the current state of a submitted operation.
    ///
    /// A `failed` or `canceled` remote state is returned as
    /// [`DecodeError::AnalysisFailed`].
    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, DecodeError>;
}

// ── REST client ──────────────────────────────────────────────────────────

/// How requests to the service are authorised.
#[derive(Clone)]
pub enum ServiceAuth {
    ApiKey(String),
    Credential(Arc<dyn TokenCredential>),
}

impl fmt::Debug for ServiceAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAuth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            ServiceAuth::Credential(_) => f.write_str("Credential(<dyn TokenCredential>)"),
        }
    }
}

/// reqwest-backed [`AnalysisService`] for an Azure AI Document Intelligence
/// resource.
#[derive(Debug, Clone)]
pub struct DocIntelClient {
    http: reqwest::Client,
    endpoint: Url,
    api_version: String,
    auth: ServiceAuth,
}

impl DocIntelClient {
    /// Create a client. Makes no network call.
    pub fn new(
        config: &DocIntelConfig,
        http: reqwest::Client,
        auth: ServiceAuth,
    ) -> Result<Self, DecodeError> {
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|e| {
            DecodeError::InvalidConfig(format!(
                "endpoint '{}' is not a valid URL: {}",
                config.endpoint, e
            ))
        })?;
        Ok(Self {
            http,
            endpoint,
            api_version: config.api_version.clone(),
            auth,
        })
    }

    /// Build the shared HTTP client for a configuration.
    pub fn http_client(config: &DocIntelConfig) -> Result<reqwest::Client, DecodeError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(DecodeError::Transport)
    }

    /// The mode this client authenticates with.
    pub fn auth_mode(&self) -> AuthMode {
        match self.auth {
            ServiceAuth::ApiKey(_) => AuthMode::ApiKey,
            ServiceAuth::Credential(_) => AuthMode::AzureIdentity,
        }
    }

    /// `…/formrecognizer/documentModels/{model}:analyze?api-version=…`
    pub fn analyze_url(&self, model_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/formrecognizer/documentModels/{model_id}:analyze"));
        url.query_pairs_mut()
            .clear()
            .append_pair("api-version", &self.api_version);
        url
    }

    async fn authorise(&self, request: RequestBuilder) -> Result<RequestBuilder, DecodeError> {
        Ok(match &self.auth {
            ServiceAuth::ApiKey(key) => request.header(API_KEY_HEADER, key),
            ServiceAuth::Credential(credential) => {
                let token = credential.get_token(&[COGNITIVE_SERVICES_SCOPE]).await?;
                request.header(AUTHORIZATION, format!("Bearer {}", token.token))
            }
        })
    }
}

#[async_trait]
impl AnalysisService for DocIntelClient {
    async fn begin_analyze(
        &self,
        model_id: &str,
        document: Bytes,
    ) -> Result<OperationHandle, DecodeError> {
        let url = self.analyze_url(model_id);
        trace!("Submitting {} bytes to {}", document.len(), model_id);

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(document);
        let response = self.authorise(request).await?.send().await?;
        let response = ensure_success(response).await?;

        let handle = operation_handle(response.headers())?;
        trace!("Analyze operation accepted at {}", handle.location);
        Ok(handle)
    }

    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, DecodeError> {
        let request = self.http.get(&handle.location);
        let response = self.authorise(request).await?.send().await?;
        let response = ensure_success(response).await?;

        let retry_after = retry_after(response.headers());
        let body = response.text().await?;
        parse_operation(&body, retry_after)
    }
}

// ── Response helpers ─────────────────────────────────────────────────────

/// Turn a non-2xx response into [`DecodeError::Service`].
async fn ensure_success(response: Response) -> Result<Response, DecodeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(service_error(status, &body))
}

fn service_error(status: StatusCode, body: &str) -> DecodeError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| ServiceErrorBody {
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: body.trim().to_string(),
        });
    DecodeError::Service {
        status: status.as_u16(),
        code: detail.code,
        message: detail.message,
    }
}

fn operation_handle(headers: &HeaderMap) -> Result<OperationHandle, DecodeError> {
    let location = headers
        .get(OPERATION_LOCATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DecodeError::MalformedResponse("missing Operation-Location header".into()))?;
    Ok(OperationHandle {
        location: location.to_string(),
        retry_after: retry_after(headers),
    })
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn parse_operation(
    body: &str,
    retry_after: Option<Duration>,
) -> Result<OperationStatus, DecodeError> {
    let op: OperationResponse = serde_json::from_str(body)
        .map_err(|e| DecodeError::MalformedResponse(format!("operation status: {e}")))?;

    match op.status.to_ascii_lowercase().as_str() {
        "notstarted" | "running" => Ok(OperationStatus::InProgress { retry_after }),
        "succeeded" => op
            .analyze_result
            .map(OperationStatus::Succeeded)
            .ok_or_else(|| {
                DecodeError::MalformedResponse("succeeded without analyzeResult".into())
            }),
        "failed" | "canceled" => {
            let error = op.error.unwrap_or_default();
            Err(DecodeError::AnalysisFailed {
                code: if error.code.is_empty() { op.status } else { error.code },
                message: error.message,
            })
        }
        other => Err(DecodeError::MalformedResponse(format!(
            "unknown operation status '{other}'"
        ))),
    }
}
