//! SHOWDESK gateway client
//!
//! HTTP client for the four backend operations the app consumes: content
//! analysis, chat, suggestion generation, and screen-check analysis.
//! The `Gateway` trait is the seam the controller and capture pipeline
//! depend on; `HttpGateway` is the real reqwest-backed implementation.

use crate::error::GatewayError;
use crate::session::Subject;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Content analysis can take a while on the backend (transcript fetch plus
/// model calls), so the request timeout is generous but still bounded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connect timeout for gateway calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ANALYZE_PATH: &str = "api/analyze-content";
const CHAT_PATH: &str = "api/chat";
const SUGGESTIONS_PATH: &str = "api/generate-suggestions";
const CAPTURE_PATH: &str = "api/capture-analyze";

/// Result of a successful content analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct Analysis {
    pub session_id: String,
    pub subject: Subject,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
}

/// Result of a screen-check analysis.
///
/// Everything besides the `issue_detected` flag is backend-defined and
/// carried through opaquely for the notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureOutcome {
    pub issue_detected: bool,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    session_id: &'a str,
    message: &'a str,
    /// Required by the wire contract; empty when no capture is attached
    screenshot: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct SuggestionsRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SuggestionsResponse {
    suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CaptureRequest<'a> {
    screenshot: &'a str,
}

/// The backend operations consumed by this client.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Analyze a video URL and open a learning session for it.
    async fn analyze(&self, url: &str) -> Result<Analysis, GatewayError>;

    /// Ask a question within an existing session.
    async fn chat(
        &self,
        session_id: &str,
        message: &str,
        screenshot: &str,
    ) -> Result<String, GatewayError>;

    /// Generate fresh suggested questions for an existing session.
    async fn suggestions(&self, session_id: &str) -> Result<Vec<String>, GatewayError>;

    /// Submit a base64 screen capture for issue analysis.
    async fn capture_analyze(&self, screenshot: &str) -> Result<CaptureOutcome, GatewayError>;
}

/// Reqwest-backed gateway client.
pub struct HttpGateway {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway client for the given base URL.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid gateway URL: {}", base_url))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for HttpGateway")?;

        Ok(Self { base_url, client })
    }

    /// POST a JSON body to a gateway endpoint and decode the reply.
    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidResponse(format!("Bad endpoint {}: {}", path, e)))?;

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                detail: extract_detail(&text, status.as_u16()),
            });
        }

        decode_envelope(&text)
    }
}

/// Decode a 2xx gateway reply, honoring the `success` envelope field.
///
/// A body carrying `success: false` is an operation failure even though the
/// transport succeeded. Replies without the field (the screen-check
/// endpoint) pass straight through to deserialization.
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("Not valid JSON: {}", e)))?;

    if value.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        let detail = value
            .get("detail")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Operation failed")
            .to_string();
        return Err(GatewayError::Rejected { detail });
    }

    serde_json::from_value(value)
        .map_err(|e| GatewayError::InvalidResponse(format!("Unexpected response shape: {}", e)))
}

/// Pull a human-readable detail string out of an error body.
///
/// FastAPI error replies look like `{"detail": "..."}`; anything else falls
/// back to the raw body or the status code.
fn extract_detail(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(serde_json::Value::as_str) {
            return detail.to_string();
        }
    }
    if body.trim().is_empty() {
        format!("Server returned status {}", status)
    } else {
        format!("Server returned status {}: {}", status, body.trim())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self))]
    async fn analyze(&self, url: &str) -> Result<Analysis, GatewayError> {
        info!("Requesting content analysis");
        let analysis: Analysis = self.post(ANALYZE_PATH, &AnalyzeRequest { url }).await?;
        info!(
            session_id = %analysis.session_id,
            topic = %analysis.subject.topic,
            "Content analyzed"
        );
        Ok(analysis)
    }

    #[instrument(skip(self, message, screenshot), fields(message_len = message.len()))]
    async fn chat(
        &self,
        session_id: &str,
        message: &str,
        screenshot: &str,
    ) -> Result<String, GatewayError> {
        let reply: ChatResponse = self
            .post(
                CHAT_PATH,
                &ChatRequest {
                    session_id,
                    message,
                    screenshot,
                },
            )
            .await?;
        Ok(reply.response)
    }

    #[instrument(skip(self))]
    async fn suggestions(&self, session_id: &str) -> Result<Vec<String>, GatewayError> {
        let reply: SuggestionsResponse = self
            .post(SUGGESTIONS_PATH, &SuggestionsRequest { session_id })
            .await?;
        Ok(reply.suggestions)
    }

    #[instrument(skip_all)]
    async fn capture_analyze(&self, screenshot: &str) -> Result<CaptureOutcome, GatewayError> {
        self.post(CAPTURE_PATH, &CaptureRequest { screenshot })
            .await
    }
}
