//! reqwest-backed [`VendorTransport`]

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::llm::auth::{AdcTokenSource, StaticToken, TokenSource};
use crate::llm::core::{
    error::LlmError,
    transport::{VendorTransport, WireRequest, WireResponse},
    types::Vendor,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GCP_LOCATION: &str = "us-central1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Where and how to reach one vendor
#[derive(Clone)]
pub struct Endpoint {
    /// URL with a `{model}` placeholder
    url_template: String,
    token_source: Arc<dyn TokenSource>,
    headers: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(url_template: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            url_template: url_template.into(),
            token_source,
            headers: Vec::new(),
        }
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// OpenAI chat completions
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::openai_compatible(OPENAI_BASE_URL, api_key)
    }

    /// Any server speaking the chat completions API under `base_url`
    pub fn openai_compatible(base_url: &str, api_key: impl Into<String>) -> Self {
        Self::new(
            format!("{}/chat/completions", base_url.trim_end_matches('/')),
            Arc::new(StaticToken::new(api_key)),
        )
    }

    /// Claude on Vertex AI
    pub fn vertex_claude(
        project_id: &str,
        location: &str,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self::new(
            format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{location}/publishers/anthropic/models/{{model}}:rawPredict"
            ),
            token_source,
        )
    }

    /// Gemini on Vertex AI
    pub fn vertex_gemini(
        project_id: &str,
        location: &str,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self::new(
            format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{location}/publishers/google/models/{{model}}:generateContent"
            ),
            token_source,
        )
    }

    /// The request URL for a model
    pub fn url_for(&self, model: &str) -> String {
        self.url_template.replace("{model}", model)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("url_template", &self.url_template)
            .finish_non_exhaustive()
    }
}

/// Sends encoded requests over HTTPS, one endpoint per vendor
///
/// Requests are not retried. Retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
    endpoints: HashMap<Vendor, Endpoint>,
}

impl HttpTransport {
    /// Create a transport with no endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, LlmError> {
        Self::with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport whose requests give up after `timeout`
    ///
    /// The limit covers the whole exchange, so a vendor that stalls after
    /// connecting fails the request instead of hanging the run. The default
    /// is 120 seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_request_timeout(timeout: Duration) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            endpoints: HashMap::new(),
        })
    }

    /// Register the endpoint for a vendor, replacing any previous one
    pub fn with_endpoint(mut self, vendor: Vendor, endpoint: Endpoint) -> Self {
        self.endpoints.insert(vendor, endpoint);
        self
    }

    /// Build a transport from environment variables
    ///
    /// `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) enables OpenAI.
    /// `GCP_PROJECT_ID` (and optionally `GCP_LOCATION`) enables Claude and
    /// Gemini on Vertex AI using Application Default Credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if ADC is requested but no credentials are found.
    pub async fn from_env() -> Result<Self, LlmError> {
        let mut transport = Self::new()?;

        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_BASE_URL.to_string());
            transport = transport.with_endpoint(
                Vendor::OpenAi,
                Endpoint::openai_compatible(&base_url, api_key),
            );
        }

        if let Ok(project_id) = env::var("GCP_PROJECT_ID") {
            let location =
                env::var("GCP_LOCATION").unwrap_or_else(|_| DEFAULT_GCP_LOCATION.to_string());
            let adc: Arc<dyn TokenSource> = Arc::new(AdcTokenSource::new().await?);
            transport = transport
                .with_endpoint(
                    Vendor::Claude,
                    Endpoint::vertex_claude(&project_id, &location, adc.clone()),
                )
                .with_endpoint(
                    Vendor::Gemini,
                    Endpoint::vertex_gemini(&project_id, &location, adc),
                );
        }

        if transport.endpoints.is_empty() {
            warn!("No vendor endpoints configured from environment");
        }

        Ok(transport)
    }

    /// Whether a vendor has an endpoint
    pub fn supports(&self, vendor: Vendor) -> bool {
        self.endpoints.contains_key(&vendor)
    }
}

#[async_trait]
impl VendorTransport for HttpTransport {
    #[instrument(skip(self, request), fields(vendor = ?request.vendor, model = %request.model))]
    async fn send(&self, request: WireRequest) -> Result<WireResponse, LlmError> {
        let endpoint = self.endpoints.get(&request.vendor).ok_or_else(|| {
            LlmError::InvalidRequest(format!("no endpoint configured for {:?}", request.vendor))
        })?;

        let token = endpoint.token_source.token().await?;
        let url = endpoint.url_for(&request.model);

        let mut builder = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json");
        for (name, value) in &endpoint.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.json(&request.body).send().await?;

        let status = response.status();
        debug!(status = status.as_u16(), "Vendor responded");

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body, retry_after));
        }

        let body: serde_json::Value = response.json().await?;
        Ok(WireResponse::new(body))
    }
}

fn status_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthenticationError(format!(
            "vendor rejected credentials (status {}): {}",
            status.as_u16(),
            body
        )),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded { retry_after },
        _ => LlmError::HttpError {
            status: status.as_u16(),
            body,
        },
    }
}
