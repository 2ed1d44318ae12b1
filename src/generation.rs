//! Client for the remote UI generation service.
//!
//! The service takes a JSON body `{"text": <prompt>}` on a single POST
//! endpoint and answers with a raw HTML document (not JSON). It also exposes
//! `GET /health` returning `{"status":"ok"}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;

/// Endpoint used when nothing is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/preview";

/// Maximum response body size (10 MB).
const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// How much of an error body is kept for diagnostics.
const ERROR_BODY_PREVIEW_CHARS: usize = 500;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Failures talking to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// The configured endpoint is not a usable http(s) URL.
    InvalidEndpoint(String),
    /// Connection, timeout or body read failure.
    Request(String),
    /// Non-2xx answer. `body` holds the start of the response for debugging.
    Status { status: u16, body: String },
    /// 2xx answer with an empty or blank body.
    EmptyResponse,
    TooLarge { size: usize },
    /// Health probe answered but did not report `ok`.
    Unhealthy(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::InvalidEndpoint(msg) => write!(f, "Invalid endpoint: {msg}"),
            GenerateError::Request(msg) => write!(f, "{msg}"),
            GenerateError::Status { status, .. } => {
                write!(f, "Generation service returned HTTP {status}")
            }
            GenerateError::EmptyResponse => write!(f, "No HTML content returned."),
            GenerateError::TooLarge { size } => write!(
                f,
                "Response body exceeds maximum size ({size} bytes > {MAX_RESPONSE_BYTES} bytes)"
            ),
            GenerateError::Unhealthy(status) => {
                write!(f, "Generation service reported status \"{status}\"")
            }
        }
    }
}

impl std::error::Error for GenerateError {}

impl GenerateError {
    /// Extra detail for the panel's debug area, when there is any.
    pub fn debug_detail(&self) -> Option<String> {
        match self {
            GenerateError::Status { body, .. } if !body.is_empty() => Some(body.clone()),
            _ => None,
        }
    }
}

/// Validate that an endpoint is an absolute http:// or https:// URL.
fn parse_endpoint(endpoint: &str) -> Result<Url, GenerateError> {
    let parsed = Url::parse(endpoint)
        .map_err(|e| GenerateError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(GenerateError::InvalidEndpoint(format!(
            "scheme \"{scheme}\" is not allowed; use http or https"
        ))),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// HTTP client bound to one generation endpoint.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl GenerationClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GenerateError> {
        let endpoint = parse_endpoint(endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| GenerateError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GenerateError> {
        Self::new(
            &config.endpoint_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `prompt` to the service and return the HTML it generated.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        tracing::info!(endpoint = %self.endpoint, prompt_chars = prompt.chars().count(), "requesting generation");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest { text: prompt })
            .send()
            .await
            .map_err(|e| GenerateError::Request(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| GenerateError::Request(format!("Failed to read response body: {e}")))?;

        if body_bytes.len() > MAX_RESPONSE_BYTES {
            return Err(GenerateError::TooLarge {
                size: body_bytes.len(),
            });
        }

        let body = String::from_utf8_lossy(&body_bytes).to_string();

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "generation failed");
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_PREVIEW_CHARS),
            });
        }

        if body.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        tracing::debug!(bytes = body.len(), "generation succeeded");
        Ok(body)
    }

    /// URL of the service's health probe, on the endpoint's origin.
    pub fn health_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path("/health");
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Check that the service is up.
    pub async fn health(&self) -> Result<(), GenerateError> {
        let url = self.health_url();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GenerateError::Request(format!("Health check failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Request(format!("Failed to parse health response: {e}")))?;

        if health.status != "ok" {
            return Err(GenerateError::Unhealthy(health.status));
        }
        tracing::debug!(%url, "generation service healthy");
        Ok(())
    }
}
