//! Google Generative Language API client.
//!
//! Calls `POST {base}/models/{model}:generateContent` and extracts the
//! first candidate's text. Errors are classified into transient and
//! permanent classes so the synthesis orchestrator can walk its model
//! fallback chain on transient failures only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::models::SynthesisConfig;
use crate::domain::ports::{GenerationError, TextGenerator};

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    config: SynthesisConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client. The key comes from the config, falling back
    /// to the `GEMINI_API_KEY` environment variable.
    pub fn new(config: SynthesisConfig) -> Result<Self, GenerationError> {
        let api_key = resolve_api_key(&config).ok_or_else(|| {
            GenerationError::AuthenticationFailed(
                "generation API key not set; set GEMINI_API_KEY or synthesis.api_key".to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn classify_status(status: reqwest::StatusCode, body: String) -> GenerationError {
        match status.as_u16() {
            400 => GenerationError::InvalidRequest(body),
            401 | 403 => GenerationError::AuthenticationFailed(body),
            429 => GenerationError::RateLimitExceeded,
            503 | 529 => GenerationError::Overloaded,
            500..=599 => GenerationError::ServerError(body),
            _ => GenerationError::InvalidRequest(format!("HTTP {status}: {body}")),
        }
    }
}

/// Whether a generation credential is resolvable at all. Used by the
/// orchestrator to fail fast with a user-visible notice before any
/// network call.
pub fn resolve_api_key(config: &SynthesisConfig) -> Option<String> {
    config
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .filter(|k| !k.is_empty())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.config.api_base, model);
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(Self::classify_status(status, body));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| GenerationError::MalformedResponse("no candidates in response".to_string()))
    }
}

// -- Gemini API request/response types --

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}
