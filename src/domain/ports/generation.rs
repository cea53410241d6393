//! Text-generation port for merge synthesis.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a text-generation service call.
///
/// The transient/permanent split drives the model fallback chain: a
/// transient failure advances to the next model in the ordered list,
/// anything else is fatal to the synthesis attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Invalid request parameters or malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded, retry later
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Generation server encountered an internal error
    #[error("API server error: {0}")]
    ServerError(String),

    /// Generation server is overloaded
    #[error("API server overloaded")]
    Overloaded,

    /// Request timed out waiting for response
    #[error("Timeout waiting for response")]
    Timeout,

    /// Network error occurred during request
    #[error("Network error: {0}")]
    Network(String),

    /// Response arrived but could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    /// Returns true if the next model in the fallback chain should be
    /// tried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimitExceeded
                | GenerationError::ServerError(_)
                | GenerationError::Overloaded
                | GenerationError::Timeout
        )
    }
}

/// Trait for text-generation services.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &'static str;

    /// Generate text for `prompt` with the given model identifier.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_advance_the_fallback_chain() {
        assert!(GenerationError::RateLimitExceeded.is_transient());
        assert!(GenerationError::ServerError("boom".into()).is_transient());
        assert!(GenerationError::Overloaded.is_transient());
        assert!(GenerationError::Timeout.is_transient());
    }

    #[test]
    fn test_permanent_errors_abort_the_attempt() {
        assert!(!GenerationError::InvalidRequest("bad".into()).is_transient());
        assert!(!GenerationError::AuthenticationFailed("key".into()).is_transient());
        assert!(!GenerationError::MalformedResponse("?".into()).is_transient());
        assert!(!GenerationError::Network("refused".into()).is_transient());
    }
}
