//! HTTP embedding provider adapter.
//!
//! Talks to the sentence-transformer sidecar over its `POST /embed`
//! endpoint: `{"text": ...}` in, `{"embedding": [f32, ...]}` out.
//! Compatible with any service exposing the same shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;

/// Embedding provider backed by an HTTP embedding service.
pub struct HttpEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::Provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let url = format!("{}/embed", self.config.base_url);
        let request_body = EmbedRequest { text };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| DomainError::Provider(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::Provider(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Provider(format!("failed to parse embedding response: {e}")))?;

        if result.embedding.is_empty() {
            return Err(DomainError::Provider("empty embedding response".to_string()));
        }

        Ok(result.embedding)
    }
}

// -- Embedding service request/response types --

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: String) -> HttpEmbeddingProvider {
        HttpEmbeddingProvider::new(EmbeddingConfig {
            base_url,
            timeout_secs: 5,
            dimension: 3,
        })
        .expect("provider")
    }

    #[tokio::test]
    async fn test_embed_parses_vector() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embed")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "text": "Login crashes\nsteps"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": [0.1, 0.2, 0.3]}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        let vector = provider.embed("Login crashes\nsteps").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_error_status_is_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embed")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let provider = provider(server.url());
        let err = provider.embed("text").await.unwrap_err();
        assert!(matches!(err, DomainError::Provider(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_vector() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embed")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding": []}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        assert!(provider.embed("text").await.is_err());
    }
}
