//! Embedding provider port for semantic vector generation.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for embedding providers that convert issue text into dense
/// vector representations for similarity search.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "http", "null").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;
}
