//! Embedding provider adapters.

pub mod http;

pub use http::HttpEmbeddingProvider;
