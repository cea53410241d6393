//! EchoFinder - near-duplicate issue detection and merge confirmation.
//!
//! EchoFinder watches an issue tracker for newly opened issues, finds
//! semantically similar existing issues via embedding vectors, and
//! coordinates a two-party confirmation protocol: once both issue
//! authors agree, it synthesizes the two reports into one merged issue
//! through a text-generation service and closes the originals.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture
//! principles:
//!
//! - **Domain Layer** (`domain`): models, pure protocol logic, and ports
//! - **Service Layer** (`services`): similarity matching, the
//!   confirmation state machine, synthesis orchestration, startup sync
//! - **Adapters** (`adapters`): SQLite vector store, HTTP embedding
//!   provider, Gemini text generation, GitHub tracker, webhook receiver
//! - **Infrastructure** (`infrastructure`): configuration loading

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, IssueComment, IssueRecord, IssueRef, MergeState, PairingToken, SimilarIssue,
};
pub use domain::ports::{EmbeddingProvider, IssueStore, IssueTracker, TextGenerator};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConfirmationService, SimilarityMatcher, SyncService, SynthesisService};
