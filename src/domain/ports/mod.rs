//! Ports: trait boundaries to external collaborators.

pub mod embedding;
pub mod generation;
pub mod issue_store;
pub mod tracker;

pub use embedding::EmbeddingProvider;
pub use generation::{GenerationError, TextGenerator};
pub use issue_store::IssueStore;
pub use tracker::{CloseReason, CreatedIssue, IssueTracker, TrackedIssue};
