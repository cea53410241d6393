//! Vector store port for issue records.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{IssueRecord, MergeState, SimilarIssue};

/// Persistence contract for issue records with embedding vectors.
///
/// The store is the only durable shared mutable resource in the system.
/// Content writes (`upsert`) and state writes (`set_merge_state`) are
/// deliberately separate, field-scoped operations so concurrent handlers
/// cannot lose each other's updates through whole-record overwrites.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Insert or fully replace the record for `record.id`, refreshing
    /// `updated_at`. Safe to call repeatedly with identical data.
    async fn upsert(&self, record: &IssueRecord) -> DomainResult<()>;

    /// Up to `limit` records in the namespace, ordered by descending
    /// cosine similarity to `query`, each annotated with its score.
    ///
    /// A namespace containing `/` selects exactly that repository;
    /// otherwise it selects every repository under that owner. Records
    /// without an embedding and records in a terminal merge state are
    /// never returned.
    async fn nearest_neighbors(
        &self,
        query: &[f32],
        namespace: &str,
        limit: usize,
    ) -> DomainResult<Vec<SimilarIssue>>;

    /// Targeted update of the state field and timestamp only.
    async fn set_merge_state(
        &self,
        repo_name: &str,
        issue_number: u64,
        state: MergeState,
    ) -> DomainResult<()>;

    /// Cheap existence probe, used by sync to avoid re-embedding.
    async fn exists(&self, id: u64) -> DomainResult<bool>;
}
