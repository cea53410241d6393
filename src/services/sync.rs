//! Startup sync: backfill open issues into the vector store.
//!
//! Pre-existing open issues must be searchable before the first webhook
//! arrives. The sync is idempotent and cheap to re-run: an existence
//! probe per issue avoids re-embedding anything already stored, so a
//! second pass over an unchanged issue set performs zero embedding
//! calls.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::IssueRecord;
use crate::domain::ports::{EmbeddingProvider, IssueStore, IssueTracker};

pub struct SyncService {
    tracker: Arc<dyn IssueTracker>,
    store: Arc<dyn IssueStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    repos: Vec<String>,
}

impl SyncService {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        store: Arc<dyn IssueStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        repos: Vec<String>,
    ) -> Self {
        Self {
            tracker,
            store,
            embeddings,
            repos,
        }
    }

    /// Sync every configured repository. Per-repo failures are logged
    /// and do not stop the remaining repositories.
    pub async fn run(&self) -> DomainResult<()> {
        tracing::info!(repos = self.repos.len(), "starting issue sync");
        for repo in &self.repos {
            match self.sync_repo(repo).await {
                Ok((new, skipped)) => {
                    tracing::info!(repo = %repo, new, skipped, "repository synced");
                }
                Err(e) => {
                    tracing::warn!(repo = %repo, error = %e, "repository sync failed");
                }
            }
        }
        Ok(())
    }

    /// Returns `(new, skipped)` counts.
    async fn sync_repo(&self, repo: &str) -> DomainResult<(usize, usize)> {
        let issues = self.tracker.list_open_issues(repo).await?;

        let mut new_count = 0usize;
        let mut skip_count = 0usize;
        for issue in issues {
            // Existence first: re-embedding the whole corpus on every
            // restart would be the expensive path.
            match self.store.exists(issue.id).await {
                Ok(true) => {
                    skip_count += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(id = issue.id, error = %e, "existence check failed, skipping issue");
                    continue;
                }
            }

            let text = IssueRecord::embedding_text(&issue.title, &issue.body);
            let embedding = match self.embeddings.embed(&text).await {
                Ok(vector) => vector,
                Err(e) => {
                    tracing::warn!(repo = %repo, number = issue.number, error = %e, "could not embed issue");
                    continue;
                }
            };

            let record = IssueRecord::new(
                issue.id,
                repo,
                issue.number,
                issue.title,
                issue.body,
                issue.author,
                Some(embedding),
            );
            if let Err(e) = self.store.upsert(&record).await {
                tracing::warn!(repo = %repo, number = record.issue_number, error = %e, "could not upsert issue");
                continue;
            }
            new_count += 1;
        }

        Ok((new_count, skip_count))
    }
}
