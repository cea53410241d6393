//! Similarity matcher: turns a newly opened issue into a candidate
//! duplicate pair when a close-enough neighbor exists.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    IssueOpened, IssueRecord, IssueRef, MatcherConfig, MergeState, PairingToken, SimilarIssue,
};
use crate::domain::ports::{EmbeddingProvider, IssueStore, IssueTracker};

use super::messages;

/// Labels applied when a pair is proposed.
const LABEL_NEW_SIDE: &str = "duplicate?";
const LABEL_ORIG_SIDE: &str = "has-duplicates";

pub struct SimilarityMatcher {
    store: Arc<dyn IssueStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    tracker: Arc<dyn IssueTracker>,
    config: MatcherConfig,
}

impl SimilarityMatcher {
    pub fn new(
        store: Arc<dyn IssueStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        tracker: Arc<dyn IssueTracker>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            tracker,
            config,
        }
    }

    /// Handle a freshly opened issue: embed, persist, search, and
    /// propose a pair when the best candidate clears the threshold.
    pub async fn handle_issue_opened(&self, event: &IssueOpened) -> DomainResult<()> {
        let text = IssueRecord::embedding_text(&event.title, &event.body);

        // Embedding failure is a soft failure: no comment, no match
        // state, nothing propagated to the caller.
        let embedding = match self.embeddings.embed(&text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(
                    repo = %event.repo_name,
                    number = event.number,
                    error = %e,
                    "embedding failed, skipping duplicate detection"
                );
                return Ok(());
            }
        };

        // Best-effort persistence: a failed upsert limits future
        // matching but must not abort this detection pass.
        let record = IssueRecord::new(
            event.id,
            &event.repo_name,
            event.number,
            &event.title,
            &event.body,
            &event.author,
            Some(embedding.clone()),
        );
        if let Err(e) = self.store.upsert(&record).await {
            tracing::warn!(error = %e, "issue upsert failed, continuing");
        }

        // Similarity search scoped to the owning namespace, so matches
        // can span the owner's repositories but never unrelated ones.
        let namespace = owner_of(&event.repo_name);
        let matches = self
            .store
            .nearest_neighbors(&embedding, namespace, self.config.candidate_limit)
            .await?;

        // The just-written record may already be visible to the query
        // and would score 1.0 against itself.
        let candidates: Vec<SimilarIssue> = matches
            .into_iter()
            .filter(|m| !(m.repo_name == event.repo_name && m.issue_number == event.number))
            .collect();

        let Some(best) = candidates.first() else {
            tracing::info!(repo = %event.repo_name, number = event.number, "no similar issues found");
            return Ok(());
        };

        tracing::info!(
            repo = %event.repo_name,
            number = event.number,
            best = %format!("{}#{}", best.repo_name, best.issue_number),
            score = best.similarity,
            threshold = self.config.similarity_threshold,
            "best similarity candidate"
        );

        if best.similarity <= self.config.similarity_threshold {
            return Ok(());
        }

        // One active pair per issue: while the candidate is pending in
        // another pair, no new token is minted against it.
        if best.merge_state == MergeState::Pending {
            tracing::info!(
                candidate = %format!("{}#{}", best.repo_name, best.issue_number),
                "candidate already in an active pair, not proposing"
            );
            return Ok(());
        }

        self.propose_pair(event, best).await
    }

    /// Mint the pairing token and post it to both issues.
    async fn propose_pair(&self, event: &IssueOpened, best: &SimilarIssue) -> DomainResult<()> {
        let token = PairingToken::new(
            IssueRef::new(&best.repo_name, best.issue_number),
            IssueRef::new(&event.repo_name, event.number),
        );

        // Both comments must carry the identical marker so either side
        // can rediscover the pairing.
        self.tracker
            .create_comment(
                &event.repo_name,
                event.number,
                &messages::duplicate_found(&token.orig, &best.title, best.similarity, &token),
            )
            .await?;
        self.tracker
            .create_comment(
                &best.repo_name,
                best.issue_number,
                &messages::duplicate_notice(&token.new, &event.title, best.similarity, &token),
            )
            .await?;

        // Labels may not exist in the repo; failing to apply them must
        // not fail the proposal.
        if let Err(e) = self
            .tracker
            .add_labels(&event.repo_name, event.number, &[LABEL_NEW_SIDE.to_string()])
            .await
        {
            tracing::debug!(error = %e, "could not label new issue");
        }
        if let Err(e) = self
            .tracker
            .add_labels(
                &best.repo_name,
                best.issue_number,
                &[LABEL_ORIG_SIDE.to_string()],
            )
            .await
        {
            tracing::debug!(error = %e, "could not label original issue");
        }

        // Mark both sides pending so no second pair is proposed against
        // either while this one is active.
        for side in [&token.orig, &token.new] {
            if let Err(e) = self
                .store
                .set_merge_state(&side.repo, side.number, MergeState::Pending)
                .await
            {
                tracing::warn!(issue = %side, error = %e, "could not mark record pending");
            }
        }

        tracing::info!(token = %token.identity(), "duplicate pair proposed");
        Ok(())
    }
}

/// The owner segment of an `owner/repo` name.
fn owner_of(repo_name: &str) -> &str {
    repo_name.split('/').next().unwrap_or(repo_name)
}
