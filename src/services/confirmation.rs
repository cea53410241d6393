//! Confirmation state machine over untrusted comment history.
//!
//! There is no persisted state object for this machine. On every
//! qualifying comment event the joint state of the pair is recomputed
//! from both issues' full comment histories, which makes the protocol
//! resilient to duplicate and out-of-order webhook deliveries at the
//! cost of repeated list-comment calls.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    derive_side_state, parse_command, CommentCreated, MergeCommand, MergeState, PairSide,
    PairingToken,
};
use crate::domain::ports::{IssueStore, IssueTracker, TrackedIssue};

use super::messages;
use super::synthesis::SynthesisService;

/// Label applied to both issues when either author rejects.
const LABEL_REJECTED: &str = "merge-rejected";

pub struct ConfirmationService {
    tracker: Arc<dyn IssueTracker>,
    store: Arc<dyn IssueStore>,
    synthesis: Arc<SynthesisService>,
}

impl ConfirmationService {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        store: Arc<dyn IssueStore>,
        synthesis: Arc<SynthesisService>,
    ) -> Self {
        Self {
            tracker,
            store,
            synthesis,
        }
    }

    /// Handle a newly created comment on any issue.
    pub async fn handle_comment(&self, event: &CommentCreated) -> DomainResult<()> {
        let Some(command) = parse_command(&event.body) else {
            return Ok(());
        };

        // The embedded marker in the issue's own history is the only way
        // to rediscover the pair. No marker means this issue is not part
        // of a duplicate-pair context — a normal outcome.
        let comments = self
            .tracker
            .list_comments(&event.repo_name, event.issue_number)
            .await?;
        let Some(token) = comments.iter().find_map(|c| PairingToken::find_in(&c.body)) else {
            tracing::debug!(
                repo = %event.repo_name,
                number = event.issue_number,
                "command comment without pairing token, ignoring"
            );
            return Ok(());
        };

        let Some(side) = token.side_of(&event.repo_name, event.issue_number) else {
            tracing::warn!(
                token = %token.identity(),
                repo = %event.repo_name,
                number = event.issue_number,
                "issue matches neither side of its own pairing token, ignoring"
            );
            return Ok(());
        };

        // Authors live on the issues themselves, potentially in two
        // different repositories.
        let (orig_issue, new_issue) = futures::future::try_join(
            self.tracker.get_issue(&token.orig.repo, token.orig.number),
            self.tracker.get_issue(&token.new.repo, token.new.number),
        )
        .await?;

        // Only the issue's own author can drive its side; comments from
        // anyone else, including the opposing author, carry no weight.
        let own_author = match side {
            PairSide::Orig => &orig_issue.author,
            PairSide::New => &new_issue.author,
        };
        if event.commenter != *own_author {
            tracing::debug!(
                commenter = %event.commenter,
                author = %own_author,
                "command from non-author ignored"
            );
            return Ok(());
        }

        match command {
            MergeCommand::Reject => self.reject_pair(&token, &event.commenter).await,
            MergeCommand::Accept => {
                self.advance_pair(&token, side, &orig_issue, &new_issue).await
            }
        }
    }

    /// Rejection is final and needs no opposing confirmation.
    async fn reject_pair(&self, token: &PairingToken, commenter: &str) -> DomainResult<()> {
        // Once synthesis started it runs to completion or failure; a
        // reject overlapping it is dropped rather than cancelling
        // half-closed issues.
        if self.synthesis.in_flight(token) {
            tracing::info!(token = %token.identity(), "synthesis in flight, reject not honored");
            return Ok(());
        }

        let notice = messages::rejection_notice(commenter);
        for side in [&token.orig, &token.new] {
            if let Err(e) = self
                .store
                .set_merge_state(&side.repo, side.number, MergeState::Rejected)
                .await
            {
                tracing::warn!(issue = %side, error = %e, "could not persist rejected state");
            }
            if let Err(e) = self
                .tracker
                .add_labels(&side.repo, side.number, &[LABEL_REJECTED.to_string()])
                .await
            {
                tracing::debug!(issue = %side, error = %e, "could not apply rejected label");
            }
            if let Err(e) = self.tracker.create_comment(&side.repo, side.number, &notice).await {
                tracing::warn!(issue = %side, error = %e, "could not post rejection notice");
            }
        }

        tracing::info!(token = %token.identity(), "pair rejected");
        Ok(())
    }

    /// An authorized accept: recompute both sides and either wait or
    /// hand over to synthesis.
    async fn advance_pair(
        &self,
        token: &PairingToken,
        side: PairSide,
        orig_issue: &TrackedIssue,
        new_issue: &TrackedIssue,
    ) -> DomainResult<()> {
        let (orig_comments, new_comments) = futures::future::try_join(
            self.tracker.list_comments(&token.orig.repo, token.orig.number),
            self.tracker.list_comments(&token.new.repo, token.new.number),
        )
        .await?;

        let orig_state = derive_side_state(&orig_comments, &orig_issue.author);
        let new_state = derive_side_state(&new_comments, &new_issue.author);

        // A historic reject from either author is final; later accepts
        // cannot revive the pair.
        if orig_state.is_rejected() || new_state.is_rejected() {
            tracing::info!(token = %token.identity(), "pair already rejected, accept ignored");
            return Ok(());
        }

        // The event itself is an authorized accept for `side`, so that
        // side is confirmed even if the read raced the comment write.
        let other_confirmed = match side {
            PairSide::Orig => new_state.is_confirmed(),
            PairSide::New => orig_state.is_confirmed(),
        };

        if other_confirmed {
            return self.synthesis.synthesize(token, orig_issue, new_issue).await;
        }

        // Waiting transition. Replaying the same confirming event posts
        // the same pair of notices again — accepted at-least-once
        // duplication, not exactly-once.
        let own = token.own(side);
        let other = token.other(side);
        self.tracker
            .create_comment(&own.repo, own.number, &messages::waiting_ack())
            .await?;
        self.tracker
            .create_comment(&other.repo, other.number, &messages::confirm_nudge(own))
            .await?;

        tracing::info!(token = %token.identity(), confirmed = %own, "one side confirmed, waiting for the other");
        Ok(())
    }
}
