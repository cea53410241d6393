//! Synthesis orchestrator: once both authors confirm, generate a merged
//! issue from the two originals and retire them.
//!
//! Exactly-once is not achievable over a remote tracker; instead the
//! orchestrator guarantees at-most-one *concurrent* synthesis per pair
//! (leased claim keyed by the token identity) and leaves the pair in a
//! retryable confirmed-but-unmerged condition on failure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{IssueComment, MergeState, PairingToken, SynthesisConfig};
use crate::domain::ports::{
    CloseReason, GenerationError, IssueStore, IssueTracker, TextGenerator, TrackedIssue,
};

use super::messages;
use super::pair_lock::PairLock;

/// Marker prefix for a cached synthesis result embedded in a comment.
pub const SYNTHESIS_MARKER: &str = "ECHOFINDER_SYNTHESIS:";

/// Labels applied to the synthesized issue.
const MERGED_LABELS: [&str; 2] = ["merged", "substantiated"];

/// The structured result of a synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedContent {
    pub title: String,
    pub body: String,
}

pub struct SynthesisService {
    tracker: Arc<dyn IssueTracker>,
    store: Arc<dyn IssueStore>,
    /// Absent when no generation credential is configured; synthesis
    /// then fails fast with a user-visible notice.
    generator: Option<Arc<dyn TextGenerator>>,
    config: SynthesisConfig,
    lock: Arc<PairLock>,
}

impl SynthesisService {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        store: Arc<dyn IssueStore>,
        generator: Option<Arc<dyn TextGenerator>>,
        config: SynthesisConfig,
    ) -> Self {
        Self {
            tracker,
            store,
            generator,
            config,
            lock: PairLock::new(),
        }
    }

    /// Whether a synthesis for this pair is currently running. A reject
    /// arriving while this holds is dropped: synthesis runs to
    /// completion or failure, never mid-flight cancellation.
    pub fn in_flight(&self, token: &PairingToken) -> bool {
        self.lock.is_claimed(&token.identity())
    }

    /// Run the merge for a jointly confirmed pair.
    ///
    /// Every outcome returns `Ok`: failures are reported to the users
    /// on the `orig` issue and logged, and the pair stays retryable.
    pub async fn synthesize(
        &self,
        token: &PairingToken,
        orig: &TrackedIssue,
        new: &TrackedIssue,
    ) -> DomainResult<()> {
        let Some(_claim) = self.lock.try_claim(&token.identity()) else {
            tracing::info!(token = %token.identity(), "synthesis already in flight, dropping event");
            return Ok(());
        };

        let Some(generator) = self.generator.clone() else {
            tracing::error!("generation API key missing, cannot synthesize");
            self.post_failure(token, "generation API key is not configured", None)
                .await;
            return Ok(());
        };

        // A previously published result for this exact pair short-cuts
        // the generation call entirely.
        let cached = match self.tracker.list_comments(&token.orig.repo, token.orig.number).await {
            Ok(comments) => find_cached_synthesis(&comments, token),
            Err(e) => {
                tracing::warn!(error = %e, "could not scan for cached synthesis, generating fresh");
                None
            }
        };

        let merged = match cached {
            Some(content) => {
                tracing::info!(token = %token.identity(), "reusing cached synthesis result");
                content
            }
            None => match self.generate_merged(generator.as_ref(), orig, new).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::error!(token = %token.identity(), error = %e, "synthesis generation failed");
                    self.post_failure(token, &format!("text generation failed ({e})"), None)
                        .await;
                    return Ok(());
                }
            },
        };

        let title = format!("[MERGED] {}", merged.title);
        let body = messages::merged_issue_body(&merged.body, token);
        let labels: Vec<String> = MERGED_LABELS.iter().map(|s| (*s).to_string()).collect();

        let created = match self
            .tracker
            .create_issue(&token.orig.repo, &title, &body, &labels)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(error = %e, "could not create merged issue");
                // The generated text is not lost: embed it in the
                // failure notice so a retry skips regeneration.
                let marker = encode_cached_synthesis(token, &merged);
                self.post_failure(token, "could not create the merged issue", Some(&marker))
                    .await;
                return Ok(());
            }
        };

        tracing::info!(
            merged = %format!("{}#{}", token.orig.repo, created.number),
            "merged issue created"
        );

        // Terminal state, close, and link. Individually best-effort:
        // the merged issue exists, so partial failures here must not
        // unwind it.
        let close_note = messages::merged_close_comment(&created);
        for side in [&token.orig, &token.new] {
            if let Err(e) = self
                .store
                .set_merge_state(&side.repo, side.number, MergeState::Merged)
                .await
            {
                tracing::warn!(issue = %side, error = %e, "could not persist merged state");
            }
            if let Err(e) = self
                .tracker
                .close_issue(&side.repo, side.number, CloseReason::NotPlanned)
                .await
            {
                tracing::warn!(issue = %side, error = %e, "could not close original issue");
            }
            if let Err(e) = self
                .tracker
                .create_comment(&side.repo, side.number, &close_note)
                .await
            {
                tracing::warn!(issue = %side, error = %e, "could not post close comment");
            }
        }

        Ok(())
    }

    /// Call the generation service through the model fallback chain.
    ///
    /// A transient failure (overload, rate limit, timeout, 5xx) advances
    /// to the next model; any other failure aborts the attempt.
    async fn generate_merged(
        &self,
        generator: &dyn TextGenerator,
        orig: &TrackedIssue,
        new: &TrackedIssue,
    ) -> Result<MergedContent, GenerationError> {
        let prompt = merge_prompt(orig, new);
        let mut last_transient = None;

        for model in &self.config.models {
            match generator.generate(model, &prompt).await {
                Ok(text) => return parse_merged_response(&text),
                Err(e) if e.is_transient() => {
                    tracing::warn!(model = %model, error = %e, "transient generation failure, trying next model");
                    last_transient = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_transient.unwrap_or_else(|| {
            GenerationError::InvalidRequest("empty model fallback chain".to_string())
        }))
    }

    /// Post the single failure notice on the `orig` side.
    async fn post_failure(&self, token: &PairingToken, reason: &str, cache_marker: Option<&str>) {
        let body = messages::merge_failure_notice(reason, cache_marker);
        if let Err(e) = self
            .tracker
            .create_comment(&token.orig.repo, token.orig.number, &body)
            .await
        {
            tracing::error!(error = %e, "could not post synthesis failure notice");
        }
    }
}

/// Fixed instruction template for the merge.
fn merge_prompt(orig: &TrackedIssue, new: &TrackedIssue) -> String {
    format!(
        "You are an expert technical project manager. Your task is to merge two duplicate \
         issue reports into a single, comprehensive new issue.\n\n\
         ISSUE 1 (Original):\nTitle: {orig_title}\nBody: {orig_body}\n\n\
         ISSUE 2 (Duplicate):\nTitle: {new_title}\nBody: {new_body}\n\n\
         INSTRUCTIONS:\n\
         1. Create a NEW title that best represents the core problem.\n\
         2. Create a NEW body that combines details from both. Include reproduction steps, \
         logs, and context from both if available. Format it nicely with Markdown.\n\
         3. Return the result as a JSON object with keys: \"title\" and \"body\".\n\
         4. Do NOT include Markdown code blocks (like ```json) in the response, just the raw \
         JSON string.",
        orig_title = orig.title,
        orig_body = orig.body,
        new_title = new.title,
        new_body = new.body,
    )
}

/// Parse the model's reply into a [`MergedContent`], tolerating the code
/// fences the instructions forbid but models add anyway.
fn parse_merged_response(text: &str) -> Result<MergedContent, GenerationError> {
    let mut cleaned = text.trim();
    cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    cleaned = cleaned.strip_prefix("```").unwrap_or(cleaned);
    cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    let cleaned = cleaned.trim();

    let content: MergedContent = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::MalformedResponse(format!("not a title/body object: {e}")))?;
    if content.title.trim().is_empty() {
        return Err(GenerationError::MalformedResponse(
            "empty title in response".to_string(),
        ));
    }
    Ok(content)
}

/// Render a cached synthesis marker for this pair.
pub fn encode_cached_synthesis(token: &PairingToken, content: &MergedContent) -> String {
    let json = serde_json::to_string(content).unwrap_or_default();
    format!("<!-- {}{}:{} -->", SYNTHESIS_MARKER, token.identity(), json)
}

/// Scan comments for a cached synthesis result keyed by this exact pair
/// identity. Malformed cached data is ignored so the caller falls back
/// to a fresh live call.
pub fn find_cached_synthesis(
    comments: &[IssueComment],
    token: &PairingToken,
) -> Option<MergedContent> {
    let key = format!("{}{}:", SYNTHESIS_MARKER, token.identity());
    for comment in comments {
        let Some(start) = comment.body.find(&key) else {
            continue;
        };
        let rest = &comment.body[start + key.len()..];
        let Some(end) = rest.rfind("-->") else {
            continue;
        };
        let json = rest[..end].trim();
        match serde_json::from_str::<MergedContent>(json) {
            Ok(content) if !content.title.trim().is_empty() => return Some(content),
            _ => {
                tracing::warn!("malformed cached synthesis marker, ignoring");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::IssueRef;

    fn token() -> PairingToken {
        PairingToken::new(
            IssueRef::new("acme/widgets", 12),
            IssueRef::new("acme/widgets", 47),
        )
    }

    fn comment(body: String) -> IssueComment {
        IssueComment {
            author: "echofinder[bot]".to_string(),
            body,
        }
    }

    #[test]
    fn test_parse_merged_response_plain_json() {
        let content =
            parse_merged_response(r#"{"title": "Login crashes", "body": "Combined details"}"#)
                .unwrap();
        assert_eq!(content.title, "Login crashes");
        assert_eq!(content.body, "Combined details");
    }

    #[test]
    fn test_parse_merged_response_strips_fences() {
        let content = parse_merged_response(
            "```json\n{\"title\": \"Login crashes\", \"body\": \"b\"}\n```",
        )
        .unwrap();
        assert_eq!(content.title, "Login crashes");
    }

    #[test]
    fn test_parse_merged_response_rejects_garbage() {
        assert!(parse_merged_response("not json at all").is_err());
        assert!(parse_merged_response(r#"{"title": "", "body": "b"}"#).is_err());
        assert!(parse_merged_response(r#"{"heading": "x"}"#).is_err());
    }

    #[test]
    fn test_cached_synthesis_round_trip() {
        let t = token();
        let content = MergedContent {
            title: "Login crashes on submit".to_string(),
            body: "Combined reproduction steps.".to_string(),
        };
        let marker = encode_cached_synthesis(&t, &content);
        let history = vec![comment(format!("❌ **Merge Failed**\n\n{marker}"))];
        assert_eq!(find_cached_synthesis(&history, &t), Some(content));
    }

    #[test]
    fn test_cached_synthesis_keyed_by_exact_identity() {
        let t = token();
        let other = PairingToken::new(
            IssueRef::new("acme/widgets", 12),
            IssueRef::new("acme/widgets", 99),
        );
        let content = MergedContent {
            title: "t".to_string(),
            body: "b".to_string(),
        };
        let history = vec![comment(encode_cached_synthesis(&other, &content))];
        assert!(find_cached_synthesis(&history, &t).is_none());
    }

    #[test]
    fn test_cached_synthesis_malformed_falls_through() {
        let t = token();
        let history = vec![comment(format!(
            "<!-- {}{}:{} -->",
            SYNTHESIS_MARKER,
            t.identity(),
            "{not valid json"
        ))];
        assert!(find_cached_synthesis(&history, &t).is_none());
    }
}
