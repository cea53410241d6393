//! Issue records and merge lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Merge lifecycle state of a tracked issue.
///
/// `Merged` and `Rejected` are terminal: records in a terminal state are
/// never returned as similarity-search candidates again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeState {
    None,
    Pending,
    Merged,
    Rejected,
}

impl MergeState {
    /// Storage representation, matching the `merge_state` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeState::None => "none",
            MergeState::Pending => "pending",
            MergeState::Merged => "merged",
            MergeState::Rejected => "rejected",
        }
    }

    /// Parse the storage representation. Unknown values map to `None`
    /// rather than failing: a corrupted state tag must not wedge reads.
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => MergeState::Pending,
            "merged" => MergeState::Merged,
            "rejected" => MergeState::Rejected,
            _ => MergeState::None,
        }
    }

    /// Whether the record is excluded from future candidate matching.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MergeState::Merged | MergeState::Rejected)
    }
}

/// A tracked issue as persisted in the vector store.
///
/// `id` is the tracker-assigned globally unique identifier and the storage
/// primary key; `(repo_name, issue_number)` resolves to at most one record
/// at a time. The pairing token is never stored here — the comment history
/// on the issues themselves is its only home.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    pub id: u64,
    /// Namespace string, `owner/repo`.
    pub repo_name: String,
    pub issue_number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
    /// Absent when embedding generation failed for this issue.
    pub embedding: Option<Vec<f32>>,
    pub merge_state: MergeState,
    pub updated_at: DateTime<Utc>,
}

impl IssueRecord {
    /// Build a fresh record with `merge_state = none` and a current
    /// timestamp.
    pub fn new(
        id: u64,
        repo_name: impl Into<String>,
        issue_number: u64,
        title: impl Into<String>,
        body: impl Into<String>,
        author: impl Into<String>,
        embedding: Option<Vec<f32>>,
    ) -> Self {
        Self {
            id,
            repo_name: repo_name.into(),
            issue_number,
            title: title.into(),
            body: body.into(),
            author: author.into(),
            embedding,
            merge_state: MergeState::None,
            updated_at: Utc::now(),
        }
    }

    /// The text that gets embedded: title and body joined by a newline.
    pub fn embedding_text(title: &str, body: &str) -> String {
        format!("{title}\n{body}")
    }
}

/// A similarity-search candidate: a stored record annotated with its
/// cosine similarity to the query embedding, in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct SimilarIssue {
    pub id: u64,
    pub repo_name: String,
    pub issue_number: u64,
    pub title: String,
    pub merge_state: MergeState,
    pub similarity: f32,
}

/// A comment on a tracked issue, as needed for confirmation derivation:
/// who wrote it and what it says.
#[derive(Debug, Clone)]
pub struct IssueComment {
    pub author: String,
    pub body: String,
}
