//! Inbound tracker events at the webhook boundary.
//!
//! The delivery layer is an external collaborator; these are the two
//! event shapes this system consumes, already reduced to the fields the
//! handlers need. No ordering or exactly-once guarantees are assumed —
//! handlers must tolerate duplicate and out-of-order delivery.

/// A newly opened issue.
#[derive(Debug, Clone)]
pub struct IssueOpened {
    /// Tracker-assigned globally unique id.
    pub id: u64,
    /// `owner/repo`.
    pub repo_name: String,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
}

/// A newly created comment on an issue.
#[derive(Debug, Clone)]
pub struct CommentCreated {
    /// `owner/repo`.
    pub repo_name: String,
    pub issue_number: u64,
    pub body: String,
    /// Login of the commenter, checked against the issue author.
    pub commenter: String,
}
