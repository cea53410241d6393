//! Issue tracker port.
//!
//! The tracker (GitHub or compatible) owns issue and comment CRUD; this
//! port names exactly the operations the duplicate-detection and
//! confirmation flows need.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::IssueComment;

/// An issue fetched from the tracker.
#[derive(Debug, Clone)]
pub struct TrackedIssue {
    /// Tracker-assigned globally unique id.
    pub id: u64,
    /// Number within the repository.
    pub number: u64,
    pub title: String,
    pub body: String,
    /// Login of the issue author; the authorization anchor for the
    /// confirmation protocol.
    pub author: String,
}

/// A freshly created issue.
#[derive(Debug, Clone)]
pub struct CreatedIssue {
    pub number: u64,
    pub html_url: String,
}

/// Reason attached when closing an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    NotPlanned,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Completed => "completed",
            CloseReason::NotPlanned => "not_planned",
        }
    }
}

/// Operations against the remote issue tracker.
///
/// All `repo` arguments are `owner/repo` strings; the two sides of a pair
/// may live in different repositories.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get_issue(&self, repo: &str, number: u64) -> DomainResult<TrackedIssue>;

    /// All comments on an issue, in chronological order.
    async fn list_comments(&self, repo: &str, number: u64) -> DomainResult<Vec<IssueComment>>;

    async fn create_comment(&self, repo: &str, number: u64, body: &str) -> DomainResult<()>;

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> DomainResult<CreatedIssue>;

    async fn close_issue(&self, repo: &str, number: u64, reason: CloseReason) -> DomainResult<()>;

    async fn add_labels(&self, repo: &str, number: u64, labels: &[String]) -> DomainResult<()>;

    /// All open issues of a repository (pull requests excluded), for the
    /// startup sync.
    async fn list_open_issues(&self, repo: &str) -> DomainResult<Vec<TrackedIssue>>;
}
