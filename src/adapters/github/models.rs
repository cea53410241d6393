//! GitHub Issues API response and request models.
//!
//! These structs map to the GitHub REST API v3 JSON payloads. They are
//! used internally by the GitHub adapter and are not part of the domain
//! model.

use serde::{Deserialize, Serialize};

/// An issue returned by the GitHub API.
///
/// Note: issues and pull requests share the same endpoint. Pull requests
/// include a non-null `pull_request` field; callers skip those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    /// Unique numeric identifier for the issue.
    pub id: u64,
    /// Sequential number within the repository (e.g., 42 → "#42").
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Issue body text (may be absent or null).
    #[serde(default)]
    pub body: Option<String>,
    /// Current state: "open" or "closed".
    pub state: String,
    /// The issue author.
    pub user: GitHubUser,
    /// Present when this item is actually a pull request, not an issue.
    #[serde(default)]
    pub pull_request: Option<GitHubPullRequestRef>,
    /// URL to view the issue in the GitHub UI.
    pub html_url: String,
}

/// A GitHub account reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

/// A comment on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComment {
    #[serde(default)]
    pub body: Option<String>,
    pub user: GitHubUser,
}

/// Reference object present on pull requests (absent on plain issues).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubPullRequestRef {
    /// API URL of the pull request resource.
    pub url: String,
}

/// Request body for posting a comment on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommentRequest {
    /// The comment body (plain text or Markdown).
    pub body: String,
}

/// Request body for creating a new GitHub issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCreateIssueRequest {
    /// Issue title.
    pub title: String,
    /// Issue body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Labels to apply to the new issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Response from the create-issue endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCreateIssueResponse {
    /// Issue number within the repository.
    pub number: u64,
    /// URL to view the issue in the GitHub UI.
    pub html_url: String,
}

/// Request body for closing an issue with a reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssueCloseRequest {
    /// New state: always "closed".
    pub state: String,
    /// Close reason: "completed" or "not_planned".
    pub state_reason: String,
}

/// Request body for adding labels to an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLabelsRequest {
    pub labels: Vec<String>,
}
