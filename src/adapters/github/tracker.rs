//! [`IssueTracker`] port implementation over the GitHub client.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::IssueComment;
use crate::domain::ports::{CloseReason, CreatedIssue, IssueTracker, TrackedIssue};

use super::client::GitHubClient;
use super::models::GitHubIssue;

/// GitHub-backed issue tracker.
pub struct GitHubTracker {
    client: GitHubClient,
}

impl GitHubTracker {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Split an `owner/repo` namespace string.
    fn split_repo(repo: &str) -> DomainResult<(&str, &str)> {
        repo.split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
            .ok_or_else(|| DomainError::Tracker(format!("invalid repository name: {repo}")))
    }

    fn to_tracked(issue: GitHubIssue) -> TrackedIssue {
        TrackedIssue {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            author: issue.user.login,
        }
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn get_issue(&self, repo: &str, number: u64) -> DomainResult<TrackedIssue> {
        let (owner, name) = Self::split_repo(repo)?;
        let issue = self.client.get_issue(owner, name, number).await?;
        Ok(Self::to_tracked(issue))
    }

    async fn list_comments(&self, repo: &str, number: u64) -> DomainResult<Vec<IssueComment>> {
        let (owner, name) = Self::split_repo(repo)?;
        let comments = self.client.list_comments(owner, name, number).await?;
        Ok(comments
            .into_iter()
            .map(|c| IssueComment {
                author: c.user.login,
                body: c.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_comment(&self, repo: &str, number: u64, body: &str) -> DomainResult<()> {
        let (owner, name) = Self::split_repo(repo)?;
        self.client.post_comment(owner, name, number, body).await
    }

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> DomainResult<CreatedIssue> {
        let (owner, name) = Self::split_repo(repo)?;
        let created = self
            .client
            .create_issue(owner, name, title, body, labels.to_vec())
            .await?;
        Ok(CreatedIssue {
            number: created.number,
            html_url: created.html_url,
        })
    }

    async fn close_issue(&self, repo: &str, number: u64, reason: CloseReason) -> DomainResult<()> {
        let (owner, name) = Self::split_repo(repo)?;
        self.client
            .close_issue(owner, name, number, reason.as_str())
            .await
    }

    async fn add_labels(&self, repo: &str, number: u64, labels: &[String]) -> DomainResult<()> {
        let (owner, name) = Self::split_repo(repo)?;
        self.client
            .add_labels(owner, name, number, labels.to_vec())
            .await
    }

    async fn list_open_issues(&self, repo: &str) -> DomainResult<Vec<TrackedIssue>> {
        let (owner, name) = Self::split_repo(repo)?;
        let issues = self.client.list_open_issues(owner, name).await?;
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Self::to_tracked)
            .collect())
    }
}
