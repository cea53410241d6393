//! GitHub HTTP client with rate limiting.
//!
//! Wraps the GitHub REST API v3, providing typed methods for the
//! operations used by the duplicate-detection and confirmation flows.
//! Includes a token-bucket rate limiter to stay within the 5 000
//! req/hour authenticated API limit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TrackerConfig;

use super::models::{
    GitHubComment, GitHubCommentRequest, GitHubCreateIssueRequest, GitHubCreateIssueResponse,
    GitHubIssue, GitHubIssueCloseRequest, GitHubLabelsRequest,
};

/// Comments / issues fetched per page.
const PER_PAGE: usize = 100;

/// Token-bucket rate limiter.
///
/// Allows up to `capacity` requests per `window`. When the bucket is
/// exhausted, [`acquire`](RateLimiter::acquire) sleeps until the window
/// resets and a token becomes available.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens in the bucket.
    capacity: u32,
    /// Current available tokens.
    tokens: u32,
    /// Duration of the refill window.
    window: Duration,
    /// When the current window started.
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            tokens: capacity,
            window,
            window_start: Instant::now(),
        }
    }

    /// Acquire a single token, sleeping if necessary.
    pub async fn acquire(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            self.tokens = self.capacity;
            self.window_start = Instant::now();
        }

        if self.tokens > 0 {
            self.tokens -= 1;
        } else {
            let remaining = self.window.saturating_sub(elapsed);
            tracing::warn!(
                sleep_ms = remaining.as_millis() as u64,
                "GitHub rate limit reached, sleeping"
            );
            tokio::time::sleep(remaining).await;
            self.tokens = self.capacity - 1;
            self.window_start = Instant::now();
        }
    }
}

/// HTTP client for the GitHub REST API v3.
///
/// All methods return [`DomainResult`] and map HTTP / network errors to
/// [`DomainError::Tracker`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// The underlying HTTP client.
    http: Client,
    /// Base URL of the API (overridable for tests).
    api_base: String,
    /// GitHub personal access token or fine-grained token.
    token: String,
    /// Shared rate limiter (5 000 req/hr for authenticated requests).
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl GitHubClient {
    /// Create a client from the tracker config. The token falls back to
    /// the `GITHUB_TOKEN` environment variable.
    pub fn new(config: &TrackerConfig) -> DomainResult<Self> {
        let token = config
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DomainError::Tracker(
                    "tracker token not set; set GITHUB_TOKEN or tracker.token".to_string(),
                )
            })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::Tracker(format!("failed to build HTTP client: {e}")))?;

        // GitHub allows 5 000 authenticated requests per hour.
        let rate_limiter = RateLimiter::new(5_000, Duration::from_secs(3_600));
        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            token,
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
        })
    }

    /// Acquire a rate-limit token and build an authorized request.
    async fn rate_limited_request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> reqwest::RequestBuilder {
        self.rate_limiter.lock().await.acquire().await;
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", "echofinder-bot")
    }

    async fn check_status(resp: reqwest::Response, op: &str) -> DomainResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(DomainError::Tracker(format!(
            "GitHub {op} returned {status}: {body}"
        )))
    }

    /// Fetch a single issue.
    pub async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> DomainResult<GitHubIssue> {
        let url = format!("{}/repos/{}/{}/issues/{}", self.api_base, owner, repo, number);
        let resp = self
            .rate_limited_request(reqwest::Method::GET, &url)
            .await
            .send()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub get_issue request failed: {e}")))?;
        let resp = Self::check_status(resp, "get_issue").await?;
        resp.json::<GitHubIssue>()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub get_issue parse failed: {e}")))
    }

    /// List all comments on an issue, in chronological order, walking
    /// every page.
    pub async fn list_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> DomainResult<Vec<GitHubComment>> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            let url = format!(
                "{}/repos/{}/{}/issues/{}/comments?per_page={}&page={}",
                self.api_base, owner, repo, number, PER_PAGE, page
            );
            let resp = self
                .rate_limited_request(reqwest::Method::GET, &url)
                .await
                .send()
                .await
                .map_err(|e| {
                    DomainError::Tracker(format!("GitHub list_comments request failed: {e}"))
                })?;
            let resp = Self::check_status(resp, "list_comments").await?;
            let batch: Vec<GitHubComment> = resp.json().await.map_err(|e| {
                DomainError::Tracker(format!("GitHub list_comments parse failed: {e}"))
            })?;

            let batch_len = batch.len();
            all.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    /// List open issues of a repository, walking every page.
    ///
    /// Note: GitHub's `/issues` endpoint also returns pull requests.
    /// Callers are responsible for filtering them out via the
    /// `pull_request` field.
    pub async fn list_open_issues(&self, owner: &str, repo: &str) -> DomainResult<Vec<GitHubIssue>> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            let url = format!(
                "{}/repos/{}/{}/issues?state=open&per_page={}&page={}",
                self.api_base, owner, repo, PER_PAGE, page
            );
            let resp = self
                .rate_limited_request(reqwest::Method::GET, &url)
                .await
                .send()
                .await
                .map_err(|e| {
                    DomainError::Tracker(format!("GitHub list_issues request failed: {e}"))
                })?;
            let resp = Self::check_status(resp, "list_issues").await?;
            let batch: Vec<GitHubIssue> = resp.json().await.map_err(|e| {
                DomainError::Tracker(format!("GitHub list_issues parse failed: {e}"))
            })?;

            let batch_len = batch.len();
            all.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    /// Post a comment on an issue.
    pub async fn post_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        comment: &str,
    ) -> DomainResult<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base, owner, repo, number
        );
        let body = GitHubCommentRequest {
            body: comment.to_string(),
        };
        let resp = self
            .rate_limited_request(reqwest::Method::POST, &url)
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub post_comment request failed: {e}")))?;
        Self::check_status(resp, "post_comment").await?;
        Ok(())
    }

    /// Create a new issue in a repository.
    pub async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        labels: Vec<String>,
    ) -> DomainResult<GitHubCreateIssueResponse> {
        let url = format!("{}/repos/{}/{}/issues", self.api_base, owner, repo);
        let req_body = GitHubCreateIssueRequest {
            title: title.to_string(),
            body: Some(body.to_string()),
            labels: if labels.is_empty() { None } else { Some(labels) },
        };
        let resp = self
            .rate_limited_request(reqwest::Method::POST, &url)
            .await
            .json(&req_body)
            .send()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub create_issue request failed: {e}")))?;
        let resp = Self::check_status(resp, "create_issue").await?;
        resp.json::<GitHubCreateIssueResponse>()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub create_issue parse failed: {e}")))
    }

    /// Close an issue with a state reason.
    pub async fn close_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        state_reason: &str,
    ) -> DomainResult<()> {
        let url = format!("{}/repos/{}/{}/issues/{}", self.api_base, owner, repo, number);
        let body = GitHubIssueCloseRequest {
            state: "closed".to_string(),
            state_reason: state_reason.to_string(),
        };
        let resp = self
            .rate_limited_request(reqwest::Method::PATCH, &url)
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub close_issue request failed: {e}")))?;
        Self::check_status(resp, "close_issue").await?;
        Ok(())
    }

    /// Add labels to an issue.
    pub async fn add_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: Vec<String>,
    ) -> DomainResult<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/labels",
            self.api_base, owner, repo, number
        );
        let body = GitHubLabelsRequest { labels };
        let resp = self
            .rate_limited_request(reqwest::Method::POST, &url)
            .await
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Tracker(format!("GitHub add_labels request failed: {e}")))?;
        Self::check_status(resp, "add_labels").await?;
        Ok(())
    }
}
