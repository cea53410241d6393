//! Webhook receiver.
//!
//! Thin HTTP boundary over the event-driven core: GitHub delivers
//! `issues` and `issue_comment` events here, each handled as an
//! independent detached task. A handler failure is logged and never
//! propagates — the receiver must stay alive through any single bad
//! event. Delivery authentication/signature verification belongs to the
//! routing layer in front of this process.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::domain::models::{CommentCreated, IssueOpened};
use crate::services::{ConfirmationService, SimilarityMatcher};

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    pub matcher: Arc<SimilarityMatcher>,
    pub confirmations: Arc<ConfirmationService>,
}

/// Build the webhook router.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: WebhookState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "webhook server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn handle_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let event = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match event.as_str() {
        "issues" => match serde_json::from_str::<IssuesPayload>(&body) {
            Ok(payload) if payload.action == "opened" => {
                let matcher = Arc::clone(&state.matcher);
                let event = payload.into_event();
                tokio::spawn(async move {
                    if let Err(e) = matcher.handle_issue_opened(&event).await {
                        tracing::error!(
                            repo = %event.repo_name,
                            number = event.number,
                            error = %e,
                            "issue-opened handler failed"
                        );
                    }
                });
                StatusCode::ACCEPTED
            }
            Ok(payload) => {
                tracing::debug!(action = %payload.action, "ignoring issues action");
                StatusCode::ACCEPTED
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed issues payload");
                StatusCode::BAD_REQUEST
            }
        },
        "issue_comment" => match serde_json::from_str::<CommentPayload>(&body) {
            Ok(payload) if payload.action == "created" => {
                let confirmations = Arc::clone(&state.confirmations);
                let event = payload.into_event();
                tokio::spawn(async move {
                    if let Err(e) = confirmations.handle_comment(&event).await {
                        tracing::error!(
                            repo = %event.repo_name,
                            number = event.issue_number,
                            error = %e,
                            "comment handler failed"
                        );
                    }
                });
                StatusCode::ACCEPTED
            }
            Ok(payload) => {
                tracing::debug!(action = %payload.action, "ignoring issue_comment action");
                StatusCode::ACCEPTED
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed issue_comment payload");
                StatusCode::BAD_REQUEST
            }
        },
        other => {
            tracing::debug!(event = %other, "ignoring webhook event");
            StatusCode::ACCEPTED
        }
    }
}

// -- Webhook payload shapes (the subset of GitHub's delivery we read) --

#[derive(Debug, Deserialize)]
struct IssuesPayload {
    action: String,
    issue: PayloadIssue,
    repository: PayloadRepository,
}

impl IssuesPayload {
    fn into_event(self) -> IssueOpened {
        IssueOpened {
            id: self.issue.id,
            repo_name: self.repository.full_name,
            number: self.issue.number,
            title: self.issue.title,
            body: self.issue.body.unwrap_or_default(),
            author: self.issue.user.login,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    action: String,
    issue: PayloadIssueRef,
    comment: PayloadComment,
    repository: PayloadRepository,
}

impl CommentPayload {
    fn into_event(self) -> CommentCreated {
        CommentCreated {
            repo_name: self.repository.full_name,
            issue_number: self.issue.number,
            body: self.comment.body.unwrap_or_default(),
            commenter: self.comment.user.login,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PayloadIssue {
    id: u64,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: PayloadUser,
}

#[derive(Debug, Deserialize)]
struct PayloadIssueRef {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct PayloadComment {
    #[serde(default)]
    body: Option<String>,
    user: PayloadUser,
}

#[derive(Debug, Deserialize)]
struct PayloadUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PayloadRepository {
    full_name: String,
}
