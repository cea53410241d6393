//! Merge-command parsing and per-side confirmation derivation.
//!
//! Commands are free text posted by humans. A comment qualifies when its
//! leading token — after trimming, with an optional `/` prefix,
//! case-insensitively — is one of `merge`, `accept`, `reject`, `cancel`.
//! Anything else is not a command and is ignored.
//!
//! Confirmation is never stored. It is recomputed from the full comment
//! history on every relevant event, which makes the protocol naturally
//! idempotent under replayed and out-of-order webhook deliveries.

use super::issue::IssueComment;

/// A recognised merge-protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeCommand {
    /// `merge` or `accept`.
    Accept,
    /// `reject` or `cancel`.
    Reject,
}

/// Parse the leading token of a comment body into a command.
///
/// Word-boundary semantics: `merge!` and `/merge please` qualify,
/// `merged` and `merge2` do not.
pub fn parse_command(body: &str) -> Option<MergeCommand> {
    let trimmed = body.trim();
    let token = trimmed.split_whitespace().next()?;
    let token = token.strip_prefix('/').unwrap_or(token);

    let word_len = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (word, rest) = token.split_at(word_len);

    // A digit or letter right after the keyword means a longer word,
    // not a command.
    if rest.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    match word.to_ascii_lowercase().as_str() {
        "merge" | "accept" => Some(MergeCommand::Accept),
        "reject" | "cancel" => Some(MergeCommand::Reject),
        _ => None,
    }
}

/// Derived state of one side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideState {
    Unconfirmed,
    Confirmed,
    Rejected,
}

impl SideState {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SideState::Confirmed)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SideState::Rejected)
    }
}

/// Derive one side's state from its full comment history.
///
/// Only commands from the issue's own author count; everyone else —
/// including the other party — cannot force a transition. Rejection is
/// final: any reject from the author wins over any accept, regardless of
/// ordering.
pub fn derive_side_state(comments: &[IssueComment], author: &str) -> SideState {
    let mut confirmed = false;
    for comment in comments {
        if comment.author != author {
            continue;
        }
        match parse_command(&comment.body) {
            Some(MergeCommand::Reject) => return SideState::Rejected,
            Some(MergeCommand::Accept) => confirmed = true,
            None => {}
        }
    }
    if confirmed {
        SideState::Confirmed
    } else {
        SideState::Unconfirmed
    }
}
