//! Comment bodies posted by the bot.
//!
//! Every template that announces or advances a pair embeds the pairing
//! token marker so later comment events can rediscover the pair from
//! either side. Keep the marker on its own line at the end of the body.

use crate::domain::models::{IssueRef, PairingToken};
use crate::domain::ports::CreatedIssue;

fn similarity_pct(score: f32) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Posted on the newly opened issue when a candidate duplicate is found.
pub fn duplicate_found(orig: &IssueRef, orig_title: &str, score: f32, token: &PairingToken) -> String {
    format!(
        "🔍 **Potential Duplicate Found**\n\n\
         This issue is very similar to **{orig}**: \"{orig_title}\"\n\n\
         📊 **Similarity Score:** {pct}\n\n\
         Please review if this is a duplicate. If confirmed, you can close this issue.\n\n\
         To merge these two issues, BOTH issue authors must comment on *their own issue* \
         with `/merge` (accept) or `/reject` (decline). Once both confirmations are present \
         the bot will synthesize a merged issue.\n\n\
         {marker}",
        pct = similarity_pct(score),
        marker = token.encode(),
    )
}

/// Posted on the pre-existing issue so confirmations there are detected.
pub fn duplicate_notice(new: &IssueRef, new_title: &str, score: f32, token: &PairingToken) -> String {
    format!(
        "🔔 Note: A new issue ({new}) was opened that appears to be a possible duplicate \
         of this issue.\n\n\
         **New issue title:** \"{new_title}\"\n\
         📊 **Similarity:** {pct}\n\n\
         To merge these issues, BOTH issue authors must comment on *their own issue* \
         with `/merge` (accept) or `/reject` (decline). Once both confirmations are present \
         the bot will synthesize a merged issue.\n\n\
         {marker}",
        pct = similarity_pct(score),
        marker = token.encode(),
    )
}

/// Acknowledgment on the issue whose author just confirmed.
pub fn waiting_ack() -> String {
    "⏳ **Confirmation Received**: You have voted to merge.\n\n\
     Waiting for the other issue author to confirm by commenting `/merge` on their issue."
        .to_string()
}

/// Nudge on the opposite issue after one side confirmed.
pub fn confirm_nudge(confirmed: &IssueRef) -> String {
    format!(
        "🔔 The author of {confirmed} has confirmed the merge.\n\n\
         Please comment `/merge` on this issue to accept and trigger the synthesis, \
         or `/reject` to decline."
    )
}

/// Posted on both issues when either author rejects.
pub fn rejection_notice(commenter: &str) -> String {
    format!(
        "🚫 Merge cancelled: @{commenter} declined merging these issues.\n\n\
         This decision is final for this pair."
    )
}

/// Body of the synthesized merged issue: the generated text plus a
/// provenance footer referencing both sources.
pub fn merged_issue_body(generated_body: &str, token: &PairingToken) -> String {
    format!(
        "{generated_body}\n\n---\n\
         *This issue was automatically synthesized from {orig} and {new}.*",
        orig = token.orig,
        new = token.new,
    )
}

/// Posted on each original issue when it is closed in favor of the
/// merged one.
pub fn merged_close_comment(created: &CreatedIssue) -> String {
    format!(
        "✅ **Merged into #{number}**\n\n\
         This issue has been closed. A new, comprehensive issue has been created by \
         merging this with another duplicate.\n\
         👉 **Go to {url}** for the consolidated discussion.",
        number = created.number,
        url = created.html_url,
    )
}

/// Posted on the `orig` issue when synthesis fails. `cache_marker`
/// carries an already-generated result forward so a retry can reuse it
/// instead of calling the generation service again.
pub fn merge_failure_notice(reason: &str, cache_marker: Option<&str>) -> String {
    let mut body = format!(
        "❌ **Merge Failed**: {reason}\n\n\
         Both confirmations remain valid; comment `/merge` again to retry."
    );
    if let Some(marker) = cache_marker {
        body.push_str("\n\n");
        body.push_str(marker);
    }
    body
}
