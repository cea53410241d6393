//! Pairing token codec.
//!
//! A pairing token links two issues as a candidate duplicate pair. It is
//! embedded verbatim inside an HTML comment in the bot's own comments on
//! *both* issues, so either side can rediscover the pairing by scanning
//! its comment history. The marker renders invisibly in GitHub-flavoured
//! Markdown and survives quoting and editing around it.
//!
//! Wire format (single line):
//!
//! ```text
//! <!-- ECHOFINDER_PAIR:orig=<repo>#<number>;new=<repo>#<number> -->
//! ```
//!
//! Both repository fields are always explicit; a same-repository pair
//! simply carries the same repo on both sides.

use std::fmt;

/// Marker prefix scanned for inside comment bodies.
pub const PAIR_MARKER: &str = "ECHOFINDER_PAIR:";

/// One side of a pair: a repository (`owner/repo`) plus issue number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueRef {
    pub repo: String,
    pub number: u64,
}

impl IssueRef {
    pub fn new(repo: impl Into<String>, number: u64) -> Self {
        Self {
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// An immutable candidate duplicate pair: the pre-existing issue (`orig`)
/// and the newly opened one (`new`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingToken {
    pub orig: IssueRef,
    pub new: IssueRef,
}

impl PairingToken {
    pub fn new(orig: IssueRef, new: IssueRef) -> Self {
        Self { orig, new }
    }

    /// Canonical identity of the pair, used to key the synthesis guard
    /// and the synthesis cache marker.
    pub fn identity(&self) -> String {
        format!("orig={};new={}", self.orig, self.new)
    }

    /// Render the full hidden marker for embedding in a comment body.
    pub fn encode(&self) -> String {
        format!("<!-- {}{} -->", PAIR_MARKER, self.identity())
    }

    /// Scan arbitrary text for an embedded marker and decode it.
    ///
    /// Tolerates surrounding prose and Markdown; a malformed marker
    /// yields `None`, never an error — "no token found" is a normal
    /// outcome for callers.
    pub fn find_in(text: &str) -> Option<Self> {
        let start = text.find(PAIR_MARKER)?;
        let rest = &text[start + PAIR_MARKER.len()..];

        let rest = rest.strip_prefix("orig=")?;
        let (orig, rest) = parse_ref(rest)?;
        let rest = rest.strip_prefix(';')?;
        let rest = rest.strip_prefix("new=")?;
        let (new, _) = parse_ref(rest)?;

        Some(Self { orig, new })
    }

    /// Which side of the pair the given issue occupies, if any.
    pub fn side_of(&self, repo: &str, number: u64) -> Option<PairSide> {
        if self.orig.repo == repo && self.orig.number == number {
            Some(PairSide::Orig)
        } else if self.new.repo == repo && self.new.number == number {
            Some(PairSide::New)
        } else {
            None
        }
    }

    /// The opposite side's reference.
    pub fn other(&self, side: PairSide) -> &IssueRef {
        match side {
            PairSide::Orig => &self.new,
            PairSide::New => &self.orig,
        }
    }

    /// This side's reference.
    pub fn own(&self, side: PairSide) -> &IssueRef {
        match side {
            PairSide::Orig => &self.orig,
            PairSide::New => &self.new,
        }
    }
}

/// Which end of a pairing token an issue occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Orig,
    New,
}

/// Parse `<repo>#<number>` from the front of `input`, returning the
/// reference and the unconsumed remainder.
fn parse_ref(input: &str) -> Option<(IssueRef, &str)> {
    let hash = input.find('#')?;
    let repo = &input[..hash];
    if repo.is_empty() || repo.chars().any(|c| c.is_whitespace() || c == ';') {
        return None;
    }

    let after_hash = &input[hash + 1..];
    let digits_end = after_hash
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_hash.len());
    if digits_end == 0 {
        return None;
    }
    let number: u64 = after_hash[..digits_end].parse().ok()?;

    // The number must be delimited: end of input, the field separator,
    // or the closing of the HTML comment. A trailing word character
    // means we are looking at something else entirely.
    let remainder = &after_hash[digits_end..];
    match remainder.chars().next() {
        None => {}
        Some(c) if c == ';' || c.is_whitespace() || c == '-' => {}
        Some(_) => return None,
    }

    Some((IssueRef::new(repo, number), remainder))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(orig_repo: &str, orig_n: u64, new_repo: &str, new_n: u64) -> PairingToken {
        PairingToken::new(IssueRef::new(orig_repo, orig_n), IssueRef::new(new_repo, new_n))
    }

    #[test]
    fn test_encode_wire_format() {
        let t = token("acme/widgets", 12, "acme/widgets", 47);
        assert_eq!(
            t.encode(),
            "<!-- ECHOFINDER_PAIR:orig=acme/widgets#12;new=acme/widgets#47 -->"
        );
    }

    #[test]
    fn test_round_trip_exact() {
        let cases = [
            token("acme/widgets", 12, "acme/widgets", 47),
            token("my-org/some.repo", 1, "my-org/other_repo", 99),
            token("a-b/c.d_e", 123_456, "x.y/z-w", 7),
        ];
        for t in cases {
            let decoded = PairingToken::find_in(&t.encode()).expect("decode");
            assert_eq!(decoded, t);
        }
    }

    #[test]
    fn test_decode_embedded_in_prose() {
        let body = format!(
            "🔍 **Potential Duplicate Found**\n\nPlease review.\n\n{}\nthanks",
            token("acme/widgets", 12, "acme/widgets", 47).encode()
        );
        let decoded = PairingToken::find_in(&body).unwrap();
        assert_eq!(decoded.orig.number, 12);
        assert_eq!(decoded.new.number, 47);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let bad = [
            "no marker at all",
            "<!-- ECHOFINDER_PAIR: -->",
            "<!-- ECHOFINDER_PAIR:orig=repo-without-number;new=a/b#2 -->",
            "<!-- ECHOFINDER_PAIR:orig=a/b#;new=c/d#2 -->",
            "<!-- ECHOFINDER_PAIR:orig=#1;new=c/d#2 -->",
            "<!-- ECHOFINDER_PAIR:orig=a/b#1x;new=c/d#2 -->",
            "<!-- ECHOFINDER_PAIR:orig=a/b#1 -->",
            "<!-- ECHOFINDER_PAIR:new=a/b#1;orig=c/d#2 -->",
        ];
        for text in bad {
            assert!(PairingToken::find_in(text).is_none(), "accepted: {text}");
        }
    }

    #[test]
    fn test_side_resolution() {
        let t = token("acme/widgets", 12, "acme/gadgets", 47);
        assert_eq!(t.side_of("acme/widgets", 12), Some(PairSide::Orig));
        assert_eq!(t.side_of("acme/gadgets", 47), Some(PairSide::New));
        assert_eq!(t.side_of("acme/widgets", 47), None);
        assert_eq!(t.side_of("other/repo", 12), None);

        assert_eq!(t.other(PairSide::Orig).number, 47);
        assert_eq!(t.own(PairSide::New).number, 47);
    }

    #[test]
    fn test_same_repo_pair_carries_both_fields() {
        let t = token("acme/widgets", 3, "acme/widgets", 9);
        let decoded = PairingToken::find_in(&t.encode()).unwrap();
        assert_eq!(decoded.orig.repo, decoded.new.repo);
    }
}
