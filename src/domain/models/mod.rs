//! Domain models.

pub mod command;
pub mod config;
pub mod event;
pub mod issue;
pub mod pairing;

pub use command::{derive_side_state, parse_command, MergeCommand, SideState};
pub use config::{
    Config, DatabaseConfig, EmbeddingConfig, LoggingConfig, MatcherConfig, ServerConfig,
    SynthesisConfig, TrackerConfig,
};
pub use event::{CommentCreated, IssueOpened};
pub use issue::{IssueComment, IssueRecord, MergeState, SimilarIssue};
pub use pairing::{IssueRef, PairSide, PairingToken, PAIR_MARKER};
