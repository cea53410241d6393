//! Domain errors for the EchoFinder system.

use thiserror::Error;

/// Domain-level errors that can occur in the EchoFinder system.
///
/// Authorization mismatches, missing or malformed pairing tokens, and
/// token/issue protocol violations are deliberately NOT errors: they are
/// normal control-flow outcomes of parsing untrusted comment history and
/// are handled with `Option` and early returns.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Tracker error: {0}")]
    Tracker(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
