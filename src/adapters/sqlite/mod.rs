//! SQLite adapters.

pub mod connection;
pub mod issue_store;

pub use connection::{create_pool, create_test_pool, ConnectionError};
pub use issue_store::SqliteIssueStore;
