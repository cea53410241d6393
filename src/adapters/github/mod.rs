//! GitHub adapter: REST client, API models, and tracker port impl.

pub mod client;
pub mod models;
pub mod tracker;

pub use client::GitHubClient;
pub use tracker::GitHubTracker;
