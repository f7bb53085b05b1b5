//! Mastodon REST API surface: credential verification, account lookup by id,
//! and status creation. Every call authenticates with the session's bearer token.
pub mod client;
pub mod types;

pub use client::MastodonApi;
