//! Misskey API surface. Lookups go through `users/show` without auth; notes are
//! created by passing the API key in the request body as `i`.
pub mod client;
pub mod types;

pub use client::MisskeyApi;
