//! Common types and utilities shared across crosspost crates.
//!
//! This crate defines the account/session data model, the shared error type, and the
//! observability helpers every binary uses. It stays dependency-light so the HTTP,
//! gateway, store, and UI crates can all depend on it.
//!
//! # Overview
//!
//! - [`model`]: [`NetworkKind`], [`Session`], [`ProfileSummary`], [`PostReceipt`]
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`CrosspostError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use crosspost_common::{NetworkKind, Session};
//!
//! let session = Session::new(NetworkKind::Misskey, "misskey.io", Some("alice"), "secret", None);
//! assert_eq!(session.kind, NetworkKind::Misskey);
//! assert!(!format!("{session:?}").contains("secret"));
//! ```
pub mod model;
pub mod observability;

pub use model::{NetworkKind, PostReceipt, ProfileSummary, Session};

/// Error types used across the crosspost workspace.
#[derive(thiserror::Error, Debug)]
pub enum CrosspostError {
    /// The request never produced a usable HTTP response (DNS, TLS, timeout, bad URL).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The instance answered with a non-success status.
    #[error("{instance} returned {status}: {message}")]
    Api {
        instance: String,
        status: u16,
        message: String,
    },

    /// A stored session lacks a field its network kind needs for this call.
    #[error("{kind} account on {instance} has no {field}")]
    MissingField {
        kind: NetworkKind,
        instance: String,
        field: &'static str,
    },

    /// Caller-supplied input was rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persisted session data exists but cannot be parsed.
    #[error("Persisted sessions are malformed: {0}")]
    CorruptState(String),

    /// Reading or writing the backing storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`CrosspostError`].
pub type Result<T> = std::result::Result<T, CrosspostError>;
