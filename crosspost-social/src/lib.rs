//! Network gateway: per-kind API clients and the fan-out operations built on them.
//!
//! Each supported network has a client module translating the generic actions
//! (register, fetch profile, publish) into that network's request shapes. The
//! [`Gateway`] picks a client by matching on [`NetworkKind`] and runs the
//! multi-account operations, returning one explicit result per account.
//!
//! [`NetworkKind`]: crosspost_common::NetworkKind
pub mod gateway;
pub mod instance;
pub mod mastodon;
pub mod misskey;
pub mod network;

pub use gateway::{BroadcastReport, Gateway, PostOutcome, ProfileOutcome};
pub use network::{Registration, SocialNetwork};

use crosspost_common::CrosspostError;
use crosspost_http::HttpError;

/// Fold an HTTP failure into the shared error type, tagging it with the instance.
pub(crate) fn http_to_crosspost(instance: &str, e: HttpError) -> CrosspostError {
    match e {
        HttpError::Api {
            status, message, ..
        } => CrosspostError::Api {
            instance: instance.to_string(),
            status: status.as_u16(),
            message,
        },
        other => CrosspostError::Http(format!("{instance}: {other}")),
    }
}
