//! Account and profile data shared by the store, the gateway, and the UIs.
//!
//! The serialized shape of [`Session`] is the on-disk format: a JSON array of
//! `{type, instance, username, key, id}` objects under a single storage key.
use crate::CrosspostError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported social networks. Each kind has its own request/response shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkKind {
    Mastodon,
    Misskey,
}

impl NetworkKind {
    pub const ALL: [NetworkKind; 2] = [NetworkKind::Mastodon, NetworkKind::Misskey];

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkKind::Mastodon => "Mastodon",
            NetworkKind::Misskey => "Misskey",
        }
    }

    /// The kind after this one, wrapping around. Used by selector widgets.
    pub fn next(self) -> Self {
        match self {
            NetworkKind::Mastodon => NetworkKind::Misskey,
            NetworkKind::Misskey => NetworkKind::Mastodon,
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkKind {
    type Err = CrosspostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mastodon" => Ok(NetworkKind::Mastodon),
            "misskey" => Ok(NetworkKind::Misskey),
            other => Err(CrosspostError::InvalidInput(format!(
                "unknown network kind `{other}` (expected mastodon or misskey)"
            ))),
        }
    }
}

/// A registered account: where it lives and the credential used to act on it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub kind: NetworkKind,
    pub instance: String,
    /// Canonical username. Mastodon fills it from verify_credentials.
    #[serde(default)]
    pub username: Option<String>,
    /// Bearer token (Mastodon) or `i` API key (Misskey).
    pub key: String,
    /// Network-assigned account id.
    #[serde(default)]
    pub id: Option<String>,
}

impl Session {
    pub fn new(
        kind: NetworkKind,
        instance: impl Into<String>,
        username: Option<&str>,
        key: impl Into<String>,
        id: Option<&str>,
    ) -> Self {
        Self {
            kind,
            instance: instance.into(),
            username: username.map(str::to_string),
            key: key.into(),
            id: id.map(str::to_string),
        }
    }

    /// `username@instance`, or just the instance when no username is known.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(name) => format!("{name}@{}", self.instance),
            None => self.instance.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .field("id", &self.id)
            .finish()
    }
}

/// Display data fetched fresh for a session. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub instance: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// What an instance handed back after a post was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    pub id: String,
    pub url: Option<String>,
}
