use async_trait::async_trait;
use crosspost_common::{CrosspostError, NetworkKind, PostReceipt, ProfileSummary, Result, Session};

/// What a user typed into the registration form.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub kind: NetworkKind,
    pub instance: String,
    pub username: String,
    pub key: String,
}

impl Registration {
    pub fn new(
        kind: NetworkKind,
        instance: impl Into<String>,
        username: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            instance: instance.into().trim().to_string(),
            username: username.into().trim().trim_start_matches('@').to_string(),
            key: key.into().trim().to_string(),
        }
    }

    /// Reject input the selected network cannot work with, before any request goes out.
    pub fn validate(&self) -> Result<()> {
        if self.instance.is_empty() {
            return Err(CrosspostError::InvalidInput("instance host is required".into()));
        }
        match self.kind {
            NetworkKind::Mastodon if self.key.is_empty() => Err(CrosspostError::InvalidInput(
                "Mastodon accounts need an access token".into(),
            )),
            NetworkKind::Misskey if self.username.is_empty() => Err(
                CrosspostError::InvalidInput("Misskey accounts need a username".into()),
            ),
            NetworkKind::Misskey if self.key.is_empty() => Err(CrosspostError::InvalidInput(
                "Misskey accounts need an API key".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// The capabilities every supported network offers, bound to one instance.
#[async_trait]
pub trait SocialNetwork: Send + Sync {
    fn kind(&self) -> NetworkKind;

    /// Confirm the account exists and build the session to persist.
    async fn register(&self, registration: &Registration) -> Result<Session>;

    /// Look up the display data for a stored session.
    async fn fetch_profile(&self, session: &Session) -> Result<ProfileSummary>;

    /// Create a public post with `text`.
    async fn publish(&self, session: &Session, text: &str) -> Result<PostReceipt>;
}

pub(crate) fn require<'a>(
    session: &'a Session,
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CrosspostError::MissingField {
            kind: session.kind,
            instance: session.instance.clone(),
            field,
        })
}
