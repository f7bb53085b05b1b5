use crate::storage::KeyValueStorage;
use crosspost_common::{CrosspostError, Result, Session};
use crosspost_social::{Gateway, Registration};

/// The one key the whole session list is stored under.
pub const SESSION_KEY: &str = "session";

/// Ordered registered accounts, mirrored to a [`KeyValueStorage`].
pub struct SessionStore<S> {
    storage: S,
    sessions: Vec<Session>,
}

impl<S: KeyValueStorage> SessionStore<S> {
    /// Read persisted sessions without holding on to them.
    ///
    /// An absent key means no accounts yet. Content that is present but not a
    /// JSON array of sessions is reported, never silently dropped.
    pub fn load_persisted(storage: &S) -> Result<Vec<Session>> {
        let Some(raw) = storage.get(SESSION_KEY)? else {
            tracing::debug!("store.load.empty");
            return Ok(Vec::new());
        };
        let sessions: Vec<Session> = serde_json::from_str(&raw)
            .map_err(|e| CrosspostError::CorruptState(e.to_string()))?;
        tracing::debug!(count = sessions.len(), "store.load.ok");
        Ok(sessions)
    }

    pub fn open(storage: S) -> Result<Self> {
        let sessions = Self::load_persisted(&storage)?;
        Ok(Self { storage, sessions })
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Confirm the account with its instance, then append and persist it.
    ///
    /// Duplicates are kept. On any failure the store is left as it was.
    pub async fn register(
        &mut self,
        gateway: &Gateway,
        registration: &Registration,
    ) -> Result<Session> {
        let session = gateway.register(registration).await?;
        self.append(session.clone())?;
        Ok(session)
    }

    /// Append an already-verified session and persist the whole list.
    pub fn append(&mut self, session: Session) -> Result<()> {
        self.sessions.push(session);
        if let Err(e) = self.persist() {
            self.sessions.pop();
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.sessions)
            .map_err(|e| CrosspostError::Storage(format!("serialize sessions: {e}")))?;
        self.storage.set(SESSION_KEY, &json)?;
        tracing::info!(count = self.sessions.len(), "store.persist.ok");
        Ok(())
    }
}
