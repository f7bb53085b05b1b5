//! Thin wrapper around the Misskey endpoints crosspost needs.
use crate::http_to_crosspost;
use crate::instance::instance_base_url;
use crate::misskey::types::{Note, NoteCreateRequest, NoteCreateResponse, User, UserShowRequest};
use crate::network::{Registration, SocialNetwork, require};
use async_trait::async_trait;
use crosspost_common::{
    CrosspostError, NetworkKind, PostReceipt, ProfileSummary, Result, Session,
};
use crosspost_http::{HttpClient, RequestOpts};
use std::time::Duration;

const USERS_SHOW: &str = "api/users/show";
const NOTES_CREATE: &str = "api/notes/create";

#[derive(Clone)]
pub struct MisskeyApi {
    http: HttpClient,
    instance: String,
}

impl MisskeyApi {
    pub fn new(instance: &str, timeout: Duration) -> Result<Self> {
        let base = instance_base_url(instance)?;
        let http = HttpClient::new(base.as_str())
            .map_err(|e| CrosspostError::Http(e.to_string()))?
            .with_timeout(timeout);
        Ok(Self {
            http,
            instance: instance.trim().to_string(),
        })
    }

    /// `POST /api/users/show` by username. No credentials are sent.
    pub async fn user_by_username(&self, username: &str) -> Result<User> {
        self.http
            .post_json(USERS_SHOW, &UserShowRequest { username }, RequestOpts::default())
            .await
            .map_err(|e| http_to_crosspost(&self.instance, e))
    }

    /// `POST /api/notes/create`, authenticating with `i` in the body.
    pub async fn create_note(&self, key: &str, text: &str) -> Result<Note> {
        let body = NoteCreateRequest {
            i: key,
            text,
            via_mobile: false,
        };
        let resp: NoteCreateResponse = self
            .http
            .post_json(NOTES_CREATE, &body, RequestOpts::default())
            .await
            .map_err(|e| http_to_crosspost(&self.instance, e))?;
        Ok(resp.created_note)
    }

    fn note_url(&self, id: &str) -> Option<String> {
        self.http
            .base()
            .join(&format!("notes/{id}"))
            .ok()
            .map(String::from)
    }
}

#[async_trait]
impl SocialNetwork for MisskeyApi {
    fn kind(&self) -> NetworkKind {
        NetworkKind::Misskey
    }

    async fn register(&self, registration: &Registration) -> Result<Session> {
        let user = self.user_by_username(&registration.username).await?;
        tracing::debug!(
            instance = %registration.instance,
            username = %registration.username,
            id = %user.id,
            "misskey.users_show.ok"
        );
        // The caller's spelling of the username is what gets stored.
        Ok(Session {
            kind: NetworkKind::Misskey,
            instance: registration.instance.clone(),
            username: Some(registration.username.clone()),
            key: registration.key.clone(),
            id: Some(user.id),
        })
    }

    async fn fetch_profile(&self, session: &Session) -> Result<ProfileSummary> {
        let username = require(session, &session.username, "username")?;
        let user = self.user_by_username(username).await?;
        Ok(ProfileSummary {
            instance: session.instance.clone(),
            username: user.name.filter(|n| !n.is_empty()).unwrap_or(user.username),
            avatar_url: user.avatar_url,
        })
    }

    async fn publish(&self, session: &Session, text: &str) -> Result<PostReceipt> {
        let note = self.create_note(&session.key, text).await?;
        Ok(PostReceipt {
            url: self.note_url(&note.id),
            id: note.id,
        })
    }
}
