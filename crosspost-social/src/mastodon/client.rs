//! Thin wrapper around the Mastodon endpoints crosspost needs.
use crate::http_to_crosspost;
use crate::instance::instance_base_url;
use crate::mastodon::types::{Account, Status, StatusRequest, Visibility};
use crate::network::{Registration, SocialNetwork, require};
use async_trait::async_trait;
use crosspost_common::{
    CrosspostError, NetworkKind, PostReceipt, ProfileSummary, Result, Session,
};
use crosspost_http::{HttpClient, RequestOpts};
use std::time::Duration;

const VERIFY_CREDENTIALS: &str = "api/v1/accounts/verify_credentials";
const STATUSES: &str = "api/v1/statuses";

#[derive(Clone)]
pub struct MastodonApi {
    http: HttpClient,
    instance: String,
}

impl MastodonApi {
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

    /// `GET /api/v1/accounts/verify_credentials`: who owns this token.
    pub async fn verify_credentials(&self, token: &str) -> Result<Account> {
        self.http
            .get_json(VERIFY_CREDENTIALS, RequestOpts::bearer(token))
            .await
            .map_err(|e| http_to_crosspost(&self.instance, e))
    }

    /// `GET /api/v1/accounts/{id}`.
    pub async fn account(&self, id: &str, token: &str) -> Result<Account> {
        if id.contains(['/', '?', '#']) {
            return Err(CrosspostError::InvalidInput(format!(
                "`{id}` is not a Mastodon account id"
            )));
        }
        self.http
            .get_json(&format!("api/v1/accounts/{id}"), RequestOpts::bearer(token))
            .await
            .map_err(|e| http_to_crosspost(&self.instance, e))
    }

    /// `POST /api/v1/statuses` with public visibility.
    pub async fn create_status(&self, token: &str, text: &str) -> Result<Status> {
        let body = StatusRequest {
            status: text,
            visibility: Visibility::Public,
        };
        self.http
            .post_json(STATUSES, &body, RequestOpts::bearer(token))
            .await
            .map_err(|e| http_to_crosspost(&self.instance, e))
    }
}

#[async_trait]
impl SocialNetwork for MastodonApi {
    fn kind(&self) -> NetworkKind {
        NetworkKind::Mastodon
    }

    async fn register(&self, registration: &Registration) -> Result<Session> {
        // The token decides the account; a typed username is ignored.
        let account = self.verify_credentials(&registration.key).await?;
        tracing::debug!(
            instance = %registration.instance,
            username = %account.username,
            id = %account.id,
            "mastodon.verify_credentials.ok"
        );
        Ok(Session {
            kind: NetworkKind::Mastodon,
            instance: registration.instance.clone(),
            username: Some(account.username),
            key: registration.key.clone(),
            id: Some(account.id),
        })
    }

    async fn fetch_profile(&self, session: &Session) -> Result<ProfileSummary> {
        let id = require(session, &session.id, "account id")?;
        let account = self.account(id, &session.key).await?;
        Ok(ProfileSummary {
            instance: session.instance.clone(),
            username: account.username,
            avatar_url: account.avatar,
        })
    }

    async fn publish(&self, session: &Session, text: &str) -> Result<PostReceipt> {
        let status = self.create_status(&session.key, text).await?;
        Ok(PostReceipt {
            id: status.id,
            url: status.url.or(status.uri),
        })
    }
}
