//! Multi-account operations over the per-kind clients.
//!
//! Every operation reports per-account results; nothing is retried and one
//! account's failure never stops the others.
use crate::mastodon::MastodonApi;
use crate::misskey::MisskeyApi;
use crate::network::{Registration, SocialNetwork};
use crosspost_common::{NetworkKind, PostReceipt, ProfileSummary, Result, Session};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of looking up one session's profile.
#[derive(Debug)]
pub struct ProfileOutcome {
    pub kind: NetworkKind,
    pub instance: String,
    pub result: Result<ProfileSummary>,
}

/// Result of posting to one session.
#[derive(Debug)]
pub struct PostOutcome {
    pub kind: NetworkKind,
    pub instance: String,
    pub username: Option<String>,
    pub result: Result<PostReceipt>,
}

impl PostOutcome {
    pub fn handle(&self) -> String {
        match &self.username {
            Some(name) => format!("{name}@{}", self.instance),
            None => self.instance.clone(),
        }
    }
}

/// Every per-account outcome of a broadcast, in session order.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub outcomes: Vec<PostOutcome>,
}

impl BroadcastReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &PostOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PostOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// True when there was at least one account and every post went through.
    pub fn is_complete_success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

#[derive(Debug, Clone)]
pub struct Gateway {
    timeout: Duration,
    profile_concurrency: usize,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Gateway {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            profile_concurrency: 1,
        }
    }

    /// Allow up to `n` profile lookups in flight. Output order never changes.
    pub fn with_profile_concurrency(mut self, n: usize) -> Self {
        self.profile_concurrency = n.max(1);
        self
    }

    /// Pick the client for a network kind, bound to one instance.
    pub fn client_for(&self, kind: NetworkKind, instance: &str) -> Result<Box<dyn SocialNetwork>> {
        Ok(match kind {
            NetworkKind::Mastodon => Box::new(MastodonApi::new(instance, self.timeout)?),
            NetworkKind::Misskey => Box::new(MisskeyApi::new(instance, self.timeout)?),
        })
    }

    /// Validate the form input and confirm the account with its home instance.
    pub async fn register(&self, registration: &Registration) -> Result<Session> {
        registration.validate()?;
        let client = self.client_for(registration.kind, &registration.instance)?;
        let session = client.register(registration).await.inspect_err(|e| {
            tracing::warn!(
                kind = %registration.kind,
                instance = %registration.instance,
                error = %e,
                "gateway.register.failed"
            );
        })?;
        tracing::info!(
            kind = %session.kind,
            instance = %session.instance,
            username = ?session.username,
            "gateway.register.ok"
        );
        Ok(session)
    }

    pub async fn fetch_profile(&self, session: &Session) -> Result<ProfileSummary> {
        self.client_for(session.kind, &session.instance)?
            .fetch_profile(session)
            .await
    }

    /// One outcome per session, in the order given.
    ///
    /// Each lookup owns its session, so the returned future can be spawned.
    pub async fn fetch_profiles(&self, sessions: &[Session]) -> Vec<ProfileOutcome> {
        stream::iter(sessions.to_vec())
            .map(|session| self.clone().profile_outcome(session))
            .buffered(self.profile_concurrency)
            .collect()
            .await
    }

    async fn profile_outcome(self, session: Session) -> ProfileOutcome {
        let result = self.fetch_profile(&session).await;
        if let Err(e) = &result {
            tracing::warn!(
                kind = %session.kind,
                instance = %session.instance,
                error = %e,
                "gateway.profile.failed"
            );
        }
        ProfileOutcome {
            kind: session.kind,
            instance: session.instance,
            result,
        }
    }

    pub async fn publish(&self, session: &Session, text: &str) -> Result<PostReceipt> {
        self.client_for(session.kind, &session.instance)?
            .publish(session, text)
            .await
    }

    /// Post `text` to every session at once and wait for all of them.
    pub async fn broadcast(&self, sessions: &[Session], text: &str) -> BroadcastReport {
        if sessions.is_empty() {
            tracing::info!("broadcast.no_sessions");
            return BroadcastReport::default();
        }
        tracing::info!(
            accounts = sessions.len(),
            chars = text.chars().count(),
            "broadcast.dispatch"
        );

        let text: Arc<str> = Arc::from(text);
        let outcomes = join_all(
            sessions
                .iter()
                .cloned()
                .map(|session| self.clone().post_outcome(session, text.clone())),
        )
        .await;

        let report = BroadcastReport { outcomes };
        tracing::info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "broadcast.done"
        );
        report
    }

    async fn post_outcome(self, session: Session, text: Arc<str>) -> PostOutcome {
        let result = self.publish(&session, &text).await;
        match &result {
            Ok(receipt) => tracing::info!(
                kind = %session.kind,
                instance = %session.instance,
                post_id = %receipt.id,
                url = ?receipt.url,
                "broadcast.post.ok"
            ),
            Err(e) => tracing::warn!(
                kind = %session.kind,
                instance = %session.instance,
                error = %e,
                "broadcast.post.failed"
            ),
        }
        PostOutcome {
            kind: session.kind,
            instance: session.instance,
            username: session.username,
            result,
        }
    }
}
