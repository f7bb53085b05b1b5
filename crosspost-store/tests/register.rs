use crosspost_common::{CrosspostError, NetworkKind, Session};
use crosspost_social::{Gateway, Registration};
use crosspost_store::{FileStorage, KeyValueStorage, SESSION_KEY, SessionStore};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn instance_with_accounts() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/verify_credentials"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "1", "username": "alice"})),
        )
        .mount(&server)
        .await;
    for (name, id) in [("bob", "b1"), ("carol", "c1")] {
        Mock::given(method("POST"))
            .and(path("/api/users/show"))
            .and(body_json(json!({"username": name})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": id, "username": name})),
            )
            .mount(&server)
            .await;
    }
    server
}

#[tokio::test]
async fn registered_sessions_persist_in_registration_order() {
    let server = instance_with_accounts().await;
    let dir = tempfile::tempdir().unwrap();
    let gateway = Gateway::new(Duration::from_secs(5));

    let mut store = SessionStore::open(FileStorage::new(dir.path())).unwrap();
    let regs = [
        Registration::new(NetworkKind::Misskey, server.uri(), "bob", "kb"),
        Registration::new(NetworkKind::Mastodon, server.uri(), "", "tok"),
        Registration::new(NetworkKind::Misskey, server.uri(), "carol", "kc"),
    ];
    for reg in &regs {
        store.register(&gateway, reg).await.unwrap();
    }

    let raw = FileStorage::new(dir.path())
        .get(SESSION_KEY)
        .unwrap()
        .expect("session key written");
    let persisted: Vec<Session> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted.len(), 3);
    assert_eq!(persisted, store.sessions());

    let summary: Vec<_> = persisted
        .iter()
        .map(|s| (s.kind, s.username.as_deref().unwrap(), s.id.as_deref().unwrap()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (NetworkKind::Misskey, "bob", "b1"),
            (NetworkKind::Mastodon, "alice", "1"),
            (NetworkKind::Misskey, "carol", "c1"),
        ]
    );

    // A fresh process sees exactly the same list.
    let reopened = SessionStore::open(FileStorage::new(dir.path())).unwrap();
    assert_eq!(reopened.sessions(), persisted.as_slice());
}

#[tokio::test]
async fn failed_registration_records_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/show"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No such user.", "code": "NO_SUCH_USER"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let gateway = Gateway::new(Duration::from_secs(5));
    let mut store = SessionStore::open(FileStorage::new(dir.path())).unwrap();

    let reg = Registration::new(NetworkKind::Misskey, server.uri(), "ghost", "k");
    let err = store.register(&gateway, &reg).await.unwrap_err();

    assert!(matches!(err, CrosspostError::Api { status: 404, .. }));
    assert!(store.sessions().is_empty());
    assert_eq!(FileStorage::new(dir.path()).get(SESSION_KEY).unwrap(), None);
}

#[test]
fn loading_without_prior_state_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let sessions = SessionStore::load_persisted(&FileStorage::new(dir.path())).unwrap();
    assert!(sessions.is_empty());
    assert!(!dir.path().join("session.json").exists());
}
