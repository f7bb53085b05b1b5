use crosspost_common::{CrosspostError, NetworkKind, Session};
use crosspost_social::{Gateway, Registration};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway() -> Gateway {
    Gateway::new(Duration::from_secs(5))
}

async fn assert_no_auth_header(server: &MockServer) {
    for req in server.received_requests().await.unwrap_or_default() {
        assert!(
            req.headers.get("authorization").is_none(),
            "unexpected Authorization header on {}",
            req.url
        );
    }
}

#[tokio::test]
async fn mastodon_registration_takes_identity_from_verify_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/verify_credentials"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "10987",
            "username": "alice",
            "acct": "alice",
            "avatar": "https://files.example/a.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reg = Registration::new(NetworkKind::Mastodon, server.uri(), "typed-name", "tok-1");
    let session = gateway().register(&reg).await.unwrap();

    assert_eq!(session.kind, NetworkKind::Mastodon);
    assert_eq!(session.username.as_deref(), Some("alice"));
    assert_eq!(session.id.as_deref(), Some("10987"));
    assert_eq!(session.key, "tok-1");
    assert_eq!(session.instance, server.uri());
}

#[tokio::test]
async fn misskey_registration_keeps_the_typed_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/show"))
        .and(body_json(json!({"username": "Bob"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "9f3k2",
            "username": "bob",
            "name": "Bobby",
            "avatarUrl": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reg = Registration::new(NetworkKind::Misskey, server.uri(), "Bob", "mk-key");
    let session = gateway().register(&reg).await.unwrap();

    assert_eq!(session.username.as_deref(), Some("Bob"));
    assert_eq!(session.id.as_deref(), Some("9f3k2"));
    assert_eq!(session.key, "mk-key");
    assert_no_auth_header(&server).await;
}

#[tokio::test]
async fn rejected_token_surfaces_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/verify_credentials"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "The access token is invalid"})),
        )
        .mount(&server)
        .await;

    let reg = Registration::new(NetworkKind::Mastodon, server.uri(), "", "bad");
    let err = gateway().register(&reg).await.unwrap_err();
    match err {
        CrosspostError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(message, "The access token is invalid");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_registration_sends_nothing() {
    let server = MockServer::start().await;
    let reg = Registration::new(NetworkKind::Misskey, server.uri(), "", "mk-key");
    let err = gateway().register(&reg).await.unwrap_err();
    assert!(matches!(err, CrosspostError::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn broadcast_posts_once_per_session_with_kind_specific_bodies() {
    let mastodon = MockServer::start().await;
    let misskey = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/statuses"))
        .and(header("authorization", "Bearer m-tok"))
        .and(body_json(json!({"status": "hello", "visibility": "public"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "111",
            "url": "https://m.example/@alice/111"
        })))
        .expect(1)
        .mount(&mastodon)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/notes/create"))
        .and(body_json(json!({"i": "mk-key", "text": "hello", "viaMobile": false})))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({
                "error": {"message": "Internal error occurred.", "code": "INTERNAL_ERROR"}
            })),
        )
        .expect(1)
        .mount(&misskey)
        .await;

    let sessions = vec![
        Session::new(NetworkKind::Mastodon, mastodon.uri(), Some("alice"), "m-tok", Some("1")),
        Session::new(NetworkKind::Misskey, misskey.uri(), Some("bob"), "mk-key", Some("9f")),
    ];

    let report = gateway().broadcast(&sessions, "hello").await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].kind, NetworkKind::Mastodon);
    let receipt = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(receipt.id, "111");
    assert_eq!(receipt.url.as_deref(), Some("https://m.example/@alice/111"));

    assert_eq!(report.outcomes[1].kind, NetworkKind::Misskey);
    assert!(matches!(
        report.outcomes[1].result,
        Err(CrosspostError::Api { status: 500, .. })
    ));
    assert_eq!(report.succeeded().count(), 1);
    assert_eq!(report.failed().count(), 1);
    assert!(!report.is_complete_success());
    assert_no_auth_header(&misskey).await;
}

#[tokio::test]
async fn broadcast_reports_unreachable_instances() {
    // Nothing listens on port 9 of the loopback interface.
    let sessions = vec![
        Session::new(NetworkKind::Mastodon, "http://127.0.0.1:9", Some("a"), "t", Some("1")),
        Session::new(NetworkKind::Misskey, "http://127.0.0.1:9", Some("b"), "k", None),
    ];
    let report = gateway().broadcast(&sessions, "hello").await;
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failed().count(), 2);
    assert!(report
        .failed()
        .all(|o| matches!(o.result, Err(CrosspostError::Http(_)))));
}

#[tokio::test]
async fn misskey_receipt_links_to_the_note() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notes/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "createdNote": {"id": "9xyz", "createdAt": "2024-01-01T00:00:00.000Z", "text": "hi"}
        })))
        .mount(&server)
        .await;

    let session = Session::new(NetworkKind::Misskey, server.uri(), Some("bob"), "k", Some("1"));
    let receipt = gateway().publish(&session, "hi").await.unwrap();
    assert_eq!(receipt.id, "9xyz");
    assert_eq!(receipt.url, Some(format!("{}/notes/9xyz", server.uri())));
}

async fn mount_misskey_user(server: &MockServer, username: &str, name: Option<&str>, delay_ms: u64) {
    Mock::given(method("POST"))
        .and(path("/api/users/show"))
        .and(body_json(json!({"username": username})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "id": format!("id-{username}"),
                    "username": username,
                    "name": name,
                    "avatarUrl": format!("https://cdn.example/{username}.webp")
                }))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn profiles_come_back_in_session_order() {
    let server = MockServer::start().await;
    // The first lookup is the slowest; order must not follow completion time.
    mount_misskey_user(&server, "carol", Some("Carol C"), 300).await;
    mount_misskey_user(&server, "dave", None, 0).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/77"))
        .and(header("authorization", "Bearer m-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "77",
            "username": "erin",
            "avatar": "https://cdn.example/erin.png"
        })))
        .mount(&server)
        .await;

    let sessions = vec![
        Session::new(NetworkKind::Misskey, server.uri(), Some("carol"), "k1", Some("c")),
        Session::new(NetworkKind::Mastodon, server.uri(), Some("erin"), "m-tok", Some("77")),
        Session::new(NetworkKind::Misskey, server.uri(), Some("dave"), "k2", Some("d")),
    ];

    for concurrency in [1, 3] {
        let outcomes = gateway()
            .with_profile_concurrency(concurrency)
            .fetch_profiles(&sessions)
            .await;
        let names: Vec<_> = outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().username.clone())
            .collect();
        // Misskey shows the display name, falling back to the username.
        assert_eq!(names, vec!["Carol C", "erin", "dave"]);
        assert_eq!(
            outcomes[1].result.as_ref().unwrap().avatar_url.as_deref(),
            Some("https://cdn.example/erin.png")
        );
    }
}

#[tokio::test]
async fn one_failed_profile_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    mount_misskey_user(&server, "carol", Some("Carol"), 0).await;
    Mock::given(method("POST"))
        .and(path("/api/users/show"))
        .and(body_json(json!({"username": "ghost"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "No such user.", "code": "NO_SUCH_USER"}
        })))
        .mount(&server)
        .await;

    let sessions = vec![
        Session::new(NetworkKind::Misskey, server.uri(), Some("ghost"), "k", None),
        Session::new(NetworkKind::Mastodon, server.uri(), Some("noid"), "t", None),
        Session::new(NetworkKind::Misskey, server.uri(), Some("carol"), "k", None),
    ];

    let outcomes = gateway().fetch_profiles(&sessions).await;
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(
        &outcomes[0].result,
        Err(CrosspostError::Api { status: 400, message, .. }) if message.contains("NO_SUCH_USER")
    ));
    assert!(matches!(
        outcomes[1].result,
        Err(CrosspostError::MissingField { field: "account id", .. })
    ));
    assert_eq!(outcomes[2].result.as_ref().unwrap().username, "Carol");
}

#[tokio::test]
async fn empty_session_list_broadcasts_nothing() {
    let report = gateway().broadcast(&[], "hello").await;
    assert!(report.outcomes.is_empty());
    assert!(!report.is_complete_success());
}

#[tokio::test]
async fn fan_outs_run_on_spawned_tasks() {
    let server = MockServer::start().await;
    mount_misskey_user(&server, "carol", Some("Carol"), 0).await;
    Mock::given(method("POST"))
        .and(path("/api/notes/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "createdNote": {"id": "n1"}
        })))
        .mount(&server)
        .await;

    let sessions = vec![Session::new(NetworkKind::Misskey, server.uri(), Some("carol"), "k", None)];

    let profiles = tokio::spawn({
        let sessions = sessions.clone();
        async move { gateway().fetch_profiles(&sessions).await }
    });
    let posted = tokio::spawn(async move { gateway().broadcast(&sessions, "hi").await });

    let outcomes = profiles.await.unwrap();
    assert_eq!(outcomes[0].result.as_ref().unwrap().username, "Carol");
    assert!(posted.await.unwrap().is_complete_success());
}
