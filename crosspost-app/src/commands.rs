use anyhow::{Result, bail};
use crosspost_common::Session;
use crosspost_social::{Gateway, Registration};
use crosspost_store::{KeyValueStorage, SessionStore};
use std::io::{Read, Write};

pub async fn register<S: KeyValueStorage>(
    store: &mut SessionStore<S>,
    gateway: &Gateway,
    registration: Registration,
    out: &mut impl Write,
) -> Result<()> {
    let session = store.register(gateway, &registration).await?;
    writeln!(
        out,
        "Registered {} ({}), account id {}",
        session.handle(),
        session.kind,
        session.id.as_deref().unwrap_or("-")
    )?;
    Ok(())
}

pub fn accounts(sessions: &[Session], out: &mut impl Write) -> Result<()> {
    if sessions.is_empty() {
        writeln!(out, "No accounts registered.")?;
        return Ok(());
    }
    for (i, s) in sessions.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {:<8} {:<24} {:<20} {}",
            i + 1,
            s.kind,
            s.instance,
            s.username.as_deref().unwrap_or("-"),
            s.id.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

/// Prints one line per session in registration order. `Ok(false)` if any lookup failed.
pub async fn profiles(gateway: &Gateway, sessions: &[Session], out: &mut impl Write) -> Result<bool> {
    if sessions.is_empty() {
        writeln!(out, "No accounts registered.")?;
        return Ok(true);
    }
    let mut all_ok = true;
    for outcome in gateway.fetch_profiles(sessions).await {
        match outcome.result {
            Ok(p) => writeln!(
                out,
                "{:<8} {:<24} {:<20} {}",
                outcome.kind,
                p.instance,
                p.username,
                p.avatar_url.as_deref().unwrap_or("-")
            )?,
            Err(e) => {
                all_ok = false;
                writeln!(out, "{:<8} {:<24} error: {e}", outcome.kind, outcome.instance)?;
            }
        }
    }
    Ok(all_ok)
}

/// Broadcasts `text` and prints every account's outcome. `Ok(false)` unless all posts went through.
pub async fn post(
    gateway: &Gateway,
    sessions: &[Session],
    text: &str,
    out: &mut impl Write,
) -> Result<bool> {
    if text.trim().is_empty() {
        bail!("refusing to post empty text");
    }
    if sessions.is_empty() {
        writeln!(out, "No accounts registered.")?;
        return Ok(false);
    }
    let report = gateway.broadcast(sessions, text).await;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(receipt) => writeln!(
                out,
                "posted  {} ({}) {}",
                outcome.handle(),
                outcome.kind,
                receipt.url.as_deref().unwrap_or(&receipt.id)
            )?,
            Err(e) => writeln!(out, "failed  {} ({}): {e}", outcome.handle(), outcome.kind)?,
        }
    }
    writeln!(
        out,
        "{} of {} account(s) succeeded",
        report.succeeded().count(),
        report.outcomes.len()
    )?;
    Ok(report.is_complete_success())
}

/// The positional text, or everything on `input` when it is absent or `-`.
pub fn read_post_text(arg: Option<String>, mut input: impl Read) -> Result<String> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            input.read_to_string(&mut buf)?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_common::NetworkKind;
    use crosspost_store::MemoryStorage;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn gateway() -> Gateway {
        Gateway::new(Duration::from_secs(5))
    }

    #[test]
    fn accounts_lists_in_order() {
        let sessions = vec![
            Session::new(NetworkKind::Mastodon, "mastodon.social", Some("alice"), "secret-a", Some("1")),
            Session::new(NetworkKind::Misskey, "misskey.io", Some("bob"), "secret-b", None),
        ];
        let mut out = Vec::new();
        accounts(&sessions, &mut out).unwrap();
        let text = output(out);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("mastodon.social") && lines[0].contains("alice"));
        assert!(lines[1].contains("misskey.io") && lines[1].trim_end().ends_with('-'));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn stdin_used_for_dash_or_missing_text() {
        assert_eq!(read_post_text(Some("hi".into()), &b"ignored"[..]).unwrap(), "hi");
        assert_eq!(read_post_text(Some("-".into()), &b"from stdin\n"[..]).unwrap(), "from stdin");
        assert_eq!(read_post_text(None, &b"a\nb\n"[..]).unwrap(), "a\nb");
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_any_request() {
        let sessions = vec![Session::new(NetworkKind::Mastodon, "127.0.0.1:9", None, "t", None)];
        let mut out = Vec::new();
        assert!(post(&gateway(), &sessions, "  \n", &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_reports_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/statuses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42", "url": "https://example.test/@alice/42"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/notes/create"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"message": "Internal error", "code": "INTERNAL_ERROR"}
            })))
            .mount(&server)
            .await;

        let sessions = vec![
            Session::new(NetworkKind::Mastodon, server.uri(), Some("alice"), "t", Some("1")),
            Session::new(NetworkKind::Misskey, server.uri(), Some("bob"), "k", Some("b1")),
        ];
        let mut out = Vec::new();
        let ok = post(&gateway(), &sessions, "hello", &mut out).await.unwrap();
        let text = output(out);

        assert!(!ok);
        assert!(text.contains("posted  alice@"));
        assert!(text.contains("https://example.test/@alice/42"));
        assert!(text.contains("failed  bob@") && text.contains("INTERNAL_ERROR"));
        assert!(text.contains("1 of 2 account(s) succeeded"));
    }

    #[tokio::test]
    async fn register_prints_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/verify_credentials"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "7", "username": "alice"})),
            )
            .mount(&server)
            .await;

        let mut store = SessionStore::open(MemoryStorage::new()).unwrap();
        let mut out = Vec::new();
        let reg = Registration::new(NetworkKind::Mastodon, server.uri(), "", "tok");
        register(&mut store, &gateway(), reg, &mut out).await.unwrap();

        assert!(output(out).contains("account id 7"));
        assert_eq!(store.sessions().len(), 1);
        assert!(store.storage().get("session").unwrap().is_some());
    }

    #[tokio::test]
    async fn profiles_flags_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1", "username": "alice", "avatar": "https://example.test/a.png"
            })))
            .mount(&server)
            .await;

        let sessions = vec![
            Session::new(NetworkKind::Mastodon, server.uri(), Some("alice"), "t", Some("1")),
            Session::new(NetworkKind::Mastodon, server.uri(), None, "t", None),
        ];
        let mut out = Vec::new();
        let ok = profiles(&gateway(), &sessions, &mut out).await.unwrap();
        let text = output(out);
        let lines: Vec<_> = text.lines().collect();

        assert!(!ok);
        assert!(lines[0].contains("alice") && lines[0].contains("a.png"));
        assert!(lines[1].contains("error:"));
    }
}
