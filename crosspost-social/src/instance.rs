//! Turning a user-entered instance host into a base URL.
use crosspost_common::{CrosspostError, Result};
use url::Url;

/// Resolve `mastodon.social` to `https://mastodon.social/`.
///
/// Values that already carry a scheme (`http://localhost:3000`) are kept as-is so
/// self-hosted development instances work.
///
/// ```
/// use crosspost_social::instance::instance_base_url;
///
/// assert_eq!(instance_base_url(" misskey.io/ ").unwrap().as_str(), "https://misskey.io/");
/// assert_eq!(
///     instance_base_url("http://localhost:3000").unwrap().as_str(),
///     "http://localhost:3000/"
/// );
/// assert!(instance_base_url("  ").is_err());
/// ```
pub fn instance_base_url(instance: &str) -> Result<Url> {
    let host = instance.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(CrosspostError::InvalidInput("instance host is empty".into()));
    }

    let raw = if host.contains("://") {
        format!("{host}/")
    } else {
        format!("https://{host}/")
    };

    let url = Url::parse(&raw)
        .map_err(|e| CrosspostError::InvalidInput(format!("bad instance `{instance}`: {e}")))?;
    if url.host_str().is_none() {
        return Err(CrosspostError::InvalidInput(format!(
            "instance `{instance}` has no host"
        )));
    }
    Ok(url)
}
