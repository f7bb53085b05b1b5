//! Minimal JSON HTTP client with safe logging and bearer auth.
//!
//! - Request options: headers, `Auth`, timeout
//! - Never logs secret values: the Authorization header and credential-bearing
//!   JSON body fields (Misskey's `i`, `token`, ...) are redacted
//! - No retries: every call is exactly one round trip
//! - Optional *raw* request/response logging via `CROSSPOST_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), crosspost_http::HttpError> {
//! let client = crosspost_http::HttpClient::new("https://mastodon.example")?;
//! let got: serde_json::Value = client
//!     .get_json("api/v1/instance", crosspost_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `CROSSPOST_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "CROSSPOST_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const REDACTED: &str = "<redacted>";

/// JSON body fields that carry credentials.
const SECRET_BODY_FIELDS: &[&str] = &[
    "i",
    "token",
    "access_token",
    "api_key",
    "password",
    "client_secret",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(
    method: &Method,
    url: &Url,
    has_bearer: bool,
    headers: &HeaderMap,
    body: Option<&[u8]>,
) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    if has_bearer {
        parts.push(format!("-H 'Authorization: Bearer {REDACTED}'"));
    }
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if let Some(bytes) = body {
        parts.push(format!("-d '{}'", redact_body(bytes).replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = format!("Bearer {REDACTED}");
            }
            (key, val)
        })
        .collect()
}

/// Render a request body for logs with credential fields blanked out.
///
/// Non-JSON bodies are never echoed, only their size.
fn redact_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut v) => {
            redact_value(&mut v);
            let mut s = v.to_string();
            if truncate_on_char_boundary(&mut s, RAW_MAX_BODY) {
                s.push('…');
            }
            s
        }
        Err(_) => format!("<{} bytes>", bytes.len()),
    }
}

fn redact_value(v: &mut Value) {
    match v {
        Value::Object(map) => {
            for (k, val) in map.iter_mut() {
                if SECRET_BODY_FIELDS.contains(&k.as_str()) {
                    *val = Value::String(REDACTED.into());
                } else {
                    redact_value(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use crosspost_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     Auth::None => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Unauthenticated, or credentials travel in the body (Misskey `i`).
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use crosspost_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(5)),
///     auth: Some(Auth::Bearer("token")),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 5);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

impl<'a> RequestOpts<'a> {
    /// Shorthand for bearer-authenticated requests.
    pub fn bearer(token: &'a str) -> Self {
        Self {
            auth: Some(Auth::Bearer(token)),
            ..Default::default()
        }
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. A trailing `/` is added when
    /// missing so relative paths join underneath it.
    ///
    /// ```no_run
    /// use crosspost_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://misskey.example")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// assert_eq!(client.base().as_str(), "https://misskey.example/");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(HttpError::Url(format!("{base} cannot be used as a base")));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("crosspost/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use crosspost_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://mastodon.example")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST a JSON body with per-request options.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(body), opts)
            .await
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);

        let body_bytes = match body {
            Some(b) => {
                let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
                rb = rb
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
                Some(bytes)
            }
            None => None,
        };

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
                "bearer"
            }
            Some(Auth::None) | None => "none",
        };

        let req_id = format!("r{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%host_path,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            has_body=%body_bytes.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let empty = HeaderMap::new();
            let curl = make_curl(
                &method,
                &url,
                auth_kind == "bearer",
                opts.headers.as_ref().unwrap_or(&empty),
                body_bytes.as_deref(),
            );
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(
                req_id=%req_id,
                host_path=%host_path,
                timeout=err.is_timeout(),
                message=%message,
                "http.network_error.send"
            );
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let req_hdr_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        // Mastodon reports its per-token budget in these headers.
        let remain = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());
        let reset = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok());

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%req_hdr_id,
            rate_limit.remaining=?remain,
            rate_limit.reset=?reset,
            "http.response"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let mut body_snip = bytes.to_vec();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            if truncated {
                body_snip.truncate(RAW_MAX_BODY);
            }
            let text = String::from_utf8_lossy(&body_snip);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snippet,
            "http.response.body_snippet"
        );

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_line=%e.line(),
                    serde_col=%e.column(),
                    serde_err=%e.to_string(),
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            host_path=%host_path,
            message=%message,
            x_request_id=%req_hdr_id,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: req_hdr_id.to_string(),
        })
    }
}

// ==============================
// Helpers
// ==============================

/// Pull a human-readable message out of an error body.
fn extract_error_message(body: &[u8]) -> String {
    let Ok(v) = serde_json::from_slice::<Value>(body) else {
        return snip_body(body);
    };

    // Misskey: {"error":{"message":"...","code":"...","id":"..."}}
    if let Some(err) = v.get("error").filter(|e| e.is_object()) {
        let message = err.get("message").and_then(Value::as_str).unwrap_or("");
        let code = err.get("code").and_then(Value::as_str).unwrap_or("");
        match (message.is_empty(), code.is_empty()) {
            (false, false) => return format!("{message} ({code})"),
            (false, true) => return message.to_string(),
            (true, false) => return code.to_string(),
            (true, true) => {}
        }
    }

    // Mastodon: {"error":"...", "error_description":"..."}; generic {"message"} / {"detail"}
    for field in ["error_description", "error", "message", "detail"] {
        if let Some(s) = v.get(field).and_then(Value::as_str) {
            if !s.is_empty() {
                return s.to_string();
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if truncate_on_char_boundary(&mut snip, 500) {
        snip.push_str("...");
    }
    snip
}

/// Cut `s` to at most `max` bytes without splitting a char. Returns whether it cut.
fn truncate_on_char_boundary(s: &mut String, max: usize) -> bool {
    if s.len() <= max {
        return false;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    true
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // Tokens are often pasted with quotes or stray whitespace.
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("access token is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("access token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "access token contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
