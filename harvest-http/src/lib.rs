//! HTTP plumbing for the harvester: image downloads and multipart uploads.
//!
//! Every call is a single attempt. [`HttpClient::get_bytes`] treats a
//! non-success status as [`HttpError::Api`]; [`HttpClient::post_multipart`]
//! returns the [`RawResponse`] whatever the status so the caller can decide.
//!
//! Bearer tokens never reach the logs. Setting `HARVEST_HTTP_RAW=1` adds a
//! redacted request line and the (truncated) response body at target
//! `http.raw`.
//!
//! ```no_run
//! # async fn demo() -> Result<(), harvest_http::HttpError> {
//! let client = harvest_http::HttpClient::new()?;
//! let image = client
//!     .get_bytes("https://cdn.example.com/logo.png", harvest_http::RequestOpts::default())
//!     .await?;
//! assert!(image.status.is_success());
//! # Ok(()) }
//! ```

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

// ==============================
// Raw logging
// ==============================

const RAW_ENV: &str = "HARVEST_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_CHARS: usize = 500;

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    std::env::var(RAW_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// One-line summary of an outgoing request with credentials masked.
fn request_line(method: &Method, url: &Url, auth: Option<&Auth<'_>>, multipart: bool) -> String {
    let mut line = format!("{method} {url}");
    if matches!(auth, Some(Auth::Bearer(_))) {
        line.push_str(" [authorization: Bearer ***]");
    }
    if multipart {
        line.push_str(" [multipart/form-data]");
    }
    line
}

/// Header pairs safe to log.
fn loggable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = match name.as_str() {
                "authorization" | "proxy-authorization" | "set-cookie" | "cookie" => "***",
                _ => value.to_str().unwrap_or("<binary>"),
            };
            (name.to_string(), shown.to_string())
        })
        .collect()
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
// Request options
// ==============================

/// Credential attached to a request.
#[derive(Clone, Debug, Default)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>`; the token is sanitized first.
    Bearer(&'a str),
    #[default]
    None,
}

/// Per-request settings.
///
/// ```
/// use harvest_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(10)),
///     auth: Some(Auth::Bearer("secret")),
///     ..Default::default()
/// };
/// assert!(!opts.accept_json);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    /// Overrides [`HttpClient::default_timeout`].
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    /// Send `accept: application/json`.
    pub accept_json: bool,
}

// ==============================
// Responses
// ==============================

/// Status, headers and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// `content-type` header, if present and ASCII.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Decode(e.to_string(), snip_body(&self.body)))
    }

    /// Human readable error text: a structured message field when the body
    /// is JSON, otherwise a body snippet.
    pub fn error_message(&self) -> String {
        extract_error_message(&self.body)
    }

    /// Server-assigned request id, or `-`.
    pub fn request_id(&self) -> String {
        self.headers
            .get("x-request-id")
            .or_else(|| self.headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Client with a 5s connect timeout and a 30s request timeout.
    ///
    /// ```no_run
    /// use harvest_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?.with_timeout(Duration::from_secs(10));
    /// assert_eq!(client.default_timeout, Duration::from_secs(10));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// GET `url` and return the body. Non-success statuses become
    /// [`HttpError::Api`].
    pub async fn get_bytes(&self, url: &str, opts: RequestOpts<'_>) -> Result<RawResponse, HttpError> {
        let url = parse_url(url)?;
        let rb = self.prepare(Method::GET, &url, &opts)?;
        let resp = self.execute(Method::GET, &url, rb, &opts, false).await?;
        if !resp.status.is_success() {
            return Err(HttpError::Api {
                status: resp.status,
                message: resp.error_message(),
                request_id: resp.request_id(),
            });
        }
        Ok(resp)
    }

    /// POST a multipart form to `url` once and return the response as is.
    pub async fn post_multipart(
        &self,
        url: &str,
        form: Form,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError> {
        let url = parse_url(url)?;
        let rb = self.prepare(Method::POST, &url, &opts)?.multipart(form);
        self.execute(Method::POST, &url, rb, &opts, true).await
    }

    fn prepare(&self, method: Method, url: &Url, opts: &RequestOpts<'_>) -> Result<RequestBuilder, HttpError> {
        let mut rb = self
            .inner
            .request(method, url.clone())
            .timeout(opts.timeout.unwrap_or(self.default_timeout));
        if opts.accept_json {
            rb = rb.header(ACCEPT, "application/json");
        }
        if let Some(Auth::Bearer(token)) = &opts.auth {
            rb = rb.bearer_auth(sanitize_bearer(token)?);
        }
        Ok(rb)
    }

    async fn execute(
        &self,
        method: Method,
        url: &Url,
        rb: RequestBuilder,
        opts: &RequestOpts<'_>,
        multipart: bool,
    ) -> Result<RawResponse, HttpError> {
        let req_id = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            req_id,
            %method,
            host = url.host_str().unwrap_or("-"),
            path = url.path(),
            multipart,
            "http.request.start"
        );
        if raw_enabled() {
            let line = request_line(&method, url, opts.auth.as_ref(), multipart);
            tracing::debug!(target: "http.raw", req_id, %line, "request");
        }

        let started = Instant::now();
        let network = |err: reqwest::Error| {
            tracing::warn!(req_id, error = %err, "http.network_error");
            HttpError::Network(err.to_string())
        };
        let resp = rb.send().await.map_err(network)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(network)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let resp = RawResponse { status, headers, body };
        tracing::debug!(
            req_id,
            %status,
            elapsed_ms,
            body_len = resp.body.len(),
            "http.response.headers"
        );
        if raw_enabled() {
            let shown = &resp.body[..resp.body.len().min(RAW_MAX_BODY)];
            tracing::debug!(
                target: "http.raw",
                req_id,
                headers = ?loggable_headers(&resp.headers),
                body = %String::from_utf8_lossy(shown),
                truncated = resp.body.len() > RAW_MAX_BODY,
                "response"
            );
        }
        if !status.is_success() {
            tracing::warn!(
                req_id,
                %status,
                request_id = %resp.request_id(),
                body_snippet = %snip_body(&resp.body),
                "http.error"
            );
        }
        Ok(resp)
    }
}

// ==============================
// Helpers
// ==============================

fn parse_url(raw: &str) -> Result<Url, HttpError> {
    Url::parse(raw).map_err(|e| HttpError::Url(format!("{raw}: {e}")))
}

fn extract_error_message(body: &[u8]) -> String {
    const FIELDS: [&str; 4] = ["/error/message", "/message", "/detail", "/error"];

    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            FIELDS
                .iter()
                .filter_map(|ptr| json.pointer(ptr).and_then(|v| v.as_str()))
                .find(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| snip_body(body))
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= SNIPPET_CHARS {
        return text.into_owned();
    }
    let mut snip: String = text.chars().take(SNIPPET_CHARS).collect();
    snip.push_str("...");
    snip
}

/// Strip the quoting and surrounding whitespace that creeps into tokens
/// copied from env files, then check the result is a valid header value.
fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let token = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    if token.is_empty() {
        return Err(HttpError::Build("bearer token is empty".into()));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(HttpError::Build("bearer token contains whitespace".into()));
    }
    if !token.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(HttpError::Build("bearer token has non-printable or non-ASCII bytes".into()));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid authorization header: {e}")))?;
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_is_trimmed_and_unquoted() {
        assert_eq!(sanitize_bearer("  \"abc\n\" ").unwrap(), "abc");
        assert_eq!(sanitize_bearer("'tok-1'").unwrap(), "tok-1");
    }

    #[test]
    fn bearer_with_inner_whitespace_is_rejected() {
        assert!(matches!(sanitize_bearer("ab c"), Err(HttpError::Build(_))));
        assert!(matches!(sanitize_bearer("\"ab\tc\""), Err(HttpError::Build(_))));
    }

    #[test]
    fn bearer_rejects_empty_and_non_ascii() {
        assert!(matches!(sanitize_bearer("clé"), Err(HttpError::Build(_))));
        assert!(matches!(sanitize_bearer("   "), Err(HttpError::Build(_))));
        assert!(matches!(sanitize_bearer("a\u{7f}b"), Err(HttpError::Build(_))));
    }

    #[test]
    fn credentials_never_show_in_log_lines() {
        let url = Url::parse("https://ingest.example.com/collections").unwrap();
        let line = request_line(&Method::POST, &url, Some(&Auth::Bearer("secret")), true);
        assert!(!line.contains("secret"));
        assert!(line.ends_with("[multipart/form-data]"));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        let shown = loggable_headers(&headers);
        assert!(shown.contains(&("authorization".into(), "***".into())));
        assert!(shown.contains(&("x-trace".into(), "abc".into())));
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        assert_eq!(extract_error_message(br#"{"error":{"message":"bad token"}}"#), "bad token");
        assert_eq!(extract_error_message(br#"{"detail":"missing name"}"#), "missing name");
        assert_eq!(extract_error_message(br#"{"error":"quota"}"#), "quota");
        assert_eq!(extract_error_message(b"plain failure"), "plain failure");
    }

    #[test]
    fn long_bodies_are_snipped_on_char_boundaries() {
        let body = "é".repeat(600);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert_eq!(snip.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(matches!(parse_url("/collections"), Err(HttpError::Url(_))));
    }
}
