//! reqwest-backed transport, header helpers and status mapping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, trace, warn};

use super::{CommandResponse, Transport};
use crate::auth::SessionManager;
use crate::config::EaseeConfig;
use crate::error::{EaseeError, Result};

/// Build a reqwest client with the configured timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(4)
        .build()?)
}

/// Build per-request headers for a Bearer-token API.
pub fn bearer_headers(access_token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {access_token}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success status to an error.
pub fn status_to_error(status: u16, body: &str) -> EaseeError {
    match status {
        401 | 403 => EaseeError::Authentication(format!("status {status}: {body}")),
        _ => EaseeError::api(status, body),
    }
}

/// Percent-encode a single path segment (RFC 3986 unreserved characters pass through).
pub fn encode_path_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

fn parse_body(body: &str) -> Result<serde_json::Value> {
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Transport that sends every request through the session gate.
///
/// With `throw_errors_on_fault` unset, transport faults (network errors,
/// non-2xx statuses, unparseable bodies) are logged and resolved to an empty
/// projection. Authentication failures always propagate.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
    throw_errors_on_fault: bool,
    debug: bool,
}

impl HttpTransport {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            throw_errors_on_fault: false,
            debug: false,
        }
    }

    pub fn from_config(
        config: &EaseeConfig,
        client: reqwest::Client,
        session: Arc<SessionManager>,
    ) -> Self {
        Self::new(client, config.base_url.clone(), session)
            .with_throw_errors_on_fault(config.throw_errors_on_fault)
            .with_debug(config.debug)
    }

    pub fn with_throw_errors_on_fault(mut self, enabled: bool) -> Self {
        self.throw_errors_on_fault = enabled;
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn log_response(&self, method: &str, path: &str, status: StatusCode, body: &str) {
        if self.debug {
            debug!(method, path, status = status.as_u16(), body, "Easee API response");
        } else {
            trace!(method, path, status = status.as_u16(), "Easee API response");
        }
    }

    /// Apply the fault policy: propagate, or log and substitute `fallback`.
    fn soften<T>(
        &self,
        method: &str,
        path: &str,
        result: Result<T>,
        fallback: impl FnOnce(&EaseeError) -> T,
    ) -> Result<T> {
        match result {
            Err(e) if !self.throw_errors_on_fault && e.is_transport_fault() => {
                warn!(method, path, error = %e, "Easee API call failed, returning empty result");
                Ok(fallback(&e))
            }
            other => other,
        }
    }

    async fn reject(&self, status: StatusCode, body: &str, access_token: &str) -> EaseeError {
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.session.invalidate(access_token).await;
        }
        status_to_error(status.as_u16(), body)
    }

    async fn try_get(&self, path: &str) -> Result<serde_json::Value> {
        let session = self.session.ensure_valid().await?;
        let resp = self
            .client
            .get(self.url(path))
            .headers(bearer_headers(&session.access_token))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        self.log_response("GET", path, status, &body);
        if !status.is_success() {
            return Err(self.reject(status, &body, &session.access_token).await);
        }
        parse_body(&body)
    }

    async fn try_post(&self, path: &str, payload: &serde_json::Value) -> Result<CommandResponse> {
        let session = self.session.ensure_valid().await?;
        let resp = self
            .client
            .post(self.url(path))
            .headers(bearer_headers(&session.access_token))
            .json(payload)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        self.log_response("POST", path, status, &body);
        if !status.is_success() {
            return Err(self.reject(status, &body, &session.access_token).await);
        }
        Ok(CommandResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            data: parse_body(&body)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        let result = self.try_get(path).await;
        self.soften("GET", path, result, |_| serde_json::Value::Null)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<CommandResponse> {
        let result = self.try_post(path, &body).await;
        self.soften("POST", path, result, |e| {
            let status = e.status().unwrap_or(0);
            CommandResponse {
                status,
                status_text: StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or_default()
                    .to_string(),
                data: serde_json::Value::Null,
            }
        })
    }
}
