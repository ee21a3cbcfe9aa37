//! Session lifecycle: login, refresh, expiry checks and the background refresh timer.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::AuthError;
use super::token::{Credentials, Session, TokenResponse};

pub const LOGIN_PATH: &str = "/api/accounts/login";
pub const REFRESH_PATH: &str = "/api/accounts/refresh_token";

/// How long before expiry the background refresh fires.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Delay until the next background refresh.
///
/// A non-zero override wins; otherwise `expires_in - 60s`, clamped at zero.
pub fn refresh_delay(expires_in: Duration, interval_override: Option<Duration>) -> Duration {
    interval_override
        .filter(|interval| !interval.is_zero())
        .unwrap_or_else(|| expires_in.saturating_sub(REFRESH_MARGIN))
}

#[derive(Default)]
struct RefreshTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    due_at: Option<DateTime<Utc>>,
    closed: bool,
}

/// Owns credentials and the current bearer session for one client.
///
/// Every outbound request goes through [`SessionManager::ensure_valid`]. Login
/// and refresh run while holding the session lock, so concurrent callers
/// wait for the in-flight exchange instead of starting their own.
///
/// # Example
/// ```no_run
/// use easee::auth::{Credentials, SessionManager};
///
/// # async fn example() -> Result<(), easee::auth::AuthError> {
/// let manager = SessionManager::new(
///     reqwest::Client::new(),
///     "https://api.easee.cloud",
///     Credentials::new("me@example.com", "secret"),
///     None,
/// );
/// let session = manager.ensure_valid().await?;
/// println!("token valid until {}", session.expires_at);
/// manager.close();
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    interval_override: Option<Duration>,
    session: tokio::sync::Mutex<Option<Session>>,
    timer: Mutex<RefreshTimer>,
    this: Weak<SessionManager>,
}

impl SessionManager {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Credentials,
        interval_override: Option<Duration>,
    ) -> Arc<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Arc::new_cyclic(|this| Self {
            client,
            base_url,
            credentials,
            interval_override,
            session: tokio::sync::Mutex::new(None),
            timer: Mutex::new(RefreshTimer::default()),
            this: this.clone(),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Log in with the stored credentials, replacing any current session.
    pub async fn login(&self) -> Result<Session, AuthError> {
        let mut slot = self.session.lock().await;
        let session = self.request_login().await?;
        *slot = Some(session.clone());
        self.schedule_refresh(&session);
        Ok(session)
    }

    /// Renew the session with the refresh token, falling back to one full login.
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let mut slot = self.session.lock().await;
        let renewed = self.renew(slot.as_ref()).await;
        match renewed {
            Ok(session) => {
                *slot = Some(session.clone());
                self.schedule_refresh(&session);
                Ok(session)
            }
            Err(e) => {
                if slot.as_ref().is_some_and(Session::is_expired) {
                    *slot = None;
                }
                Err(e)
            }
        }
    }

    /// Return a non-expired session, renewing or logging in first if needed.
    pub async fn ensure_valid(&self) -> Result<Session, AuthError> {
        let mut slot = self.session.lock().await;
        if let Some(current) = slot.as_ref() {
            if !current.is_expired() {
                return Ok(current.clone());
            }
            debug!(expires_at = %current.expires_at, "Session expired, renewing");
        }
        let renewed = self.renew(slot.as_ref()).await;
        match renewed {
            Ok(session) => {
                *slot = Some(session.clone());
                self.schedule_refresh(&session);
                Ok(session)
            }
            Err(e) => {
                *slot = None;
                Err(e)
            }
        }
    }

    /// Cancel the pending background refresh. Safe to call repeatedly.
    ///
    /// The current session stays usable; it is simply no longer renewed
    /// ahead of expiry.
    pub fn close(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            timer.closed = true;
            timer.due_at = None;
            if let Some(handle) = timer.handle.take() {
                handle.abort();
                debug!("Token refresh timer cancelled");
            }
        }
    }

    /// Drop the stored session if it still carries `access_token`, so the
    /// next [`ensure_valid`](Self::ensure_valid) logs in again.
    ///
    /// Called when the API rejects a token it issued.
    pub async fn invalidate(&self, access_token: &str) {
        let mut slot = self.session.lock().await;
        if slot
            .as_ref()
            .is_some_and(|session| session.access_token == access_token)
        {
            debug!("Access token rejected by the API, dropping session");
            *slot = None;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.timer.lock().map(|t| t.closed).unwrap_or(true)
    }

    /// Copy of the current session, expired or not.
    pub async fn current(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| !s.is_expired())
    }

    /// When the pending background refresh is due, if one is scheduled.
    pub fn next_refresh_at(&self) -> Option<DateTime<Utc>> {
        self.timer.lock().ok().and_then(|t| t.due_at)
    }

    async fn renew(&self, current: Option<&Session>) -> Result<Session, AuthError> {
        if let Some(session) = current {
            if session.refresh_token.is_some() {
                match self.request_refresh(session).await {
                    Ok(renewed) => return Ok(renewed),
                    Err(e) => {
                        warn!(error = %e, "Token refresh failed, falling back to login");
                    }
                }
            }
        }
        self.request_login().await
    }

    async fn request_login(&self) -> Result<Session, AuthError> {
        if !self.credentials.is_complete() {
            return Err(AuthError::MissingCredentials);
        }
        debug!(username = self.credentials.username(), "Requesting access token");
        let issued_at = Utc::now();
        let resp = self
            .client
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({
                "userName": self.credentials.username(),
                "password": self.credentials.password(),
            }))
            .send()
            .await?;
        let session = Session::from_response(read_token_response(resp).await?, issued_at)?;
        debug!(expires_at = %session.expires_at, "Access token retrieved");
        Ok(session)
    }

    async fn request_refresh(&self, current: &Session) -> Result<Session, AuthError> {
        debug!("Refreshing access token");
        let issued_at = Utc::now();
        let resp = self
            .client
            .post(format!("{}{REFRESH_PATH}", self.base_url))
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({
                "accessToken": current.access_token,
                "refreshToken": current.refresh_token,
            }))
            .send()
            .await?;
        Session::from_response(read_token_response(resp).await?, issued_at)
    }

    fn schedule_refresh(&self, session: &Session) {
        let delay = refresh_delay(session.remaining(), self.interval_override);
        let Ok(mut timer) = self.timer.lock() else {
            return;
        };
        if timer.closed {
            return;
        }
        if let Some(previous) = timer.handle.take() {
            previous.abort();
        }
        timer.generation += 1;
        let generation = timer.generation;
        timer.due_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|delay| Utc::now().checked_add_signed(delay));

        let this = self.this.clone();
        timer.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(manager) = this.upgrade() else {
                return;
            };
            if !manager.claim_timer(generation) {
                return;
            }
            match manager.refresh().await {
                Ok(session) => {
                    debug!(expires_at = %session.expires_at, "Background token refresh succeeded")
                }
                Err(e) => warn!(error = %e, "Background token refresh failed"),
            }
        }));
        debug!(delay_secs = delay.as_secs(), "Token refresh scheduled");
    }

    /// Detach the firing timer's own handle so the refresh it triggers does
    /// not abort it. Returns false if a newer timer replaced this one.
    fn claim_timer(&self, generation: u64) -> bool {
        let Ok(mut timer) = self.timer.lock() else {
            return false;
        };
        if timer.closed || timer.generation != generation {
            return false;
        }
        timer.handle = None;
        timer.due_at = None;
        true
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.handle.take() {
                handle.abort();
            }
        }
    }
}

async fn read_token_response(resp: reqwest::Response) -> Result<TokenResponse, AuthError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    if body.trim().is_empty() {
        return Err(AuthError::NoToken);
    }
    serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))
}
