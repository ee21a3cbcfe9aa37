use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Lifetime assumed when the server omits `expiresIn`.
const FALLBACK_LIFETIME_SECS: i64 = 3600;

/// Account credentials exchanged for a session.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Both fields are present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Bearer session returned by login or refresh.
///
/// # Example
/// ```
/// use chrono::{Duration, Utc};
/// use easee::auth::Session;
///
/// let now = Utc::now();
/// let session = Session {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     token_type: Some("Bearer".to_string()),
///     issued_at: now,
///     expires_at: now + Duration::hours(24),
/// };
/// assert!(!session.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> std::time::Duration {
        (self.expires_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    pub(crate) fn from_response(
        payload: TokenResponse,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let access_token = payload
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoToken)?;
        let expires_in = payload.expires_in;
        let lifetime = match expires_in {
            Some(secs) if secs.is_finite() => {
                Duration::try_milliseconds((secs.max(0.0) * 1000.0) as i64)
            }
            Some(_) => None,
            None => Some(Duration::seconds(FALLBACK_LIFETIME_SECS)),
        };
        let expires_at = lifetime
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("expiresIn out of range: {expires_in:?}"))
            })?;
        Ok(Self {
            access_token,
            refresh_token: payload.refresh_token.filter(|t| !t.is_empty()),
            token_type: payload.token_type,
            issued_at,
            expires_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<f64>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
}
