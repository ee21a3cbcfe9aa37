//! Configuration system (layered: code > env > built-in defaults).

use std::fmt;
use std::time::Duration;

use bon::Builder;
use strum::Display;

use crate::error::{EaseeError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.easee.cloud";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RESUME_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Which identifier a call needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IdKind {
    Charger,
    Site,
    Circuit,
}

impl IdKind {
    /// Sample value shipped in example env files; never a real identifier.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Charger => "ABBXXXXX",
            Self::Site | Self::Circuit => "123456",
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            Self::Charger => "EASEE_CHARGERID",
            Self::Site => "EASEE_SITEID",
            Self::Circuit => "EASEE_CIRCUITID",
        }
    }
}

/// Options supplied in code. Every field set here wins over the environment.
///
/// # Example
/// ```
/// use easee::config::ClientOptions;
///
/// let options = ClientOptions::builder()
///     .username("me@example.com")
///     .password("secret")
///     .charger_id("EH123456")
///     .throw_errors_on_fault(true)
///     .build();
/// assert_eq!(options.charger_id.as_deref(), Some("EH123456"));
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct ClientOptions {
    #[builder(into)]
    pub username: Option<String>,
    #[builder(into)]
    pub password: Option<String>,
    #[builder(into)]
    pub charger_id: Option<String>,
    #[builder(into)]
    pub site_id: Option<String>,
    #[builder(into)]
    pub circuit_id: Option<String>,
    pub throw_errors_on_fault: Option<bool>,
    pub token_refresh_interval_override: Option<Duration>,
    pub debug: Option<bool>,
    #[builder(into)]
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
    pub resume_settle_delay: Option<Duration>,
}

/// Fully resolved client configuration.
#[derive(Clone)]
pub struct EaseeConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub charger_id: Option<String>,
    pub site_id: Option<String>,
    pub circuit_id: Option<String>,
    /// Raise transport faults instead of resolving to an empty projection.
    pub throw_errors_on_fault: bool,
    /// Fixed refresh interval used instead of `expiresIn - 60s`.
    pub token_refresh_interval_override: Option<Duration>,
    pub debug: bool,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Pause between a resume command and the state re-check.
    pub resume_settle_delay: Duration,
}

impl fmt::Debug for EaseeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EaseeConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("charger_id", &self.charger_id)
            .field("site_id", &self.site_id)
            .field("circuit_id", &self.circuit_id)
            .field("throw_errors_on_fault", &self.throw_errors_on_fault)
            .field(
                "token_refresh_interval_override",
                &self.token_refresh_interval_override,
            )
            .field("debug", &self.debug)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("resume_settle_delay", &self.resume_settle_delay)
            .finish()
    }
}

impl Default for EaseeConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            charger_id: None,
            site_id: None,
            circuit_id: None,
            throw_errors_on_fault: false,
            token_refresh_interval_override: None,
            debug: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            resume_settle_delay: DEFAULT_RESUME_SETTLE_DELAY,
        }
    }
}

impl EaseeConfig {
    /// Load from environment variables (EASEE_USERNAME, EASEE_CHARGERID, etc.).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        config.username = env_string("EASEE_USERNAME");
        config.password = env_string("EASEE_PASSWORD");
        config.charger_id = env_string(IdKind::Charger.env_var());
        config.site_id = env_string(IdKind::Site.env_var());
        config.circuit_id = env_string(IdKind::Circuit.env_var());

        if let Some(flag) = env_bool("EASEE_THROW_ERRORS_ON_FAULT") {
            config.throw_errors_on_fault = flag;
        }
        if let Some(flag) = env_bool("EASEE_DEBUG") {
            config.debug = flag;
        }
        if let Some(raw) = env_string("EASEE_TOKEN_REFRESH_INTERVAL") {
            match raw.parse::<u64>() {
                Ok(0) => tracing::warn!("Ignoring EASEE_TOKEN_REFRESH_INTERVAL: must be above zero"),
                Ok(secs) => {
                    config.token_refresh_interval_override = Some(Duration::from_secs(secs))
                }
                Err(_) => tracing::warn!(
                    value = %raw,
                    "Ignoring EASEE_TOKEN_REFRESH_INTERVAL: expected whole seconds"
                ),
            }
        }
        if let Some(url) = env_string("EASEE_BASE_URL") {
            config.base_url = url;
        }

        config
    }

    /// Environment defaults overlaid with explicit options.
    pub fn resolve(options: ClientOptions) -> Self {
        Self::from_env().merge(options)
    }

    /// Overlay explicit options on this config. Set options always win.
    pub fn merge(mut self, options: ClientOptions) -> Self {
        if options.username.is_some() {
            self.username = options.username;
        }
        if options.password.is_some() {
            self.password = options.password;
        }
        if options.charger_id.is_some() {
            self.charger_id = options.charger_id;
        }
        if options.site_id.is_some() {
            self.site_id = options.site_id;
        }
        if options.circuit_id.is_some() {
            self.circuit_id = options.circuit_id;
        }
        if let Some(flag) = options.throw_errors_on_fault {
            self.throw_errors_on_fault = flag;
        }
        match options.token_refresh_interval_override {
            Some(interval) if interval.is_zero() => {
                tracing::warn!("Ignoring zero token_refresh_interval_override")
            }
            Some(interval) => self.token_refresh_interval_override = Some(interval),
            None => {}
        }
        if let Some(flag) = options.debug {
            self.debug = flag;
        }
        if let Some(url) = options.base_url {
            self.base_url = url;
        }
        if let Some(timeout) = options.request_timeout {
            self.request_timeout = timeout;
        }
        if let Some(delay) = options.resume_settle_delay {
            self.resume_settle_delay = delay;
        }
        self
    }

    /// Configured default for an identifier kind.
    pub fn default_id(&self, kind: IdKind) -> Option<&str> {
        match kind {
            IdKind::Charger => self.charger_id.as_deref(),
            IdKind::Site => self.site_id.as_deref(),
            IdKind::Circuit => self.circuit_id.as_deref(),
        }
    }

    /// Resolve an identifier: explicit argument first, then the configured default.
    pub fn resolve_id(&self, kind: IdKind, explicit: Option<&str>) -> Result<String> {
        resolve_id(kind, explicit, self.default_id(kind))
    }
}

/// Pick the first usable identifier, rejecting blanks and placeholders.
pub fn resolve_id(kind: IdKind, explicit: Option<&str>, default: Option<&str>) -> Result<String> {
    explicit
        .or(default)
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != kind.placeholder())
        .map(str::to_string)
        .ok_or_else(|| {
            EaseeError::Configuration(format!(
                "no {kind} id given and no default configured (set {})",
                kind.env_var()
            ))
        })
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
