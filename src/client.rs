//! High-level client: endpoint wrappers with per-instance identifier defaults.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::auth::{Credentials, Session, SessionManager};
use crate::charging::{self, ChargeOutcome, ChargerControl};
use crate::config::{ClientOptions, EaseeConfig, IdKind};
use crate::error::{EaseeError, Result};
use crate::transport::http::{build_client, encode_path_segment};
use crate::transport::{CommandResponse, HttpTransport, Transport};
use crate::types::{
    Charger, ChargerCommand, ChargerState, ChargingSession, CircuitSettings, Profile, Site,
    UsageSample,
};

/// Client for one Easee account.
///
/// Identifier arguments are optional: `None` falls back to the configured
/// default (`EASEE_CHARGERID`, `EASEE_SITEID`, `EASEE_CIRCUITID` or the
/// matching [`ClientOptions`] field).
///
/// # Example
/// ```no_run
/// use easee::{ClientOptions, EaseeClient};
///
/// # async fn example() -> easee::Result<()> {
/// let client = EaseeClient::new(
///     ClientOptions::builder()
///         .username("me@example.com")
///         .password("secret")
///         .charger_id("EH123456")
///         .build(),
/// )?;
/// client.login().await?;
/// let outcome = client.start_or_resume_charging(None).await?;
/// println!("{}", outcome.message);
/// client.close();
/// # Ok(())
/// # }
/// ```
pub struct EaseeClient {
    config: EaseeConfig,
    session: Arc<SessionManager>,
    transport: Arc<dyn Transport>,
}

impl EaseeClient {
    /// Build from environment defaults overlaid with `options`.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::with_config(EaseeConfig::resolve(options))
    }

    /// Build from the environment alone.
    pub fn from_env() -> Result<Self> {
        Self::with_config(EaseeConfig::from_env())
    }

    pub fn with_config(config: EaseeConfig) -> Result<Self> {
        let http = build_client(config.request_timeout)?;
        let credentials = Credentials::new(
            config.username.clone().unwrap_or_default(),
            config.password.clone().unwrap_or_default(),
        );
        let session = SessionManager::new(
            http.clone(),
            config.base_url.clone(),
            credentials,
            config.token_refresh_interval_override,
        );
        let transport = Arc::new(HttpTransport::from_config(&config, http, session.clone()));
        Ok(Self {
            config,
            session,
            transport,
        })
    }

    /// Use a custom transport; `session` is still what `login`/`close` act on.
    pub fn with_transport(
        config: EaseeConfig,
        session: Arc<SessionManager>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            session,
            transport,
        }
    }

    pub fn config(&self) -> &EaseeConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Log in now instead of lazily on the first request.
    pub async fn login(&self) -> Result<Session> {
        Ok(self.session.login().await?)
    }

    /// Stop background token refresh. Idempotent.
    pub fn close(&self) {
        self.session.close();
    }

    // -----------------------------------------------------------------------
    // Chargers
    // -----------------------------------------------------------------------

    pub async fn get_chargers(&self) -> Result<Vec<Charger>> {
        self.get_json("/api/chargers").await
    }

    pub async fn get_charger_details(&self, charger_id: Option<&str>) -> Result<serde_json::Value> {
        let path = self.charger_path(charger_id, "details")?;
        self.transport.get(&path).await
    }

    pub async fn get_charger_config(&self, charger_id: Option<&str>) -> Result<serde_json::Value> {
        let path = self.charger_path(charger_id, "config")?;
        self.transport.get(&path).await
    }

    pub async fn get_charger_state(&self, charger_id: Option<&str>) -> Result<ChargerState> {
        let path = self.charger_path(charger_id, "state")?;
        self.get_json(&path).await
    }

    pub async fn get_weekly_schedule(&self, charger_id: Option<&str>) -> Result<serde_json::Value> {
        let path = self.charger_path(charger_id, "weekly_charge_plan")?;
        self.transport.get(&path).await
    }

    pub async fn get_last_charging_session(
        &self,
        charger_id: Option<&str>,
    ) -> Result<ChargingSession> {
        let path = self.charger_path(charger_id, "sessions/latest")?;
        self.get_json(&path).await
    }

    /// Hourly energy use between `from` and `to`.
    pub async fn get_power_usage(
        &self,
        charger_id: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageSample>> {
        let suffix = format!(
            "usage/hourly/{}/{}",
            encode_path_segment(&from.to_rfc3339_opts(SecondsFormat::Millis, true)),
            encode_path_segment(&to.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        let path = self.charger_path(charger_id, &suffix)?;
        self.get_json(&path).await
    }

    pub async fn is_ev_cable_connected(&self, charger_id: Option<&str>) -> Result<bool> {
        Ok(self.get_charger_state(charger_id).await?.is_cable_connected())
    }

    pub async fn update_charger_settings(
        &self,
        settings: &impl Serialize,
        charger_id: Option<&str>,
    ) -> Result<CommandResponse> {
        let path = self.charger_path(charger_id, "settings")?;
        self.transport.post(&path, serde_json::to_value(settings)?).await
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub async fn send_command(
        &self,
        charger_id: Option<&str>,
        command: ChargerCommand,
    ) -> Result<CommandResponse> {
        let path = self.charger_path(charger_id, &format!("commands/{command}"))?;
        self.transport.post(&path, serde_json::json!({})).await
    }

    pub async fn start_charging(&self, charger_id: Option<&str>) -> Result<CommandResponse> {
        self.send_command(charger_id, ChargerCommand::StartCharging).await
    }

    pub async fn stop_charging(&self, charger_id: Option<&str>) -> Result<CommandResponse> {
        self.send_command(charger_id, ChargerCommand::StopCharging).await
    }

    pub async fn pause_charging(&self, charger_id: Option<&str>) -> Result<CommandResponse> {
        self.send_command(charger_id, ChargerCommand::PauseCharging).await
    }

    pub async fn resume_charging(&self, charger_id: Option<&str>) -> Result<CommandResponse> {
        self.send_command(charger_id, ChargerCommand::ResumeCharging).await
    }

    pub async fn override_schedule(&self, charger_id: Option<&str>) -> Result<CommandResponse> {
        self.send_command(charger_id, ChargerCommand::OverrideSchedule).await
    }

    pub async fn update_firmware(&self, charger_id: Option<&str>) -> Result<CommandResponse> {
        self.send_command(charger_id, ChargerCommand::UpdateFirmware).await
    }

    /// Start, resume or un-schedule charging depending on the charger's
    /// `reasonForNoCurrent`. See [`charging::start_or_resume_charging`].
    pub async fn start_or_resume_charging(&self, charger_id: Option<&str>) -> Result<ChargeOutcome> {
        let id = self.config.resolve_id(IdKind::Charger, charger_id)?;
        charging::start_or_resume_charging(self, &id, self.config.resume_settle_delay).await
    }

    // -----------------------------------------------------------------------
    // Account, sites and circuits
    // -----------------------------------------------------------------------

    pub async fn get_profile(&self) -> Result<Profile> {
        self.get_json("/api/accounts/profile").await
    }

    pub async fn get_sites(&self) -> Result<Vec<Site>> {
        self.get_json("/api/sites").await
    }

    pub async fn get_site(&self, site_id: Option<&str>) -> Result<Site> {
        let site = self.config.resolve_id(IdKind::Site, site_id)?;
        self.get_json(&format!("/api/sites/{}", encode_path_segment(&site)))
            .await
    }

    pub async fn get_circuit_settings(
        &self,
        site_id: Option<&str>,
        circuit_id: Option<&str>,
    ) -> Result<CircuitSettings> {
        let path = self.circuit_settings_path(site_id, circuit_id)?;
        self.get_json(&path).await
    }

    pub async fn set_circuit_settings(
        &self,
        settings: &CircuitSettings,
        site_id: Option<&str>,
        circuit_id: Option<&str>,
    ) -> Result<CommandResponse> {
        let path = self.circuit_settings_path(site_id, circuit_id)?;
        self.transport.post(&path, serde_json::to_value(settings)?).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn charger_path(&self, charger_id: Option<&str>, suffix: &str) -> Result<String> {
        let id = self.config.resolve_id(IdKind::Charger, charger_id)?;
        Ok(format!("/api/chargers/{}/{suffix}", encode_path_segment(&id)))
    }

    fn circuit_settings_path(
        &self,
        site_id: Option<&str>,
        circuit_id: Option<&str>,
    ) -> Result<String> {
        let site = self.config.resolve_id(IdKind::Site, site_id)?;
        let circuit = self.config.resolve_id(IdKind::Circuit, circuit_id)?;
        Ok(format!(
            "/api/sites/{}/circuits/{}/settings",
            encode_path_segment(&site),
            encode_path_segment(&circuit)
        ))
    }

    async fn get_json<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T> {
        let value = self.transport.get(path).await?;
        self.project(path, value)
    }

    /// Decode a response body; `null` (the fail-soft empty result) becomes `T::default()`.
    fn project<T: DeserializeOwned + Default>(&self, path: &str, value: serde_json::Value) -> Result<T> {
        if value.is_null() {
            return Ok(T::default());
        }
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(decoded),
            Err(e) if !self.config.throw_errors_on_fault => {
                warn!(path, error = %e, "Unexpected response shape, returning empty result");
                Ok(T::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ChargerControl for EaseeClient {
    /// Unlike [`EaseeClient::get_charger_state`], an empty (fail-soft) body is
    /// an error here: no command is chosen from a state that was never read.
    async fn charger_state(&self, charger_id: &str) -> Result<ChargerState> {
        let path = self.charger_path(Some(charger_id), "state")?;
        let value = self.transport.get(&path).await?;
        if value.is_null() {
            return Err(EaseeError::InvalidState(format!(
                "state of charger {charger_id} unavailable"
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn send_command(
        &self,
        charger_id: &str,
        command: ChargerCommand,
    ) -> Result<CommandResponse> {
        EaseeClient::send_command(self, Some(charger_id), command).await
    }
}
