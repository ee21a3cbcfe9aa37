//! Start-or-resume decision logic on top of charger state and commands.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info};

use crate::error::Result;
use crate::transport::CommandResponse;
use crate::types::{ChargerCommand, ChargerState, ReasonForNoCurrent};

/// Last attempt index of the resume-then-recheck cycle.
pub const FINAL_ATTEMPT: u8 = 1;

/// The two calls the orchestrator needs from a client.
#[async_trait]
pub trait ChargerControl: Send + Sync {
    async fn charger_state(&self, charger_id: &str) -> Result<ChargerState>;

    async fn send_command(
        &self,
        charger_id: &str,
        command: ChargerCommand,
    ) -> Result<CommandResponse>;
}

/// What a start-or-resume call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChargeStatus {
    AlreadyStarted,
    FullyChargedOrScheduled,
    NotConnected,
    ScheduleOverridden,
    Resumed,
    Started,
}

impl ChargeStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::AlreadyStarted => "Charging already started",
            Self::FullyChargedOrScheduled => "EV is fully charged or held back by its own schedule",
            Self::NotConnected => "No EV connected",
            Self::ScheduleOverridden => "Charging schedule overridden",
            Self::Resumed => "Paused charging resumed",
            Self::Started => "Start command sent",
        }
    }
}

/// Next step for a given `reasonForNoCurrent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Report(ChargeStatus),
    Issue(ChargerCommand),
}

pub fn decide(reason: ReasonForNoCurrent) -> Action {
    match reason {
        ReasonForNoCurrent::Ok => Action::Report(ChargeStatus::AlreadyStarted),
        ReasonForNoCurrent::WaitingInFully => Action::Report(ChargeStatus::FullyChargedOrScheduled),
        ReasonForNoCurrent::SecondaryUnitNotRequestingCurrent => {
            Action::Report(ChargeStatus::NotConnected)
        }
        ReasonForNoCurrent::PendingScheduledCharging => {
            Action::Issue(ChargerCommand::OverrideSchedule)
        }
        ReasonForNoCurrent::MaxDynamicChargerCurrentTooLow => {
            Action::Issue(ChargerCommand::ResumeCharging)
        }
        _ => Action::Issue(ChargerCommand::StartCharging),
    }
}

/// Result of [`start_or_resume_charging`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeOutcome {
    pub status: ChargeStatus,
    pub message: String,
    /// Reason code observed on the last state read.
    pub reason: ReasonForNoCurrent,
    pub command: Option<ChargerCommand>,
    pub response: Option<CommandResponse>,
}

impl ChargeOutcome {
    fn new(
        status: ChargeStatus,
        reason: ReasonForNoCurrent,
        sent: Option<(ChargerCommand, CommandResponse)>,
    ) -> Self {
        let (command, response) = match sent {
            Some((command, response)) => (Some(command), Some(response)),
            None => (None, None),
        };
        Self {
            status,
            message: status.message().to_string(),
            reason,
            command,
            response,
        }
    }
}

fn status_for(command: ChargerCommand) -> ChargeStatus {
    match command {
        ChargerCommand::OverrideSchedule => ChargeStatus::ScheduleOverridden,
        ChargerCommand::ResumeCharging => ChargeStatus::Resumed,
        _ => ChargeStatus::Started,
    }
}

/// Get a charger drawing current, whatever is currently holding it back.
///
/// A paused charger (`MaxDynamicChargerCurrentTooLow`) is resumed, given
/// `settle_delay` to update its state, and re-checked once. If it still reads
/// as paused, a second resume is sent and its result returned. At most two
/// resume commands are ever issued.
pub async fn start_or_resume_charging(
    control: &dyn ChargerControl,
    charger_id: &str,
    settle_delay: Duration,
) -> Result<ChargeOutcome> {
    start_or_resume_from_attempt(control, charger_id, settle_delay, 0).await
}

/// As [`start_or_resume_charging`], entering the cycle at `attempt`
/// (values above [`FINAL_ATTEMPT`] are treated as final).
pub async fn start_or_resume_from_attempt(
    control: &dyn ChargerControl,
    charger_id: &str,
    settle_delay: Duration,
    attempt: u8,
) -> Result<ChargeOutcome> {
    let mut attempt = attempt.min(FINAL_ATTEMPT);
    loop {
        let state = control.charger_state(charger_id).await?;
        let reason = state.reason_for_no_current;
        debug!(charger_id, %reason, attempt, "Deciding start action");

        let command = match decide(reason) {
            Action::Report(status) => {
                info!(charger_id, %status, "No command needed");
                return Ok(ChargeOutcome::new(status, reason, None));
            }
            Action::Issue(command) => command,
        };

        let response = control.send_command(charger_id, command).await?;
        info!(charger_id, %command, status = response.status, "Command sent");

        if command != ChargerCommand::ResumeCharging {
            return Ok(ChargeOutcome::new(
                status_for(command),
                reason,
                Some((command, response)),
            ));
        }

        tokio::time::sleep(settle_delay).await;
        if attempt >= FINAL_ATTEMPT {
            return Ok(ChargeOutcome::new(
                ChargeStatus::Resumed,
                reason,
                Some((command, response)),
            ));
        }
        attempt += 1;
    }
}
