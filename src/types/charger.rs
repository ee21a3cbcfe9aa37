//! Charger listings, live state and the status enums the API reports.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Coarse operating state of a charger (`chargerOpMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(from = "i64", into = "i64")]
pub enum ChargerOpMode {
    #[default]
    Offline,
    Disconnected,
    AwaitingStart,
    Charging,
    Completed,
    Error,
    ReadyToCharge,
    /// A code this library does not know yet.
    Other(i64),
}

impl From<i64> for ChargerOpMode {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::Disconnected,
            2 => Self::AwaitingStart,
            3 => Self::Charging,
            4 => Self::Completed,
            5 => Self::Error,
            6 => Self::ReadyToCharge,
            other => Self::Other(other),
        }
    }
}

impl From<ChargerOpMode> for i64 {
    fn from(mode: ChargerOpMode) -> Self {
        match mode {
            ChargerOpMode::Offline => 0,
            ChargerOpMode::Disconnected => 1,
            ChargerOpMode::AwaitingStart => 2,
            ChargerOpMode::Charging => 3,
            ChargerOpMode::Completed => 4,
            ChargerOpMode::Error => 5,
            ChargerOpMode::ReadyToCharge => 6,
            ChargerOpMode::Other(code) => code,
        }
    }
}

/// Why a charger is not drawing current (`reasonForNoCurrent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(from = "i64", into = "i64")]
pub enum ReasonForNoCurrent {
    /// Charger is allocated current.
    Ok,
    MaxCircuitCurrentTooLow,
    MaxDynamicCircuitCurrentTooLow,
    MaxDynamicOfflineFallbackCircuitCurrentTooLow,
    CircuitFuseTooLow,
    WaitingInQueue,
    /// EV finished or is delaying the charge itself.
    WaitingInFully,
    IllegalGridType,
    PrimaryUnitHasNotReceivedCurrentRequestFromSecondaryUnit,
    /// No car connected.
    SecondaryUnitNotRequestingCurrent,
    MaxChargerCurrentTooLow,
    /// Paused: dynamic charger current set to zero.
    MaxDynamicChargerCurrentTooLow,
    ChargerDisabled,
    /// Held back by a schedule.
    PendingScheduledCharging,
    PendingAuthorization,
    ChargerInErrorState,
    #[default]
    Undefined,
    Other(i64),
}

impl From<i64> for ReasonForNoCurrent {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::MaxCircuitCurrentTooLow,
            2 => Self::MaxDynamicCircuitCurrentTooLow,
            3 => Self::MaxDynamicOfflineFallbackCircuitCurrentTooLow,
            4 => Self::CircuitFuseTooLow,
            5 => Self::WaitingInQueue,
            6 => Self::WaitingInFully,
            7 => Self::IllegalGridType,
            8 => Self::PrimaryUnitHasNotReceivedCurrentRequestFromSecondaryUnit,
            50 => Self::SecondaryUnitNotRequestingCurrent,
            51 => Self::MaxChargerCurrentTooLow,
            52 => Self::MaxDynamicChargerCurrentTooLow,
            53 => Self::ChargerDisabled,
            54 => Self::PendingScheduledCharging,
            55 => Self::PendingAuthorization,
            56 => Self::ChargerInErrorState,
            100 => Self::Undefined,
            other => Self::Other(other),
        }
    }
}

impl From<ReasonForNoCurrent> for i64 {
    fn from(reason: ReasonForNoCurrent) -> Self {
        use ReasonForNoCurrent::*;
        match reason {
            Ok => 0,
            MaxCircuitCurrentTooLow => 1,
            MaxDynamicCircuitCurrentTooLow => 2,
            MaxDynamicOfflineFallbackCircuitCurrentTooLow => 3,
            CircuitFuseTooLow => 4,
            WaitingInQueue => 5,
            WaitingInFully => 6,
            IllegalGridType => 7,
            PrimaryUnitHasNotReceivedCurrentRequestFromSecondaryUnit => 8,
            SecondaryUnitNotRequestingCurrent => 50,
            MaxChargerCurrentTooLow => 51,
            MaxDynamicChargerCurrentTooLow => 52,
            ChargerDisabled => 53,
            PendingScheduledCharging => 54,
            PendingAuthorization => 55,
            ChargerInErrorState => 56,
            Undefined => 100,
            Other(code) => code,
        }
    }
}

/// Live snapshot from `/api/chargers/{id}/state`.
///
/// Only the fields the client reasons about are typed; the rest of the
/// payload is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargerState {
    pub charger_op_mode: ChargerOpMode,
    pub reason_for_no_current: ReasonForNoCurrent,
    pub is_online: Option<bool>,
    pub cable_locked: Option<bool>,
    pub total_power: Option<f64>,
    pub session_energy: Option<f64>,
    pub output_current: Option<f64>,
    pub dynamic_charger_current: Option<f64>,
    pub circuit_total_phase_conductor_current_l1: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChargerState {
    /// An EV cable is plugged in (the charger is neither offline nor disconnected).
    pub fn is_cable_connected(&self) -> bool {
        !matches!(
            self.charger_op_mode,
            ChargerOpMode::Offline | ChargerOpMode::Disconnected
        )
    }
}

/// Entry from `/api/chargers`, or a charger nested in a site circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Charger {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub name: Option<String>,
    pub product_code: Option<i64>,
    pub level_of_access: Option<i64>,
    pub created_on: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Latest charging session from `/api/chargers/{id}/sessions/latest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargingSession {
    pub session_id: Option<i64>,
    pub session_energy: Option<f64>,
    pub session_start: Option<String>,
    pub session_end: Option<String>,
    pub charge_duration_in_seconds: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
