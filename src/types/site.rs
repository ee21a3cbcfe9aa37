//! Sites, their circuits and circuit current settings.

use serde::{Deserialize, Serialize};

use super::charger::Charger;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub owner_name: Option<String>,
    pub owner_phone_number: Option<String>,
    pub company: Option<String>,
}

/// A physical location grouping circuits and chargers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Site {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub name: Option<String>,
    pub site_key: Option<String>,
    pub rated_current: Option<f64>,
    pub contact_info: Option<ContactInfo>,
    pub circuits: Vec<Circuit>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A shared fuse grouping one or more chargers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Circuit {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub site_id: String,
    pub panel_name: Option<String>,
    pub rated_current: Option<f64>,
    pub use_dynamic_master: Option<bool>,
    pub chargers: Vec<Charger>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Circuit current limits, per phase. Unset fields are left out of updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircuitSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_circuit_current_p1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_circuit_current_p2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_circuit_current_p3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_circuit_current_p1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_circuit_current_p2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_circuit_current_p3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_max_circuit_current_p1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_max_circuit_current_p2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_max_circuit_current_p3: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CircuitSettings {
    /// Same max and offline-max current on all three phases.
    pub fn uniform_max_current(amps: f64) -> Self {
        Self {
            max_circuit_current_p1: Some(amps),
            max_circuit_current_p2: Some(amps),
            max_circuit_current_p3: Some(amps),
            offline_max_circuit_current_p1: Some(amps),
            offline_max_circuit_current_p2: Some(amps),
            offline_max_circuit_current_p3: Some(amps),
            ..Self::default()
        }
    }
}
