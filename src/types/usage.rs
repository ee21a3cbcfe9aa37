use serde::{Deserialize, Serialize};

/// One hourly bucket from `/api/chargers/{id}/usage/hourly/{from}/{to}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSample {
    /// Bucket start as sent by the API (ISO-8601).
    #[serde(rename = "x")]
    pub timestamp: String,
    /// Energy in kWh.
    #[serde(rename = "y")]
    pub energy_kwh: f64,
}
