//! API data models.

pub mod account;
pub mod charger;
pub mod command;
pub mod site;
pub mod usage;

pub use account::Profile;
pub use charger::{Charger, ChargerOpMode, ChargerState, ChargingSession, ReasonForNoCurrent};
pub use command::ChargerCommand;
pub use site::{Circuit, CircuitSettings, ContactInfo, Site};
pub use usage::UsageSample;

/// The API sends identifiers as numbers for sites/circuits and strings for
/// chargers; both land in a `String`.
pub(crate) mod id_string {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Float(f) => f.to_string(),
        })
    }
}
