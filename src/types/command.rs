use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Commands accepted by `/api/chargers/{id}/commands/{command}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChargerCommand {
    StartCharging,
    StopCharging,
    PauseCharging,
    ResumeCharging,
    ToggleCharging,
    OverrideSchedule,
    Reboot,
    UpdateFirmware,
}
