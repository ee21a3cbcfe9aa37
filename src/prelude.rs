//! Convenience re-exports for common use.

pub use crate::charging::{ChargeOutcome, ChargeStatus, ChargerControl};
pub use crate::client::EaseeClient;
pub use crate::config::{ClientOptions, EaseeConfig};
pub use crate::error::{EaseeError, Result};
pub use crate::transport::CommandResponse;
pub use crate::types::{
    Charger, ChargerCommand, ChargerOpMode, ChargerState, CircuitSettings, ReasonForNoCurrent,
    Site,
};
