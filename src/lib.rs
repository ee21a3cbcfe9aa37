//! Easee — async client for the Easee EV charger cloud API.
//!
//! Handles login and background token refresh, wraps the charger, site and
//! circuit endpoints, and decides how to get a charger going again from its
//! `reasonForNoCurrent`.
//!
//! # Quick Start
//!
//! ```no_run
//! use easee::prelude::*;
//!
//! # async fn example() -> easee::Result<()> {
//! // Credentials and default ids come from EASEE_* env vars (or a .env file).
//! let client = EaseeClient::from_env()?;
//! let state = client.get_charger_state(None).await?;
//! println!("{} / {}", state.charger_op_mode, state.reason_for_no_current);
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod charging;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod transport;
pub mod types;

pub use client::EaseeClient;
pub use config::{ClientOptions, EaseeConfig};
pub use error::{EaseeError, Result};
