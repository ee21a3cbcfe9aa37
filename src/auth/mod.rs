//! Account login, token refresh and session state.

pub mod error;
pub mod session;
pub mod token;

pub use error::AuthError;
pub use session::{refresh_delay, SessionManager, REFRESH_MARGIN};
pub use token::{Credentials, Session};
