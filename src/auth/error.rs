use thiserror::Error;

use crate::error::EaseeError;

/// Failures while obtaining or renewing a session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username or password missing")]
    MissingCredentials,
    #[error("Login response contained no access token")]
    NoToken,
    #[error("Credentials rejected (status {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<AuthError> for EaseeError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Network(e) => EaseeError::Network(e),
            other => EaseeError::Authentication(other.to_string()),
        }
    }
}
