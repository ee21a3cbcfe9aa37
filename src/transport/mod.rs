//! Authenticated JSON transport to the cloud API.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Outcome of a POST, mirroring what the API sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// HTTP status; zero when the request never produced one.
    pub status: u16,
    pub status_text: String,
    pub data: serde_json::Value,
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET/POST against API paths with the session's bearer token attached.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<serde_json::Value>;

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<CommandResponse>;
}
