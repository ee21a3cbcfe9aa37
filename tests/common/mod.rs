//! Shared test helpers: a scripted charger and wiremock fixtures.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use easee::charging::ChargerControl;
use easee::config::{ClientOptions, EaseeConfig};
use easee::error::{EaseeError, Result};
use easee::transport::CommandResponse;
use easee::types::{ChargerCommand, ChargerState, ReasonForNoCurrent};
use easee::EaseeClient;

/// A charger that replays queued states and records every command.
///
/// The last queued state repeats once the queue is down to one entry.
pub struct MockCharger {
    states: Mutex<VecDeque<ChargerState>>,
    commands: Mutex<Vec<(String, ChargerCommand)>>,
    state_reads: Mutex<usize>,
}

impl MockCharger {
    pub fn new(reasons: &[ReasonForNoCurrent]) -> Self {
        let states = reasons
            .iter()
            .map(|reason| ChargerState {
                reason_for_no_current: *reason,
                ..Default::default()
            })
            .collect();
        Self {
            states: Mutex::new(states),
            commands: Mutex::new(Vec::new()),
            state_reads: Mutex::new(0),
        }
    }

    pub fn commands(&self) -> Vec<ChargerCommand> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(_, command)| *command)
            .collect()
    }

    pub fn state_reads(&self) -> usize {
        *self.state_reads.lock().unwrap()
    }
}

#[async_trait]
impl ChargerControl for MockCharger {
    async fn charger_state(&self, _charger_id: &str) -> Result<ChargerState> {
        *self.state_reads.lock().unwrap() += 1;
        let mut states = self.states.lock().unwrap();
        let state = if states.len() > 1 {
            states.pop_front()
        } else {
            states.front().cloned()
        };
        state.ok_or_else(|| EaseeError::api(503, "state unavailable"))
    }

    async fn send_command(
        &self,
        charger_id: &str,
        command: ChargerCommand,
    ) -> Result<CommandResponse> {
        self.commands
            .lock()
            .unwrap()
            .push((charger_id.to_string(), command));
        Ok(CommandResponse {
            status: 202,
            status_text: "Accepted".to_string(),
            data: json!({"commandId": 1}),
        })
    }
}

/// Options pointing at the mock server with valid credentials.
pub fn options(server: &MockServer) -> ClientOptions {
    ClientOptions::builder()
        .base_url(server.uri())
        .username("user@example.com")
        .password("secret")
        .charger_id("EH000001")
        .site_id("4242")
        .circuit_id("777")
        .resume_settle_delay(std::time::Duration::from_millis(10))
        .build()
}

/// Client built without reading the process environment.
pub fn client(options: ClientOptions) -> EaseeClient {
    EaseeClient::with_config(EaseeConfig::default().merge(options)).expect("client")
}

pub async fn mount_login(server: &MockServer, access_token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": access_token,
            "expiresIn": expires_in,
            "tokenType": "Bearer",
            "refreshToken": format!("{access_token}-refresh")
        })))
        .mount(server)
        .await;
}
