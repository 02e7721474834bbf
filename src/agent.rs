use crate::config::Config;
use anyhow::{Context, Result};
use tokio::time::Duration;
use uuid::Uuid;

/// Terminal outcome of one submission to the agent endpoint.
///
/// Remote and transport failures are data, not exceptions; the controller
/// matches on this instead of catching errors mid-flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// HTTP 200; the body is the assistant's reply verbatim.
    Reply(String),
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The call never completed: connection, DNS, or timeout fault.
    Unreachable(String),
}

/// Client for the remote agent endpoint.
///
/// Each turn is a single POST of the raw user text. The thread identifier
/// and access credential travel as query parameters; the agent uses the
/// thread identifier to keep durable context across turns.
#[derive(Clone)]
pub struct AgentClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AgentClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.api_url()?.to_string(),
            api_key: config.api_key()?.to_string(),
            client,
        })
    }

    /// Send one user turn and wait for the terminal outcome. Exactly one
    /// request per call; no retry.
    pub async fn send_turn(&self, thread_id: Uuid, text: &str) -> TurnOutcome {
        let result = self
            .client
            .post(&self.base_url)
            .query(&[
                ("code", self.api_key.as_str()),
                ("thread_id", &thread_id.to_string()),
            ])
            .header("Content-Type", "text/plain")
            .body(text.to_string())
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            // without_url: the URL carries the access credential and must
            // not surface in user-visible error text.
            Err(e) => return TurnOutcome::Unreachable(e.without_url().to_string()),
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            TurnOutcome::Reply(body)
        } else {
            TurnOutcome::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}
