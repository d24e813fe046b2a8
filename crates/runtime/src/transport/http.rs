//! Request/response transport: three blocking HTTP endpoints.
//!
//! - `PUT {base}/reset-for-new-run` with the opening report
//! - `GET {base}/get-action` returning `{"action": {...} | null}`
//! - `PUT {base}/set-state` with every later report
use async_trait::async_trait;
use bridge_protocol::{Action, ActionEnvelope, StateReport};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::trace;

use super::{Endpoint, Transport};
use crate::api::TransportError;

const JSON: &str = "application/json";

/// HTTP client for the endpoint-style policy server.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn put_report(
        &self,
        endpoint: Endpoint,
        report: &StateReport,
    ) -> Result<(), TransportError> {
        let body = serde_json::to_vec(report).map_err(TransportError::Encode)?;

        trace!(target: "bridge::transport", %endpoint, bytes = body.len(), "sending report");

        self.client
            .put(self.url(endpoint))
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| TransportError::Http { endpoint, source })?;

        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn reset(&mut self, report: &StateReport) -> Result<(), TransportError> {
        self.put_report(Endpoint::Reset, report).await
    }

    async fn next_action(&mut self) -> Result<Option<Action>, TransportError> {
        let endpoint = Endpoint::GetAction;
        let body = self
            .client
            .get(self.url(endpoint))
            .header(ACCEPT, JSON)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| TransportError::Http { endpoint, source })?
            .text()
            .await
            .map_err(|source| TransportError::Http { endpoint, source })?;

        decode_action_response(&body)
    }

    async fn set_state(&mut self, report: &StateReport) -> Result<(), TransportError> {
        self.put_report(Endpoint::SetState, report).await
    }
}

/// Decodes a `get-action` response body.
fn decode_action_response(body: &str) -> Result<Option<Action>, TransportError> {
    serde_json::from_str::<ActionEnvelope>(body)
        .map(|envelope| envelope.action)
        .map_err(|source| TransportError::decode(body, source))
}
