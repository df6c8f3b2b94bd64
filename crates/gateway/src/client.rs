//! WAHA gateway HTTP client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use courier_common::error::CourierError;

use crate::{ChannelSender, RawSessionStatus, SendOutcome, SessionProbe};

/// Client for a WAHA-style WhatsApp HTTP gateway.
pub struct WahaClient {
    http: reqwest::Client,
    base_url: String,
    session: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    status: String,
    #[serde(default)]
    engine: Option<EngineInfo>,
}

#[derive(Debug, Deserialize)]
struct EngineInfo {
    #[serde(default)]
    state: Option<String>,
}

impl WahaClient {
    /// Build a client against `base_url` for the given session.
    ///
    /// Every request carries `timeout`; the gateway can hang on a dead
    /// session and the batch must not hang with it.
    pub fn new(
        base_url: &str,
        session: &str,
        timeout: Duration,
    ) -> Result<Self, CourierError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CourierError::Gateway(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: session.to_string(),
        })
    }

    async fn fetch_session_status(&self) -> Result<RawSessionStatus, CourierError> {
        let url = format!("{}/api/sessions/{}", self.base_url, self.session);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CourierError::Gateway(format!("session status request: {e}")))?;

        if !response.status().is_success() {
            return Err(CourierError::Gateway(format!(
                "session status returned HTTP {}",
                response.status()
            )));
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| CourierError::Gateway(format!("session status decode: {e}")))?;

        Ok(RawSessionStatus {
            status: body.status,
            engine_state: body.engine.and_then(|e| e.state),
        })
    }

    async fn post_text(&self, chat_id: &str, body: &str) -> SendOutcome {
        // The gateway accepts messages into a dead session without error,
        // so check the session first and reject up front.
        match self.fetch_session_status().await {
            Ok(status) => {
                let connected = status.status == "WORKING"
                    && status.engine_state.as_deref() == Some("CONNECTED");
                if !connected {
                    return SendOutcome::Rejected(format!(
                        "session not active (status: {}, engine: {:?})",
                        status.status, status.engine_state
                    ));
                }
            }
            Err(e) => return SendOutcome::Rejected(e.to_string()),
        }

        let url = format!("{}/api/sendText", self.base_url);
        let payload = json!({
            "chatId": chat_id,
            "text": body,
            "session": self.session,
            "linkPreview": true,
        });

        match self.http.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => SendOutcome::Delivered,
            Ok(response) => {
                SendOutcome::Rejected(format!("gateway returned HTTP {}", response.status()))
            }
            Err(e) => SendOutcome::Rejected(format!("gateway unreachable: {e}")),
        }
    }
}

impl ChannelSender for WahaClient {
    async fn send(&self, chat_id: &str, body: &str) -> SendOutcome {
        let outcome = self.post_text(chat_id, body).await;
        if let SendOutcome::Rejected(reason) = &outcome {
            tracing::warn!(chat_id, reason, "Send rejected by gateway");
        }
        outcome
    }
}

impl SessionProbe for WahaClient {
    async fn session_status(&self) -> Result<RawSessionStatus, CourierError> {
        self.fetch_session_status().await
    }

    async fn pairing_qr(&self) -> Result<Vec<u8>, CourierError> {
        let url = format!(
            "{}/api/{}/auth/qr?format=image",
            self.base_url, self.session
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CourierError::Gateway(format!("QR fetch: {e}")))?;

        if !response.status().is_success() {
            return Err(CourierError::Gateway(format!(
                "QR fetch returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CourierError::Gateway(format!("QR body: {e}")))?;

        Ok(bytes.to_vec())
    }
}
