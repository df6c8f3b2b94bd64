//! HTTP alert-mail transport.
//!
//! Operator alerts go through a small mail relay service that accepts a JSON
//! payload and does the SMTP work itself. Attachments (the pairing QR) ride
//! along base64-encoded.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use courier_common::error::CourierError;

use crate::AlertTransport;

/// Mail client posting to the alert relay service.
pub struct AlertMailer {
    http: reqwest::Client,
    endpoint: String,
    to_email: String,
}

impl AlertMailer {
    pub fn new(
        endpoint: &str,
        to_email: &str,
        timeout: Duration,
    ) -> Result<Self, CourierError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CourierError::Mail(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            to_email: to_email.to_string(),
        })
    }
}

impl AlertTransport for AlertMailer {
    async fn notify(&self, subject: &str, body: &str, attachment: Option<&[u8]>) -> bool {
        let mut payload = json!({
            "to_email": self.to_email,
            "subject": subject,
            "body": body,
        });
        if let Some(bytes) = attachment {
            payload["image"] = json!(BASE64.encode(bytes));
        }

        match self.http.post(&self.endpoint).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(subject, "Alert mail dispatched");
                true
            }
            Ok(response) => {
                tracing::error!(
                    subject,
                    status = %response.status(),
                    "Alert mail rejected by relay"
                );
                false
            }
            Err(e) => {
                tracing::error!(subject, error = %e, "Alert mail sending failed");
                false
            }
        }
    }
}
