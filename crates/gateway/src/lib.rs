//! HTTP collaborators of the delivery pipeline: the WAHA messaging gateway
//! and the alert-mail service. The traits here are the seams the dispatch
//! and monitor crates program against; tests substitute in-memory fakes.

pub mod client;
pub mod mailer;
pub mod phone;

use courier_common::error::CourierError;

/// Result of handing a message to the gateway.
///
/// Transport-level failures (unreachable gateway, non-2xx, inactive session)
/// are all `Rejected` — they are the retryable path, never a crate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Rejected(String),
}

/// Raw session status as reported by the gateway, before classification.
#[derive(Debug, Clone)]
pub struct RawSessionStatus {
    pub status: String,
    pub engine_state: Option<String>,
}

/// Capability to deliver one message over the channel.
///
/// `chat_id` is an already-normalized channel address (see [`phone`]).
pub trait ChannelSender {
    fn send(
        &self,
        chat_id: &str,
        body: &str,
    ) -> impl Future<Output = SendOutcome> + Send;
}

/// Capability to observe the gateway session.
pub trait SessionProbe {
    fn session_status(
        &self,
    ) -> impl Future<Output = Result<RawSessionStatus, CourierError>> + Send;

    /// Fetch the pairing QR image (PNG bytes).
    fn pairing_qr(&self) -> impl Future<Output = Result<Vec<u8>, CourierError>> + Send;
}

/// Capability to deliver an operator alert. Returns whether the alert was
/// actually dispatched.
pub trait AlertTransport {
    fn notify(
        &self,
        subject: &str,
        body: &str,
        attachment: Option<&[u8]>,
    ) -> impl Future<Output = bool> + Send;
}
