use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of outbound messages carried by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCategory {
    Registration,
    Appointment,
    ReviewRequest,
    StockAlert,
}

impl MessageCategory {
    /// Status a record lands in after a transient send failure.
    ///
    /// Stock alerts are synchronously rejected by the gateway and go
    /// straight to `Failed`; patient-facing categories stay retryable.
    pub fn failure_status(self) -> MessageStatus {
        match self {
            MessageCategory::StockAlert => MessageStatus::Failed,
            _ => MessageStatus::PendingError,
        }
    }
}

impl std::fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageCategory::Registration => write!(f, "REGISTRATION"),
            MessageCategory::Appointment => write!(f, "APPOINTMENT"),
            MessageCategory::ReviewRequest => write!(f, "REVIEW_REQUEST"),
            MessageCategory::StockAlert => write!(f, "STOCK_ALERT"),
        }
    }
}

/// Delivery status of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum MessageStatus {
    #[sqlx(rename = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "SUCCESS")]
    #[serde(rename = "SUCCESS")]
    Success,
    #[sqlx(rename = "PENDING-ERROR")]
    #[serde(rename = "PENDING-ERROR")]
    PendingError,
    #[sqlx(rename = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
}

impl MessageStatus {
    /// Whether a transition from `self` to `next` is a legal outcome of a
    /// send attempt. `Success` is terminal; nothing ever moves back to
    /// `Pending` once an attempt has been recorded.
    pub fn can_transition(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        match (self, next) {
            (Success, _) => false,
            (_, Pending) => false,
            (Pending, Success) | (Pending, PendingError) | (Pending, Failed) => true,
            (PendingError, Success) | (PendingError, PendingError) => true,
            (PendingError, Failed) => false,
            (Failed, Success) | (Failed, PendingError) | (Failed, Failed) => true,
        }
    }

    /// Statuses that make a record a retry candidate.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            MessageStatus::Pending | MessageStatus::PendingError | MessageStatus::Failed
        )
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "PENDING"),
            MessageStatus::Success => write!(f, "SUCCESS"),
            MessageStatus::PendingError => write!(f, "PENDING-ERROR"),
            MessageStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// A row of the outbound message queue. Rows are the audit trail and are
/// never deleted; only `status`, `error_detail` and `sent_at` mutate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueuedMessage {
    pub id: Uuid,
    pub recipient: String,
    pub body: String,
    pub category: MessageCategory,
    pub status: MessageStatus,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub next_eligible_at: Option<DateTime<Utc>>,
}

/// Per-batch counters reported by a processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl BatchOutcome {
    pub fn record(&mut self, succeeded: bool) {
        self.processed += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Classified health of the gateway session. Not persisted — sampled each
/// monitor cycle from the raw `{status, engine.state}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHealth {
    Connected,
    AwaitingPairing,
    Disconnected,
}

impl SessionHealth {
    /// Classify the gateway's raw session status.
    ///
    /// `SCAN_QR_CODE` means the session lost its pairing and needs a QR
    /// scan; `WORKING` with engine state `CONNECTED` is healthy; everything
    /// else is treated as disconnected.
    pub fn classify(status: &str, engine_state: Option<&str>) -> SessionHealth {
        match status {
            "SCAN_QR_CODE" => SessionHealth::AwaitingPairing,
            "WORKING" if engine_state == Some("CONNECTED") => SessionHealth::Connected,
            _ => SessionHealth::Disconnected,
        }
    }
}

impl std::fmt::Display for SessionHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionHealth::Connected => write!(f, "CONNECTED"),
            SessionHealth::AwaitingPairing => write!(f, "AWAITING_PAIRING"),
            SessionHealth::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_terminal() {
        use MessageStatus::*;
        for next in [Pending, Success, PendingError, Failed] {
            assert!(!Success.can_transition(next));
        }
    }

    #[test]
    fn test_nothing_returns_to_pending() {
        use MessageStatus::*;
        for from in [Pending, Success, PendingError, Failed] {
            assert!(!from.can_transition(Pending));
        }
    }

    #[test]
    fn test_retry_edges() {
        use MessageStatus::*;
        assert!(Pending.can_transition(Success));
        assert!(Pending.can_transition(PendingError));
        assert!(Pending.can_transition(Failed));
        assert!(PendingError.can_transition(Success));
        assert!(PendingError.can_transition(PendingError));
        // A retryable record never regresses to FAILED on a transient error
        assert!(!PendingError.can_transition(Failed));
        assert!(Failed.can_transition(Success));
        assert!(Failed.can_transition(Failed));
    }

    #[test]
    fn test_failure_status_per_category() {
        assert_eq!(
            MessageCategory::StockAlert.failure_status(),
            MessageStatus::Failed
        );
        for category in [
            MessageCategory::Registration,
            MessageCategory::Appointment,
            MessageCategory::ReviewRequest,
        ] {
            assert_eq!(category.failure_status(), MessageStatus::PendingError);
        }
    }

    #[test]
    fn test_classify_connected() {
        assert_eq!(
            SessionHealth::classify("WORKING", Some("CONNECTED")),
            SessionHealth::Connected
        );
    }

    #[test]
    fn test_classify_awaiting_pairing() {
        assert_eq!(
            SessionHealth::classify("SCAN_QR_CODE", None),
            SessionHealth::AwaitingPairing
        );
    }

    #[test]
    fn test_classify_disconnected() {
        assert_eq!(
            SessionHealth::classify("WORKING", Some("OPENING")),
            SessionHealth::Disconnected
        );
        assert_eq!(
            SessionHealth::classify("STOPPED", None),
            SessionHealth::Disconnected
        );
        assert_eq!(
            SessionHealth::classify("FAILED", Some("CONNECTED")),
            SessionHealth::Disconnected
        );
    }
}
