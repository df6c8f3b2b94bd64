//! Delivery processor — claims pending records and sends them.
//!
//! A whole batch lives inside one storage transaction: a record-level send
//! failure is recorded and the batch continues, but a store fault rolls
//! back every uncommitted update and propagates to the scheduler.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use courier_common::error::CourierError;
use courier_common::types::{BatchOutcome, MessageStatus, QueuedMessage};
use courier_gateway::{ChannelSender, SendOutcome, phone};

use crate::store;

/// New-work pass over records created inside the trailing window.
pub struct DeliveryProcessor {
    window_hours: i64,
}

impl DeliveryProcessor {
    pub fn new(window_hours: i64) -> Self {
        Self { window_hours }
    }

    /// Claim and deliver one batch of new work.
    pub async fn run<S: ChannelSender>(
        &self,
        pool: &PgPool,
        sender: &S,
    ) -> Result<BatchOutcome, CourierError> {
        let mut tx = pool.begin().await?;
        let since = Utc::now() - chrono::Duration::hours(self.window_hours);
        let batch = store::fetch_new_work(&mut tx, since).await?;
        let outcome = deliver_batch(&mut tx, &batch, sender).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}

/// Deliver a claimed batch sequentially, recording each outcome in the
/// enclosing transaction.
pub async fn deliver_batch<S: ChannelSender>(
    tx: &mut Transaction<'_, Postgres>,
    batch: &[QueuedMessage],
    sender: &S,
) -> Result<BatchOutcome, CourierError> {
    let mut outcome = BatchOutcome::default();

    for msg in batch {
        let attempt_at = Utc::now();
        let attempt = attempt(msg, sender).await;

        store::update_outcome(
            &mut *tx,
            msg.id,
            attempt.status,
            attempt.detail.as_deref(),
            attempt_at,
        )
        .await?;

        // A malformed recipient will never self-correct: record the failure
        // once and push its backoff past any lookback horizon.
        if !attempt.retryable {
            store::suspend_retries(&mut *tx, msg.id).await?;
        }

        if attempt.status == MessageStatus::Success {
            tracing::info!(
                target: "courier_dispatch::sent",
                id = %msg.id,
                category = %msg.category,
                recipient = %msg.recipient,
                "Message delivered"
            );
            outcome.record(true);
        } else {
            tracing::error!(
                target: "courier_dispatch::failed",
                id = %msg.id,
                category = %msg.category,
                recipient = %msg.recipient,
                status = %attempt.status,
                error = attempt.detail.as_deref().unwrap_or(""),
                "Message delivery failed"
            );
            outcome.record(false);
        }
    }

    Ok(outcome)
}

struct Attempt {
    status: MessageStatus,
    detail: Option<String>,
    /// False for failures that cannot self-correct (validation); the
    /// record is then excluded from future retry selection.
    retryable: bool,
}

/// One send attempt. Malformed recipients fail without touching the
/// gateway; transport failures map to the category's failure status.
async fn attempt<S: ChannelSender>(msg: &QueuedMessage, sender: &S) -> Attempt {
    let chat_id = match phone::normalize(&msg.recipient) {
        Ok(chat_id) => chat_id,
        Err(e) => {
            return Attempt {
                status: msg.category.failure_status(),
                detail: Some(e.to_string()),
                retryable: false,
            };
        }
    };

    match sender.send(&chat_id, &msg.body).await {
        SendOutcome::Delivered => Attempt {
            status: MessageStatus::Success,
            detail: None,
            retryable: true,
        },
        SendOutcome::Rejected(reason) => Attempt {
            status: msg.category.failure_status(),
            detail: Some(format!("WhatsApp API Error: {reason}")),
            retryable: true,
        },
    }
}
