//! Queries against the `message_queue` table.
//!
//! Candidate selection uses `FOR UPDATE SKIP LOCKED`: rows claimed by one
//! transaction are invisible to a concurrent claimant until the first
//! transaction commits or rolls back, which is what guarantees a single
//! in-flight send attempt per record. The `next_eligible_at` filter runs
//! in the WHERE clause, before any lock is taken.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use courier_common::error::CourierError;
use courier_common::types::{MessageCategory, MessageStatus, QueuedMessage};

const MESSAGE_COLUMNS: &str =
    "id, recipient, body, category, status, error_detail, created_at, sent_at, next_eligible_at";

/// Claim new work: PENDING records created since `since` whose natural key
/// (recipient, category, created-day) has no SUCCESS record yet.
pub async fn fetch_new_work(
    conn: &mut PgConnection,
    since: DateTime<Utc>,
) -> Result<Vec<QueuedMessage>, CourierError> {
    let rows: Vec<QueuedMessage> = sqlx::query_as(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM message_queue m
        WHERE m.status = 'PENDING'
          AND m.created_at >= $1
          AND (m.next_eligible_at IS NULL OR m.next_eligible_at <= NOW())
          AND NOT EXISTS (
              SELECT 1 FROM message_queue s
              WHERE s.recipient = m.recipient
                AND s.category = m.category
                AND s.status = 'SUCCESS'
                AND s.created_at::date = m.created_at::date
          )
        ORDER BY m.created_at
        FOR UPDATE OF m SKIP LOCKED
        "#
    ))
    .bind(since)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Claim retry work: records stuck in a retryable status inside the
/// lookback window whose backoff (if any) has elapsed. Records older than
/// the window are passively abandoned — never selected again.
pub async fn fetch_retry_work(
    conn: &mut PgConnection,
    since: DateTime<Utc>,
) -> Result<Vec<QueuedMessage>, CourierError> {
    let rows: Vec<QueuedMessage> = sqlx::query_as(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM message_queue
        WHERE status IN ('PENDING', 'PENDING-ERROR', 'FAILED')
          AND created_at >= $1
          AND (next_eligible_at IS NULL OR next_eligible_at <= NOW())
        ORDER BY created_at
        FOR UPDATE SKIP LOCKED
        "#
    ))
    .bind(since)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Record the outcome of one send attempt.
///
/// The transition is validated against the status table before anything is
/// written; the caller holds the row lock, so the read is stable. SUCCESS
/// clears the stored diagnostic.
pub async fn update_outcome(
    conn: &mut PgConnection,
    id: Uuid,
    next: MessageStatus,
    error_detail: Option<&str>,
    sent_at: DateTime<Utc>,
) -> Result<(), CourierError> {
    let current: Option<MessageStatus> =
        sqlx::query_scalar("SELECT status FROM message_queue WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let current = current.ok_or_else(|| CourierError::NotFound(format!("message {id}")))?;

    if !current.can_transition(next) {
        return Err(CourierError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    let error_detail = if next == MessageStatus::Success {
        None
    } else {
        error_detail
    };

    sqlx::query(
        r#"
        UPDATE message_queue
        SET status = $2, error_detail = $3, sent_at = $4
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(next)
    .bind(error_detail)
    .bind(sent_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Push a record's backoff far past any lookback horizon so neither pass
/// ever re-claims it. Used for failures that cannot self-correct, e.g. a
/// malformed recipient address.
pub async fn suspend_retries(conn: &mut PgConnection, id: Uuid) -> Result<(), CourierError> {
    sqlx::query(
        "UPDATE message_queue SET next_eligible_at = NOW() + INTERVAL '100 years' WHERE id = $1",
    )
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Producer-side insert: a new PENDING record.
pub async fn insert_message(
    conn: &mut PgConnection,
    recipient: &str,
    body: &str,
    category: MessageCategory,
) -> Result<Uuid, CourierError> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO message_queue (id, recipient, body, category, status)
        VALUES ($1, $2, $3, $4, 'PENDING')
        "#,
    )
    .bind(id)
    .bind(recipient)
    .bind(body)
    .bind(category)
    .execute(conn)
    .await?;

    Ok(id)
}
