//! Retry sweeper — re-attempts records stuck in error states.
//!
//! Runs before the new-work pass so the backlog drains first. Selection is
//! bounded by the lookback window; what falls outside it is abandoned
//! rather than marked, and simply never selected again.

use chrono::Utc;
use sqlx::PgPool;

use courier_common::error::CourierError;
use courier_common::types::BatchOutcome;
use courier_gateway::ChannelSender;

use crate::processor::deliver_batch;
use crate::store;

pub struct RetrySweeper {
    lookback_hours: i64,
}

impl RetrySweeper {
    pub fn new(lookback_hours: i64) -> Self {
        Self { lookback_hours }
    }

    /// Claim and re-attempt one batch of retry candidates.
    pub async fn run<S: ChannelSender>(
        &self,
        pool: &PgPool,
        sender: &S,
    ) -> Result<BatchOutcome, CourierError> {
        let mut tx = pool.begin().await?;
        let since = Utc::now() - chrono::Duration::hours(self.lookback_hours);
        let batch = store::fetch_retry_work(&mut tx, since).await?;
        let outcome = deliver_batch(&mut tx, &batch, sender).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}
