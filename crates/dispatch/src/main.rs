use std::time::Duration;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use courier_common::config::AppConfig;
use courier_common::db;
use courier_dispatch::processor::DeliveryProcessor;
use courier_dispatch::reviews;
use courier_dispatch::sweeper::RetrySweeper;
use courier_gateway::client::WahaClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_dispatch=info,courier_gateway=info".into()),
        )
        .json()
        .init();

    tracing::info!("Courier dispatch run starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let sender = WahaClient::new(
        &config.waha_host,
        &config.waha_session,
        Duration::from_secs(config.http_timeout_secs),
    )?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("dispatch_run", run_id = %run_id);

    async {
        // Seed review requests for yesterday's registrations
        let yesterday = (Utc::now().with_timezone(&config.business_timezone)
            - chrono::Duration::days(1))
        .date_naive();
        let seeded =
            reviews::seed_review_requests(&pool, &config.google_review_link, yesterday).await?;
        tracing::info!(seeded, "Review-request seeding finished");

        // Retry pass first so backlog does not compound
        let retried = RetrySweeper::new(config.retry_lookback_hours)
            .run(&pool, &sender)
            .await?;
        tracing::info!(
            processed = retried.processed,
            succeeded = retried.succeeded,
            failed = retried.failed,
            "Retry pass finished"
        );

        // New-work pass
        let delivered = DeliveryProcessor::new(config.retry_lookback_hours)
            .run(&pool, &sender)
            .await?;
        tracing::info!(
            processed = delivered.processed,
            succeeded = delivered.succeeded,
            failed = delivered.failed,
            "New-work pass finished"
        );

        anyhow::Ok(())
    }
    .instrument(span)
    .await?;

    tracing::info!("Courier dispatch run finished.");
    Ok(())
}
