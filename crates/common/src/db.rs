use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Open the PostgreSQL pool shared by a dispatch run or the watchdog.
///
/// `max_connections` comes from `AppConfig::db_max_connections`. The short
/// acquire timeout keeps a scheduler-invoked batch from stalling when the
/// database is unreachable; it fails the run instead.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "Connected to PostgreSQL");
    Ok(pool)
}
