use std::time::Duration;

use courier_common::config::AppConfig;
use courier_gateway::client::WahaClient;
use courier_gateway::mailer::AlertMailer;
use courier_monitor::cooldown::AlertCooldown;
use courier_monitor::watchdog::GatewayWatchdog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_monitor=info,courier_gateway=info".into()),
        )
        .json()
        .init();

    tracing::info!("Courier monitor starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let email_service = config
        .email_service
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("EMAIL_SERVICE environment variable is required"))?;
    let alert_email = config
        .alert_email
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("WAHA_ALERT_EMAIL environment variable is required"))?;

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let probe = WahaClient::new(&config.waha_host, &config.waha_session, timeout)?;
    let mailer = AlertMailer::new(email_service, alert_email, timeout)?;
    let cooldown = AlertCooldown::new(chrono::Duration::seconds(
        config.alert_interval_secs as i64,
    ));

    let mut watchdog = GatewayWatchdog::new(
        probe,
        mailer,
        cooldown,
        config.waha_session.clone(),
        config.waha_host.clone(),
        config.business_start,
        config.business_end,
        config.business_timezone,
    );

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = watchdog.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Watchdog exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("Courier monitor stopped.");
    Ok(())
}
