use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the WAHA gateway (e.g. http://localhost:3000)
    pub waha_host: String,

    /// Gateway session identifier
    pub waha_session: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// URL of the HTTP email service used for operator alerts
    pub email_service: Option<String>,

    /// Recipient address for operator alerts
    pub alert_email: Option<String>,

    /// Business hours start (0-23, local time)
    pub business_start: u32,

    /// Business hours end (0-23, local time)
    pub business_end: u32,

    /// Timezone the business-hours window is evaluated in
    pub business_timezone: chrono_tz::Tz,

    /// Minimum interval between disconnect alerts, in seconds (default: 3600)
    pub alert_interval_secs: u64,

    /// How far back retry candidates are selected, in hours (default: 24)
    pub retry_lookback_hours: i64,

    /// Review link rendered into review-request messages
    pub google_review_link: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Timeout applied to every outbound HTTP request, in seconds (default: 30)
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            waha_host: std::env::var("WAHA_HOST")
                .map_err(|_| anyhow::anyhow!("WAHA_HOST environment variable is required"))?,
            waha_session: std::env::var("WAHA_SESSION")
                .unwrap_or_else(|_| "default".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            email_service: std::env::var("EMAIL_SERVICE").ok(),
            alert_email: std::env::var("WAHA_ALERT_EMAIL").ok(),
            business_start: std::env::var("BUSINESS_START")
                .unwrap_or_else(|_| "9".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BUSINESS_START must be an hour (0-23)"))?,
            business_end: std::env::var("BUSINESS_END")
                .unwrap_or_else(|_| "18".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BUSINESS_END must be an hour (0-23)"))?,
            business_timezone: std::env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Kolkata".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BUSINESS_TIMEZONE must be a valid IANA zone"))?,
            alert_interval_secs: std::env::var("ALERT_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ALERT_INTERVAL_SECS must be a valid u64"))?,
            retry_lookback_hours: std::env::var("RETRY_LOOKBACK_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_LOOKBACK_HOURS must be a valid i64"))?,
            google_review_link: std::env::var("GOOGLE_REVIEW_LINK")
                .unwrap_or_else(|_| "https://g.page/r/default-review-link".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a valid u64"))?,
        };

        if config.business_start >= 24 || config.business_end > 24 {
            anyhow::bail!("BUSINESS_START/BUSINESS_END must be hours within a day");
        }
        if config.business_start >= config.business_end {
            anyhow::bail!("BUSINESS_START must be earlier than BUSINESS_END");
        }

        Ok(config)
    }
}
