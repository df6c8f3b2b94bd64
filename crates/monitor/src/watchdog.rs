//! The gateway watchdog loop.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use courier_common::error::CourierError;
use courier_common::types::SessionHealth;
use courier_gateway::{AlertTransport, SessionProbe};

use crate::cooldown::AlertCooldown;
use crate::schedule;

/// Backoff after a failed cycle (5 minutes).
const ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_secs(300);

/// Watchdog over the gateway session.
pub struct GatewayWatchdog<P, M> {
    probe: P,
    mailer: M,
    cooldown: AlertCooldown,
    session_name: String,
    gateway_host: String,
    business_start: u32,
    business_end: u32,
    timezone: Tz,
}

impl<P: SessionProbe, M: AlertTransport> GatewayWatchdog<P, M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        probe: P,
        mailer: M,
        cooldown: AlertCooldown,
        session_name: String,
        gateway_host: String,
        business_start: u32,
        business_end: u32,
        timezone: Tz,
    ) -> Self {
        Self {
            probe,
            mailer,
            cooldown,
            session_name,
            gateway_host,
            business_start,
            business_end,
            timezone,
        }
    }

    /// Run the watchdog indefinitely. A failed cycle is logged and followed
    /// by a fixed backoff; the loop itself never terminates on error.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            session = %self.session_name,
            start = self.business_start,
            end = self.business_end,
            timezone = %self.timezone,
            "Gateway watchdog started"
        );

        loop {
            let now = Utc::now().with_timezone(&self.timezone);
            match self.run_cycle(now).await {
                Ok(wake_at) => {
                    let sleep_for = (wake_at - Utc::now().with_timezone(&self.timezone))
                        .to_std()
                        .unwrap_or_default();
                    tracing::info!(wake_at = %wake_at, "Sleeping until next check");
                    tokio::time::sleep(sleep_for).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Monitoring cycle error");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    /// One watchdog cycle at local time `now`. Returns when the next cycle
    /// is due.
    pub async fn run_cycle(&mut self, now: DateTime<Tz>) -> Result<DateTime<Tz>, CourierError> {
        if schedule::in_business_hours(&now, self.business_start, self.business_end) {
            self.check_session(now).await?;
        }
        Ok(schedule::next_wake(
            &now,
            self.business_start,
            self.business_end,
        ))
    }

    async fn check_session(&mut self, now: DateTime<Tz>) -> Result<(), CourierError> {
        let raw = self.probe.session_status().await?;
        let health = SessionHealth::classify(&raw.status, raw.engine_state.as_deref());

        tracing::info!(
            health = %health,
            status = %raw.status,
            engine = raw.engine_state.as_deref().unwrap_or("unknown"),
            "Gateway session checked"
        );

        match health {
            SessionHealth::Connected => {}
            SessionHealth::AwaitingPairing => self.send_pairing_alert(now).await,
            SessionHealth::Disconnected => self.send_disconnect_alert(now).await,
        }

        Ok(())
    }

    /// Pairing requests are rare and always actionable, so they bypass the
    /// cooldown.
    async fn send_pairing_alert(&mut self, now: DateTime<Tz>) {
        let qr = match self.probe.pairing_qr().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch pairing QR image");
                None
            }
        };

        let body = format!(
            "Gateway session requires a QR code scan.\n\
             Please scan the attached QR code using the WhatsApp mobile app.\n\
             Check time: {}",
            now.format("%Y-%m-%d %H:%M:%S %Z")
        );

        let sent = self
            .mailer
            .notify("WAHA QR Code Required", &body, qr.as_deref())
            .await;
        if sent {
            tracing::info!("Pairing alert sent");
        }
    }

    async fn send_disconnect_alert(&mut self, now: DateTime<Tz>) {
        let now_utc = now.with_timezone(&Utc);
        if !self.cooldown.ready(now_utc) {
            tracing::debug!("Disconnect alert suppressed — in cooldown");
            return;
        }

        let body = format!(
            "Gateway session '{}' is DISCONNECTED.\n\
             Last check time: {}\n\
             Host: {}\n\
             Please check the gateway service.",
            self.session_name,
            now.format("%Y-%m-%d %H:%M:%S %Z"),
            self.gateway_host
        );

        if self
            .mailer
            .notify("WAHA Session Alert", &body, None)
            .await
        {
            self.cooldown.record(now_utc);
            tracing::info!("Disconnect alert sent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Asia::Kolkata;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use courier_gateway::RawSessionStatus;

    struct FakeProbe {
        status: Mutex<RawSessionStatus>,
        qr_fetches: AtomicUsize,
    }

    impl FakeProbe {
        fn new(status: &str, engine: Option<&str>) -> Self {
            Self {
                status: Mutex::new(RawSessionStatus {
                    status: status.to_string(),
                    engine_state: engine.map(String::from),
                }),
                qr_fetches: AtomicUsize::new(0),
            }
        }
    }

    impl SessionProbe for &FakeProbe {
        async fn session_status(&self) -> Result<RawSessionStatus, CourierError> {
            Ok(self.status.lock().unwrap().clone())
        }

        async fn pairing_qr(&self) -> Result<Vec<u8>, CourierError> {
            self.qr_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0x89, 0x50, 0x4e, 0x47])
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        sent: Mutex<Vec<(String, bool)>>,
    }

    impl AlertTransport for &FakeMailer {
        async fn notify(&self, subject: &str, _body: &str, attachment: Option<&[u8]>) -> bool {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), attachment.is_some()));
            true
        }
    }

    fn watchdog<'a>(
        probe: &'a FakeProbe,
        mailer: &'a FakeMailer,
    ) -> GatewayWatchdog<&'a FakeProbe, &'a FakeMailer> {
        GatewayWatchdog::new(
            probe,
            mailer,
            AlertCooldown::new(Duration::seconds(3600)),
            "default".to_string(),
            "http://localhost:3000".to_string(),
            9,
            18,
            Kolkata,
        )
    }

    fn business_time() -> DateTime<Tz> {
        Kolkata.with_ymd_and_hms(2025, 3, 10, 10, 15, 0).unwrap()
    }

    #[tokio::test]
    async fn test_healthy_session_sends_nothing() {
        let probe = FakeProbe::new("WORKING", Some("CONNECTED"));
        let mailer = FakeMailer::default();
        let mut wd = watchdog(&probe, &mailer);

        wd.run_cycle(business_time()).await.unwrap();
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_alerts_once_within_cooldown() {
        let probe = FakeProbe::new("STOPPED", None);
        let mailer = FakeMailer::default();
        let mut wd = watchdog(&probe, &mailer);

        let start = business_time();
        for i in 0..10 {
            wd.run_cycle(start + Duration::seconds(i * 6)).await.unwrap();
        }

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "WAHA Session Alert");
    }

    #[tokio::test]
    async fn test_pairing_alert_bypasses_cooldown_and_attaches_qr() {
        let probe = FakeProbe::new("SCAN_QR_CODE", None);
        let mailer = FakeMailer::default();
        let mut wd = watchdog(&probe, &mailer);

        let start = business_time();
        wd.run_cycle(start).await.unwrap();
        wd.run_cycle(start + Duration::seconds(10)).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(subject, has_qr)| {
            subject == "WAHA QR Code Required" && *has_qr
        }));
        assert_eq!(probe.qr_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_outside_business_hours_skips_probe() {
        let probe = FakeProbe::new("STOPPED", None);
        let mailer = FakeMailer::default();
        let mut wd = watchdog(&probe, &mailer);

        let evening = Kolkata.with_ymd_and_hms(2025, 3, 10, 19, 30, 0).unwrap();
        let wake = wd.run_cycle(evening).await.unwrap();

        assert!(mailer.sent.lock().unwrap().is_empty());
        assert_eq!(wake, Kolkata.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap());
    }
}
