use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::api::TelemetryApi;
use crate::auth::AuthSession;
use crate::dedup::DedupGate;
use crate::error::AuthError;
use crate::identity::DeviceIdentity;
use crate::messages::{TagReading, TelemetryPayload};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// Suppressed by the dedup window; nothing went out.
    Duplicate,
    /// No token could be obtained, so the reading was dropped.
    NoToken,
    /// Every attempt failed.
    Abandoned,
}

/// Forwards readings to the telemetry API, one at a time.
///
/// Failures never reach the caller: they are logged and the reading is
/// dropped once the attempt budget is spent.
pub struct DeliveryClient<A> {
    api: A,
    session: AuthSession,
    gate: DedupGate,
    identity: DeviceIdentity,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<A: TelemetryApi> DeliveryClient<A> {
    pub fn new(api: A, session: AuthSession, gate: DedupGate, identity: DeviceIdentity) -> Self {
        DeliveryClient {
            api,
            session,
            gate,
            identity,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn login(&mut self) -> Result<String, AuthError> {
        self.session.login(&self.api).await
    }

    pub async fn send(&mut self, reading: &TagReading) -> DeliveryOutcome {
        self.send_at(reading, Instant::now()).await
    }

    async fn send_at(&mut self, reading: &TagReading, now: Instant) -> DeliveryOutcome {
        if !self.gate.should_send(&reading.epc, now) {
            info!("Duplicate skipped: {}", reading.epc);
            return DeliveryOutcome::Duplicate;
        }

        if self.session.current_token().is_none() {
            warn!("Access token missing, trying to login...");
            // Failures are logged by the session; checked below.
            let _ = self.session.login(&self.api).await;
        }

        let payload = TelemetryPayload::new(reading, &self.identity);

        for attempt in 1..=self.max_attempts {
            let Some(token) = self.session.current_token().map(str::to_owned) else {
                error!("Cannot send {} without access token", reading.epc);
                return DeliveryOutcome::NoToken;
            };

            match self.api.post_reading(&token, &payload).await {
                Ok(response) if response.status == 200 => {
                    info!("Sent: {} | RSSI: {}", reading.epc, format_rssi(reading.rssi));
                    return DeliveryOutcome::Sent;
                }
                Ok(response) if response.status == 401 => {
                    warn!("Token expired, reauthenticating...");
                    self.session.invalidate();
                    if self.session.login(&self.api).await.is_err() {
                        error!("Re-login failed, dropping {}", reading.epc);
                        return DeliveryOutcome::NoToken;
                    }
                }
                Ok(response) => {
                    error!("Send failed [{}]: {}", response.status, response.body);
                }
                Err(err) => {
                    error!("Error sending {} (attempt {}): {}", reading.epc, attempt, err);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        error!(
            "Dropping {} after {} failed attempts",
            reading.epc, self.max_attempts
        );
        DeliveryOutcome::Abandoned
    }
}

fn format_rssi(rssi: Option<i8>) -> String {
    rssi.map(|dbm| format!("{} dBm", dbm))
        .unwrap_or_else(|| "n/a".to_string())
}
