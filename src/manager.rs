use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};

use crate::api::TelemetryApi;
use crate::delivery::DeliveryClient;
use crate::error::Result;
use crate::scanner::FrameScanner;
use crate::serial::TagSource;

/// The acquisition loop: drain the reader, pull tags out, forward them.
///
/// Readings are handled strictly one after another. While a delivery is
/// retrying, the reader is not polled.
pub struct Manager<S, A> {
    source: S,
    scanner: FrameScanner,
    client: DeliveryClient<A>,
    init_command: Vec<u8>,
    poll_interval: Duration,
}

impl<S: TagSource, A: TelemetryApi> Manager<S, A> {
    pub fn new(
        source: S,
        scanner: FrameScanner,
        client: DeliveryClient<A>,
        init_command: Vec<u8>,
        poll_interval: Duration,
    ) -> Self {
        Manager {
            source,
            scanner,
            client,
            init_command,
            poll_interval,
        }
    }

    /// Runs until `shutdown` resolves. Only a reader fault ends it early.
    pub async fn run_loop(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!("Starting RFID reader client");
        self.source.write_command(&self.init_command)?;

        if let Err(err) = self.client.login().await {
            warn!("Initial login failed, will retry on first read: {}", err);
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopped by user");
                    return Ok(());
                }
                result = self.poll_once() => {
                    result?;
                }
            }
        }
    }

    async fn poll_once(&mut self) -> Result<usize> {
        let available = self.source.bytes_available()?;
        if available == 0 {
            tokio::time::sleep(self.poll_interval).await;
            return Ok(0);
        }

        let data = self.source.read_available(available)?;
        let hex_data = hex::encode_upper(&data);
        debug!("Read {} bytes: {}", data.len(), hex_data);

        let readings: Vec<_> = self.scanner.scan(&hex_data).collect();
        for reading in &readings {
            self.client.send(reading).await;
        }
        Ok(readings.len())
    }
}
