use anyhow::Context as _;
use clap::Parser as _;
use log::{error, info};

mod api;
mod auth;
mod config;
mod dedup;
mod delivery;
mod error;
mod identity;
mod logging;
mod manager;
mod messages;
mod scanner;
mod serial;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may already be in the environment.
    let _ = dotenvy::dotenv();
    let cli = config::Cli::parse();
    let file_config = cli.file_config()?;

    logging::init(
        &file_config.logging.clone().unwrap_or_default(),
        cli.console_only,
    )
    .context("initializing logging")?;

    let serial_config = file_config.serial.clone().unwrap_or_default();
    let delivery_config = file_config.delivery.clone().unwrap_or_default();
    let scanner_config = file_config.scanner.clone().unwrap_or_default();
    let scanner = scanner::FrameScanner::new(scanner_config.marker())?;

    let identity = identity::DeviceIdentity::detect();
    info!("Device IP: {} | MAC: {}", identity.ip, identity.mac);

    let api = api::HttpApi::new(
        cli.login_url.clone(),
        cli.api_url.clone(),
        delivery_config.request_timeout(),
    )?;
    let client = delivery::DeliveryClient::new(
        api,
        auth::AuthSession::new(cli.username.as_str(), cli.password.as_str()),
        dedup::DedupGate::with_capacity(
            cli.duplicate_timeout(),
            delivery_config.max_tracked_tags(),
        ),
        identity,
    )
    .with_retry(
        delivery_config.max_attempts(),
        delivery_config.retry_delay(),
    );

    let source = serial::SerialSource::open(&serial_config)
        .with_context(|| format!("opening serial port {}", serial_config.port()))?;

    let mut core = manager::Manager::new(
        source,
        scanner,
        client,
        serial_config.init_command().to_vec(),
        serial_config.poll_interval(),
    );
    core.run_loop(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    })
    .await
    .context("reading from RFID reader")?;

    Ok(())
}
