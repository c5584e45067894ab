use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use serde_derive::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// Reader start-up command, opaque to us.
pub const DEFAULT_INIT_COMMAND: [u8; 5] = [0x04, 0x00, 0x01, 0xDB, 0x4B];
pub const DEFAULT_LOG_DIR: &str = "/var/log/rfid";

/// Deployment settings. Everything required can come from the environment
/// (or a `.env` file), which is how the reader boxes are provisioned.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Forward RFID tag reads to the telemetry API")]
pub struct Cli {
    /// Telemetry endpoint readings are posted to
    #[arg(long, env = "API_URL", value_parser = parse_http_url)]
    pub api_url: Url,

    /// Endpoint exchanging credentials for a bearer token
    #[arg(long, env = "LOGIN_URL", value_parser = parse_http_url)]
    pub login_url: Url,

    #[arg(long, env = "USERNAME")]
    pub username: String,

    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Seconds during which repeat reads of a tag are not forwarded (0 = off)
    #[arg(long, env = "DUPLICATE_TIMEOUT")]
    pub duplicate_timeout: u64,

    /// Optional TOML file with serial, delivery and logging settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log to the terminal only (RUST_LOG controls verbosity)
    #[arg(long)]
    pub console_only: bool,
}

impl Cli {
    pub fn duplicate_timeout(&self) -> Duration {
        Duration::from_secs(self.duplicate_timeout)
    }

    pub fn file_config(&self) -> Result<FileConfig> {
        match &self.config {
            Some(path) => FileConfig::load(path),
            None => Ok(FileConfig::default()),
        }
    }
}

fn parse_http_url(value: &str) -> std::result::Result<Url, String> {
    let url = Url::parse(value).map_err(|err| err.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("unsupported URL scheme `{}`", scheme)),
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct FileConfig {
    pub serial: Option<SerialConfig>,
    pub delivery: Option<DeliveryConfig>,
    pub logging: Option<LoggingConfig>,
    pub scanner: Option<ScannerConfig>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("reading {}: {}", path.display(), err)))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::de::from_str(contents).map_err(|err| Error::Config(err.to_string()))
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SerialConfig {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub init_command: Option<Vec<u8>>,
    pub poll_interval_ms: Option<u64>,
}

impl SerialConfig {
    pub fn port(&self) -> &str {
        self.port.as_deref().unwrap_or(DEFAULT_SERIAL_PORT)
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(1000))
    }

    pub fn init_command(&self) -> &[u8] {
        self.init_command.as_deref().unwrap_or(&DEFAULT_INIT_COMMAND)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(100))
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct DeliveryConfig {
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
    pub max_tracked_tags: Option<usize>,
}

impl DeliveryConfig {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(3).max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms.unwrap_or(1000))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.unwrap_or(10))
    }

    pub fn max_tracked_tags(&self) -> usize {
        self.max_tracked_tags
            .unwrap_or(crate::dedup::DEFAULT_MAX_TRACKED_TAGS)
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct LoggingConfig {
    pub directory: Option<PathBuf>,
    pub file_name: Option<String>,
    pub retention_days: Option<u32>,
    pub level: Option<String>,
}

impl LoggingConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("rfid_reader.log")
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days.unwrap_or(7)
    }

    pub fn level(&self) -> log::LevelFilter {
        self.level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ScannerConfig {
    /// Hex prefix every EPC of interest starts with, e.g. "E280"
    pub marker: Option<String>,
}

impl ScannerConfig {
    pub fn marker(&self) -> &str {
        self.marker
            .as_deref()
            .unwrap_or(crate::scanner::DEFAULT_MARKER)
    }
}
