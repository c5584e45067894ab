use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serial device error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why a login exchange did not yield a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login rejected with status {0}")]
    Rejected(u16),

    #[error("login response did not contain an access token")]
    MissingToken,

    #[error("login request failed: {0}")]
    Transport(#[source] Error),
}
