//! Startup and process-level failures.
//!
//! Request-path failures never reach this type: they are
//! `ValidationError`/`RetryExhausted` and become HTTP envelopes.

use crate::retry::RetryExhausted;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend could not be built within the retry ceiling.
    #[error("Failed to load model: {0}")]
    ModelLoad(#[from] RetryExhausted),

    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid listen address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
