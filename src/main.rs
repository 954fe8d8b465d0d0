use anyhow::Result;
use textgate::{config, server, Error};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<EnvFilter> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(EnvFilter::new(level))
}

/// `RUST_LOG` wins over the configured level, but must parse when set.
fn log_filter(rust_log: Option<&str>, config_level: &str) -> Result<EnvFilter> {
    match rust_log {
        Some(directives) => EnvFilter::try_new(directives).map_err(|e| {
            anyhow::anyhow!("Invalid {}: '{}': {}", EnvFilter::DEFAULT_ENV, directives, e)
        }),
        None => validate_log_level(config_level),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = match log_filter(rust_log.as_deref(), &config.server.logs.level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!(
        endpoint = %config.service.endpoint,
        backend = ?config.backend.kind(),
        "Starting textgate"
    );

    match server::run(config).await {
        Ok(()) => Ok(()),
        Err(e @ Error::ModelLoad(_)) => {
            error!("Fatal error loading model: {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
