//! Logging setup for mysqldiff

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Initialize the global tracing subscriber from configuration.
///
/// With no `[logging]` section, logging stays at the tracing defaults
/// (whatever `RUST_LOG` selects).
pub fn init_logging(config: &Option<LoggingConfig>) -> Result<()> {
    let config = match config {
        Some(cfg) => cfg,
        None => return Ok(()),
    };

    let level = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("mysqldiff={}", level)
            .parse()
            .map_err(|e| Error::ConfigError(format!("Invalid log directive: {}", e)))?,
    );

    let json = config.format.eq_ignore_ascii_case("json");

    if let Some(file_path) = &config.file {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = Arc::new(File::create(file_path)?);
        install(file, filter, json, config.include_timestamps)
    } else if config.stdout {
        install(std::io::stdout, filter, json, config.include_timestamps)
    } else {
        Ok(())
    }
}

/// Build and install the subscriber for one writer target. The format and
/// timer choices each change the builder's type, so every combination is
/// finished separately.
fn install<W>(writer: W, filter: EnvFilter, json: bool, timestamps: bool) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    match (json, timestamps) {
        (true, true) => set_global(
            fmt::Subscriber::builder()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .finish(),
        ),
        (true, false) => set_global(
            fmt::Subscriber::builder()
                .json()
                .without_time()
                .with_env_filter(filter)
                .with_writer(writer)
                .finish(),
        ),
        (false, true) => set_global(
            fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(writer)
                .finish(),
        ),
        (false, false) => set_global(
            fmt::Subscriber::builder()
                .without_time()
                .with_env_filter(filter)
                .with_writer(writer)
                .finish(),
        ),
    }
}

fn set_global<S>(subscriber: S) -> Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::ConfigError(format!("Failed to install subscriber: {}", e)))
}
