/*
[INPUT]:  LoggingConfig (level directive, optional log directory)
[OUTPUT]: Installed tracing subscriber and the guard that flushes it
[POS]:    Ambient layer - log output setup owned by the application entry point
[UPDATE]: When changing log format or sinks
*/

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::ProviderError;

/// Keeps the non-blocking file writer alive; drop it on shutdown to flush.
#[derive(Debug)]
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<TelemetryGuard, ProviderError> {
    let filter = build_filter(&config.level, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|err| ProviderError::Telemetry(err.to_string()))?;
            Ok(TelemetryGuard {
                _file_guard: Some(guard),
            })
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|err| ProviderError::Telemetry(err.to_string()))?;
            Ok(TelemetryGuard { _file_guard: None })
        }
    }
}

fn build_filter(level: &str, env_directive: Option<String>) -> Result<EnvFilter, ProviderError> {
    match env_directive {
        Some(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive),
        _ => EnvFilter::try_new(level),
    }
    .map_err(|err| ProviderError::Config(format!("invalid log level: {err}")))
}
