/*
[INPUT]:  Optional YAML/TOML settings file and CAMP_AUTH__* environment variables
[OUTPUT]: Parsed bridge, identity service and logging configuration
[POS]:    Configuration layer - provider setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProviderError;

const ENV_PREFIX: &str = "CAMP_AUTH";
const ENV_SEPARATOR: &str = "__";

pub const DEFAULT_CHALLENGE_TEMPLATE: &str = "Sign in to Camp Network\n\n\
This request will not trigger a blockchain transaction or cost any gas fees.\n\n\
Address: {address}\n\
Issued At: {timestamp}\n\
Nonce: {nonce}";

/// Top-level settings for the auth provider
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub bridge: BridgeConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from an optional file, then overlay `CAMP_AUTH__*` env vars.
    ///
    /// `CAMP_AUTH__BRIDGE__COOLDOWN_MS=5000` overrides `bridge.cooldown_ms`.
    pub fn load(path: Option<&Path>) -> Result<Self, ProviderError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        self.bridge.validate()?;
        self.identity.validate()
    }
}

/// Timing policy of the authentication bridge
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Minimum interval between attempt starts, successful or not
    pub cooldown_ms: u64,
    /// Upper bound on waiting for the wallet signature
    pub sign_timeout_ms: u64,
    /// Pause before the single retry after a focus-loss failure
    pub focus_retry_delay_ms: u64,
    /// Challenge text; `{address}`, `{timestamp}` and `{nonce}` are substituted
    pub challenge_template: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 10_000,
            sign_timeout_ms: 300_000,
            focus_retry_delay_ms: 200,
            challenge_template: DEFAULT_CHALLENGE_TEMPLATE.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn sign_timeout(&self) -> Duration {
        Duration::from_millis(self.sign_timeout_ms)
    }

    pub fn focus_retry_delay(&self) -> Duration {
        Duration::from_millis(self.focus_retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.sign_timeout_ms == 0 {
            return Err(ProviderError::Config(
                "bridge.sign_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !self.challenge_template.contains("{address}") {
            return Err(ProviderError::Config(
                "bridge.challenge_template must contain {address}".to_string(),
            ));
        }
        Ok(())
    }
}

/// Backing identity service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the HTTP identity service; the simulated service is used when absent
    pub base_url: Option<String>,
    /// Sent as `x-client-id` on every request when set
    pub client_id: Option<String>,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Round-trip latency of the simulated service
    pub simulated_latency_ms: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            client_id: None,
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            simulated_latency_ms: 1_000,
        }
    }
}

impl IdentityConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| {
                ProviderError::Config(format!("identity.base_url {base_url:?} is invalid: {e}"))
            })?;
        }
        Ok(())
    }
}

/// Tracing output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Write daily-rolled log files here instead of stderr
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "camp-auth-bridge".to_string(),
        }
    }
}
