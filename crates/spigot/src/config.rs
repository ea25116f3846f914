//! # Configuration
//!
//! TOML-backed settings for the whole client. Every field has a default, so
//! an absent file, an empty file and a file overriding a single value are
//! all valid configurations. `validate` catches the values that would make
//! the engine misbehave (zero intervals, a zero ceiling, an exponent whose
//! multiplier cannot fit a `u64`) before anything is wired up.
//!
//! The file path comes from `--config` or the `SPIGOT_CONFIG` environment
//! variable; with neither set, defaults apply.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use spigot_core::constants::{
    DEFAULT_BALANCE_CEILING, DEFAULT_DEBOUNCE_MS, DEFAULT_GATEWAY_URL, DEFAULT_MAX_POLL_MINUTES,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UNIT_EXPONENT,
};
use spigot_core::UnitScale;
use spigot_engine::{ClaimConfig, FlowConfig, PollerConfig};
use spigot_gateway::HttpGatewayConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SPIGOT_CONFIG";

/// Failure to load or validate the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A value is out of the range the engine accepts.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Client settings, one section per concern.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpigotConfig {
    /// Faucet API connection.
    pub gateway: GatewaySection,
    /// Eligibility settings.
    pub claim: ClaimSection,
    /// Poll cadence.
    pub poller: PollerSection,
    /// Input handling.
    pub input: InputSection,
}

/// `[gateway]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Base URL of the faucet API.
    pub url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// `[claim]` section.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ClaimSection {
    /// Inclusive display-unit ceiling an address may hold and still claim.
    pub balance_ceiling: u64,
    /// Power of ten between cogs and the display unit.
    pub unit_exponent: u32,
}

impl Default for ClaimSection {
    fn default() -> Self {
        Self {
            balance_ceiling: DEFAULT_BALANCE_CEILING,
            unit_exponent: DEFAULT_UNIT_EXPONENT,
        }
    }
}

/// `[poller]` section.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PollerSection {
    /// Seconds between deploy status polls.
    pub interval_secs: u64,
    /// Minutes before a poll session gives up.
    pub max_minutes: u64,
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_minutes: DEFAULT_MAX_POLL_MINUTES,
        }
    }
}

/// `[input]` section.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Milliseconds of input silence before a value is committed.
    pub debounce_ms: u64,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl SpigotConfig {
    /// Loads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        tracing::debug!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Loads the file named by `SPIGOT_CONFIG`, or the defaults when the
    /// variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poller.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poller.interval_secs must be at least 1".to_owned(),
            ));
        }
        if self.poller.max_minutes == 0 {
            return Err(ConfigError::Invalid(
                "poller.max_minutes must be at least 1".to_owned(),
            ));
        }
        if self.poller.max_minutes.checked_mul(60).is_none() {
            return Err(ConfigError::Invalid(format!(
                "poller.max_minutes {} overflows the poll ceiling",
                self.poller.max_minutes
            )));
        }
        if self.claim.balance_ceiling == 0 {
            return Err(ConfigError::Invalid(
                "claim.balance_ceiling must be at least 1".to_owned(),
            ));
        }
        if UnitScale::new(self.claim.unit_exponent).is_none() {
            return Err(ConfigError::Invalid(format!(
                "claim.unit_exponent {} overflows the balance unit",
                self.claim.unit_exponent
            )));
        }
        if self.gateway.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "gateway.request_timeout_secs must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Engine settings derived from this config.
    ///
    /// `validate` has already bounded the exponent and the poll ceiling;
    /// out-of-range values here degrade to the default scale or a
    /// saturated duration rather than panicking.
    #[must_use]
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig {
            claim: ClaimConfig {
                balance_ceiling: self.claim.balance_ceiling,
                scale: UnitScale::new(self.claim.unit_exponent).unwrap_or_default(),
            },
            poller: PollerConfig {
                poll_interval: Duration::from_secs(self.poller.interval_secs),
                max_poll: Duration::from_secs(self.poller.max_minutes.saturating_mul(60)),
            },
            debounce: Duration::from_millis(self.input.debounce_ms),
        }
    }

    /// Gateway settings derived from this config.
    #[must_use]
    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.gateway.url.clone(),
            request_timeout: Duration::from_secs(self.gateway.request_timeout_secs),
        }
    }
}
