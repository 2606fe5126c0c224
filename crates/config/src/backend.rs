//! Backend settings: production gating, settlement scripts and timeouts.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable overriding [`BackendConfig::contract_address`]
pub const CONTRACT_ADDRESS_ENV: &str = "PLACEBOARD_CONTRACT_ADDRESS";

/// How the colour index is bounded against the live palette count.
///
/// The deployed backend lets `color == count` through on its devnet path
/// while the direct store path uses a strict bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBoundMode {
    /// Accept `color <= count`
    #[default]
    Inclusive,
    /// Accept `color < count`
    Strict,
}

/// Paths of the devnet settlement scripts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub place_pixel_devnet: String,
    pub place_extra_pixels_devnet: String,
}

/// Timeouts for operations that cross to an external dependency, in ms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub store_ms: u64,
    pub palette_ms: u64,
    pub settlement_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_ms: 1_000,
            palette_ms: 1_000,
            settlement_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn palette(&self) -> Duration {
        Duration::from_millis(self.palette_ms)
    }

    pub fn settlement(&self) -> Duration {
        Duration::from_millis(self.settlement_ms)
    }
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Production deployments never invoke the devnet scripts
    pub production: bool,
    /// Address of the canvas contract the settlement scripts call into
    pub contract_address: Option<String>,
    pub scripts: ScriptsConfig,
    pub timeouts: TimeoutConfig,
    pub color_bound: ColorBoundMode,
}

impl BackendConfig {
    /// Parse a backend config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a backend config file, then apply env overrides
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Override settings from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override settings using the given variable lookup
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup(CONTRACT_ADDRESS_ENV).filter(|a| !a.is_empty()) {
            self.contract_address = Some(address);
        }
    }
}
