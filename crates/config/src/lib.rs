//! Shared configuration for placeboard
//!
//! This crate is the single source of truth for canvas dimensions, the
//! colour bit width, the seed palette, and backend settings such as the
//! devnet settlement scripts and operation timeouts.

mod backend;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use backend::{BackendConfig, ColorBoundMode, ScriptsConfig, TimeoutConfig, CONTRACT_ADDRESS_ENV};

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 518;

/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 396;

/// Default number of bits stored per pixel
pub const DEFAULT_COLORS_BITWIDTH: u32 = 5;

/// Largest supported colour bit width
pub const MAX_COLORS_BITWIDTH: u32 = 32;

/// Errors raised while loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Canvas configuration: dimensions, bits per pixel and the seed palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub canvas: CanvasSize,
    /// Bits stored per pixel; fixed for the lifetime of a canvas
    pub colors_bitwidth: u32,
    /// Initial palette as `RRGGBB` hex strings
    pub colors: Vec<String>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            colors_bitwidth: DEFAULT_COLORS_BITWIDTH,
            colors: Vec::new(),
        }
    }
}

impl CanvasConfig {
    /// Create a config with the given dimensions and bit width, no colours
    pub fn new(width: u32, height: u32, colors_bitwidth: u32) -> Self {
        Self {
            canvas: CanvasSize { width, height },
            colors_bitwidth,
            colors: Vec::new(),
        }
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Total number of addressable pixels
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.canvas.width) * u64::from(self.canvas.height)
    }

    /// Check dimensions, bit width and palette entries
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }

        if self.colors_bitwidth == 0 || self.colors_bitwidth > MAX_COLORS_BITWIDTH {
            return Err(ConfigError::Invalid(format!(
                "colors_bitwidth must be in 1..={}, got {}",
                MAX_COLORS_BITWIDTH, self.colors_bitwidth
            )));
        }

        if let Some(bad) = self.colors.iter().find(|c| !is_hex_color(c)) {
            return Err(ConfigError::Invalid(format!(
                "color {:?} is not a 6 digit hex value",
                bad
            )));
        }

        Ok(())
    }
}

/// Whether `value` is a bare `RRGGBB` hex colour
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit())
}
