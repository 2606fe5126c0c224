//! Palette bounds oracle
//!
//! The palette is owned by an external registry and can grow while
//! placements are in flight, so the validator asks for the live count on
//! every call instead of caching it.

use std::future::Future;
use std::sync::RwLock;

use placeboard_config::{CanvasConfig, is_hex_color};
use tracing::debug;

use crate::error::CanvasError;

/// Source of the current number of registered colours.
pub trait PaletteOracle: Send + Sync {
    /// Fresh palette size; fails with `BackendUnavailable` when the
    /// registry cannot be reached.
    fn current_palette_count(&self) -> impl Future<Output = Result<u32, CanvasError>> + Send;
}

/// In-memory colour registry, seeded from config and grown at runtime.
#[derive(Debug, Default)]
pub struct PaletteRegistry {
    colors: RwLock<Vec<String>>,
}

impl PaletteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry with the colours listed in the canvas config,
    /// uppercased like registered colours
    pub fn from_config(config: &CanvasConfig) -> Self {
        let colors = config
            .colors
            .iter()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self {
            colors: RwLock::new(colors),
        }
    }

    /// Register a new `RRGGBB` colour and return its index.
    ///
    /// Registering an existing colour returns the existing index.
    pub fn register(&self, hex: &str) -> Result<u32, CanvasError> {
        if !is_hex_color(hex) {
            return Err(CanvasError::InvalidInput(format!(
                "{:?} is not a 6 digit hex color",
                hex
            )));
        }
        let hex = hex.to_ascii_uppercase();

        let mut colors = self.colors.write().map_err(|_| poisoned())?;
        if let Some(index) = colors.iter().position(|c| c.eq_ignore_ascii_case(&hex)) {
            return Ok(index as u32);
        }
        colors.push(hex);
        let index = (colors.len() - 1) as u32;
        debug!("Registered palette color {} at index {}", colors[index as usize], index);
        Ok(index)
    }

    /// Number of registered colours right now
    pub fn count(&self) -> Result<u32, CanvasError> {
        let colors = self.colors.read().map_err(|_| poisoned())?;
        Ok(colors.len() as u32)
    }

    /// Hex value of the colour at `index`
    pub fn color(&self, index: u32) -> Result<Option<String>, CanvasError> {
        let colors = self.colors.read().map_err(|_| poisoned())?;
        Ok(colors.get(index as usize).cloned())
    }

    /// Copy of every registered colour in index order
    pub fn colors(&self) -> Result<Vec<String>, CanvasError> {
        let colors = self.colors.read().map_err(|_| poisoned())?;
        Ok(colors.clone())
    }
}

impl PaletteOracle for PaletteRegistry {
    async fn current_palette_count(&self) -> Result<u32, CanvasError> {
        self.count()
    }
}

fn poisoned() -> CanvasError {
    CanvasError::BackendUnavailable("palette registry lock poisoned".to_string())
}

/// Palette of a fixed size, for deterministic callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPalette(pub u32);

impl PaletteOracle for FixedPalette {
    async fn current_palette_count(&self) -> Result<u32, CanvasError> {
        Ok(self.0)
    }
}

/// Palette whose registry can never be reached
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePalette;

impl PaletteOracle for UnavailablePalette {
    async fn current_palette_count(&self) -> Result<u32, CanvasError> {
        Err(CanvasError::BackendUnavailable(
            "palette registry unreachable".to_string(),
        ))
    }
}
