use std::time::Duration;

use placeboard_config::ColorBoundMode;
use tracing::warn;

use crate::batch::PixelPlacement;
use crate::error::CanvasError;
use crate::geometry::CanvasGeometry;
use crate::palette::PaletteOracle;

/// Default time allowed for a palette count query
pub const DEFAULT_PALETTE_TIMEOUT: Duration = Duration::from_secs(1);

/// How a colour index is compared against the live palette count.
///
/// Deployed clients have been allowed `color == count` through; whether
/// index 0 is a background slot that shifts the palette by one is
/// undecided, so the inclusive bound stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorBound {
    /// `color <= count`
    #[default]
    InclusiveOfCount,
    /// `color < count`
    StrictlyBelowCount,
}

impl ColorBound {
    #[inline]
    pub fn admits(self, color: u32, palette_count: u32) -> bool {
        match self {
            ColorBound::InclusiveOfCount => color <= palette_count,
            ColorBound::StrictlyBelowCount => color < palette_count,
        }
    }
}

impl From<ColorBoundMode> for ColorBound {
    fn from(mode: ColorBoundMode) -> Self {
        match mode {
            ColorBoundMode::Inclusive => ColorBound::InclusiveOfCount,
            ColorBoundMode::Strict => ColorBound::StrictlyBelowCount,
        }
    }
}

/// Accepts or rejects a `(position, color)` pair before it reaches a store.
///
/// Checks run in order and the first failure wins:
/// 1. position inside the canvas (`PositionOutOfRange`)
/// 2. colour admitted by the live palette count (`ColorOutOfRange`)
/// 3. colour representable in the canvas bit width (`ColorExceedsBitWidth`)
///
/// A palette that cannot be queried is a hard failure, never a pass.
#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator {
    geometry: CanvasGeometry,
    bound: ColorBound,
    palette_timeout: Duration,
}

impl PlacementValidator {
    pub fn new(geometry: CanvasGeometry) -> Self {
        Self {
            geometry,
            bound: ColorBound::default(),
            palette_timeout: DEFAULT_PALETTE_TIMEOUT,
        }
    }

    pub fn with_bound(mut self, bound: ColorBound) -> Self {
        self.bound = bound;
        self
    }

    pub fn with_palette_timeout(mut self, timeout: Duration) -> Self {
        self.palette_timeout = timeout;
        self
    }

    #[inline]
    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    #[inline]
    pub fn bound(&self) -> ColorBound {
        self.bound
    }

    /// Bounds check shared by reads and writes
    pub fn check_position(&self, position: u64) -> Result<(), CanvasError> {
        if self.geometry.is_valid_position(position) {
            Ok(())
        } else {
            Err(CanvasError::PositionOutOfRange {
                position,
                pixel_count: self.geometry.pixel_count(),
            })
        }
    }

    /// Validate one placement against a fresh palette count
    pub async fn validate<P: PaletteOracle>(
        &self,
        palette: &P,
        position: u64,
        color: u32,
    ) -> Result<(), CanvasError> {
        self.check_position(position)?;

        let palette_count = self.palette_count(palette).await?;
        if !self.bound.admits(color, palette_count) {
            return Err(CanvasError::ColorOutOfRange {
                color,
                palette_count,
            });
        }

        if !self.geometry.fits_color(color) {
            return Err(CanvasError::ColorExceedsBitWidth {
                color,
                bit_width: self.geometry.bit_width(),
            });
        }

        Ok(())
    }

    /// Validate every placement in order, stopping at the first rejection.
    ///
    /// The palette is queried afresh for each item.
    pub async fn validate_all<P: PaletteOracle>(
        &self,
        palette: &P,
        placements: &[PixelPlacement],
    ) -> Result<(), CanvasError> {
        for (index, placement) in placements.iter().enumerate() {
            if let Err(err) = self.validate(palette, placement.position, placement.color).await {
                warn!("Batch item {} rejected: {}", index, err);
                return Err(err);
            }
        }
        Ok(())
    }

    async fn palette_count<P: PaletteOracle>(&self, palette: &P) -> Result<u32, CanvasError> {
        match tokio::time::timeout(self.palette_timeout, palette.current_palette_count()).await {
            Ok(result) => result,
            Err(_) => Err(CanvasError::Timeout {
                operation: "palette count",
            }),
        }
    }
}
