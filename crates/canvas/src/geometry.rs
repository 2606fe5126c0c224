//! Canvas geometry - pixel count, valid positions and bit addressing

use placeboard_config::CanvasConfig;

use crate::constants::{MAX_COLOR_BIT_WIDTH, WORD_BITS};
use crate::error::CanvasError;

/// Dimensions and bits-per-pixel of a canvas. Immutable once built.
///
/// Pixels are addressed by a linear row-major position in
/// `[0, width * height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasGeometry {
    width: u32,
    height: u32,
    bit_width: u32,
}

impl CanvasGeometry {
    /// Build a geometry, rejecting empty canvases, unsupported bit widths
    /// and sizes whose bit length does not fit in memory addressing.
    pub fn new(width: u32, height: u32, bit_width: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidInput(format!(
                "canvas must be non-empty, got {}x{}",
                width, height
            )));
        }
        if bit_width == 0 || bit_width > MAX_COLOR_BIT_WIDTH {
            return Err(CanvasError::InvalidInput(format!(
                "color bit width must be in 1..={}, got {}",
                MAX_COLOR_BIT_WIDTH, bit_width
            )));
        }

        let pixel_count = u64::from(width) * u64::from(height);
        let addressable = pixel_count
            .checked_mul(u64::from(bit_width))
            .is_some_and(|bits| usize::try_from(bits.div_ceil(WORD_BITS)).is_ok());
        if !addressable {
            return Err(CanvasError::InvalidInput(format!(
                "canvas {}x{} at {} bits is too large",
                width, height, bit_width
            )));
        }

        Ok(Self {
            width,
            height,
            bit_width,
        })
    }

    pub fn from_config(config: &CanvasConfig) -> Result<Self, CanvasError> {
        Self::new(
            config.canvas.width,
            config.canvas.height,
            config.colors_bitwidth,
        )
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Total number of addressable pixels
    #[inline]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Length of the packed bitfield in bits
    #[inline]
    pub fn total_bits(&self) -> u64 {
        self.pixel_count() * u64::from(self.bit_width)
    }

    /// Number of 64-bit storage words needed for the whole canvas
    #[inline]
    pub fn word_count(&self) -> usize {
        self.total_bits().div_ceil(WORD_BITS) as usize
    }

    /// Length of the packed bitfield in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.total_bits().div_ceil(8) as usize
    }

    /// Largest colour index a pixel can physically hold
    #[inline]
    pub fn max_color(&self) -> u32 {
        (((1u64) << self.bit_width) - 1) as u32
    }

    #[inline]
    pub fn fits_color(&self, color: u32) -> bool {
        color <= self.max_color()
    }

    #[inline]
    pub fn is_valid_position(&self, position: u64) -> bool {
        position < self.pixel_count()
    }

    /// First bit of the pixel at `position`.
    ///
    /// No bounds check; callers check [`Self::is_valid_position`] first.
    #[inline]
    pub fn bit_offset(&self, position: u64) -> u64 {
        position * u64::from(self.bit_width)
    }

    /// Row-major position of `(x, y)`, or None if outside the canvas
    pub fn position_of(&self, x: u32, y: u32) -> Option<u64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(u64::from(y) * u64::from(self.width) + u64::from(x))
    }

    /// Inverse of [`Self::position_of`]
    pub fn coords_of(&self, position: u64) -> Option<(u32, u32)> {
        if !self.is_valid_position(position) {
            return None;
        }
        let width = u64::from(self.width);
        Some(((position % width) as u32, (position / width) as u32))
    }
}
