//! Bit-packed pixel store
//!
//! Every pixel is a `bit_width`-wide unsigned integer. Pixels are packed
//! back to back, most significant bit first, into 64-bit atomic words, so
//! the byte image of the store is the same string a Redis
//! `BITFIELD canvas SET u{bit_width} #{position}` sequence would build.
//!
//! A pixel that lies inside one word is read with a single load and
//! written with a single compare-and-swap loop on that word, so writers
//! to neighbouring pixels never clobber each other. A pixel whose bits
//! straddle two words is guarded by one of [`STRADDLE_LOCK_STRIPES`]
//! mutexes, taken by both its readers and writers, so nobody observes
//! half of an update.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::constants::{STRADDLE_LOCK_STRIPES, WORD_BITS};
use crate::error::CanvasError;
use crate::geometry::CanvasGeometry;

/// Atomic get/set of a single pixel's colour index.
///
/// Implementations guarantee per-pixel atomicity only; there is no ordering
/// between writes to different positions.
pub trait PixelStore: Send + Sync {
    /// Layout the store was built for
    fn geometry(&self) -> &CanvasGeometry;

    fn get(&self, position: u64) -> impl Future<Output = Result<u32, CanvasError>> + Send;

    fn set(
        &self,
        position: u64,
        color: u32,
    ) -> impl Future<Output = Result<(), CanvasError>> + Send;
}

/// Where a pixel's bits live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    /// Entirely inside `word`, ending `shift` bits above the word's LSB
    Single { word: usize, shift: u32 },
    /// Low `hi_bits` of `word` followed by the top `lo_bits` of `word + 1`
    Straddle { word: usize, hi_bits: u32, lo_bits: u32 },
}

/// In-process bit-packed canvas
pub struct BitfieldCanvas {
    geometry: CanvasGeometry,
    words: Box<[AtomicU64]>,
    straddle_locks: Box<[Mutex<()>]>,
}

impl std::fmt::Debug for BitfieldCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitfieldCanvas")
            .field("geometry", &self.geometry)
            .field("word_count", &self.words.len())
            .finish()
    }
}

impl BitfieldCanvas {
    /// Create a canvas with every pixel set to colour 0
    pub fn new(geometry: CanvasGeometry) -> Self {
        let words = (0..geometry.word_count()).map(|_| AtomicU64::new(0)).collect();
        let straddle_locks = (0..STRADDLE_LOCK_STRIPES).map(|_| Mutex::new(())).collect();
        Self {
            geometry,
            words,
            straddle_locks,
        }
    }

    /// Restore a canvas from the packed byte image produced by [`Self::snapshot`]
    pub fn from_snapshot(geometry: CanvasGeometry, bytes: &[u8]) -> Result<Self, CanvasError> {
        if bytes.len() != geometry.byte_len() {
            return Err(CanvasError::InvalidInput(format!(
                "snapshot is {} bytes, canvas needs {}",
                bytes.len(),
                geometry.byte_len()
            )));
        }

        let canvas = Self::new(geometry);
        for (word, chunk) in canvas.words.iter().zip(bytes.chunks(8)) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            word.store(u64::from_be_bytes(buf), Ordering::Relaxed);
        }
        Ok(canvas)
    }

    #[inline]
    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    /// Read the colour index at `position`
    pub fn get_color(&self, position: u64) -> Result<u32, CanvasError> {
        self.check_position(position)?;
        let mask = self.mask();

        let value = match self.span(position) {
            Span::Single { word, shift } => (self.words[word].load(Ordering::Acquire) >> shift) & mask,
            Span::Straddle {
                word,
                hi_bits,
                lo_bits,
            } => {
                let _guard = self.straddle_lock(word);
                let hi = self.words[word].load(Ordering::Acquire) & low_mask(hi_bits);
                let lo = self.words[word + 1].load(Ordering::Acquire) >> (WORD_BITS as u32 - lo_bits);
                (hi << lo_bits) | lo
            }
        };
        Ok(value as u32)
    }

    /// Write `color` at `position`, returning the colour it replaced
    pub fn swap_color(&self, position: u64, color: u32) -> Result<u32, CanvasError> {
        self.check_position(position)?;
        if !self.geometry.fits_color(color) {
            return Err(CanvasError::ColorExceedsBitWidth {
                color,
                bit_width: self.geometry.bit_width(),
            });
        }

        let mask = self.mask();
        let color = u64::from(color);

        let previous = match self.span(position) {
            Span::Single { word, shift } => {
                let field = mask << shift;
                let old = update_word(&self.words[word], |w| (w & !field) | (color << shift));
                (old >> shift) & mask
            }
            Span::Straddle {
                word,
                hi_bits,
                lo_bits,
            } => {
                let lo_shift = WORD_BITS as u32 - lo_bits;
                let hi_field = low_mask(hi_bits);
                let lo_field = low_mask(lo_bits) << lo_shift;

                let _guard = self.straddle_lock(word);
                let old_hi = update_word(&self.words[word], |w| (w & !hi_field) | (color >> lo_bits));
                let old_lo = update_word(&self.words[word + 1], |w| {
                    (w & !lo_field) | ((color & low_mask(lo_bits)) << lo_shift)
                });
                ((old_hi & hi_field) << lo_bits) | (old_lo >> lo_shift)
            }
        };

        debug!("Pixel {} set to {} (was {})", position, color, previous);
        Ok(previous as u32)
    }

    /// Set every pixel to `color`
    pub fn fill(&self, color: u32) -> Result<(), CanvasError> {
        if !self.geometry.fits_color(color) {
            return Err(CanvasError::ColorExceedsBitWidth {
                color,
                bit_width: self.geometry.bit_width(),
            });
        }
        for position in 0..self.geometry.pixel_count() {
            self.swap_color(position, color)?;
        }
        Ok(())
    }

    /// Packed byte image of the whole canvas.
    ///
    /// Each pixel in the image is untorn, but writes to different pixels
    /// that race with the snapshot may or may not be included.
    pub fn snapshot(&self) -> Vec<u8> {
        // Hold every stripe so no straddling pixel is half written; single
        // word pixels are already atomic per load.
        let _guards: Vec<_> = (0..self.straddle_locks.len())
            .map(|stripe| self.straddle_lock(stripe))
            .collect();

        let mut bytes: Vec<u8> = self
            .words
            .iter()
            .flat_map(|w| w.load(Ordering::Acquire).to_be_bytes())
            .collect();
        bytes.truncate(self.geometry.byte_len());
        bytes
    }

    fn check_position(&self, position: u64) -> Result<(), CanvasError> {
        if self.geometry.is_valid_position(position) {
            Ok(())
        } else {
            Err(CanvasError::PositionOutOfRange {
                position,
                pixel_count: self.geometry.pixel_count(),
            })
        }
    }

    #[inline]
    fn mask(&self) -> u64 {
        low_mask(self.geometry.bit_width())
    }

    fn span(&self, position: u64) -> Span {
        let offset = self.geometry.bit_offset(position);
        let word = (offset / WORD_BITS) as usize;
        let start = (offset % WORD_BITS) as u32;
        let width = self.geometry.bit_width();

        if start + width <= WORD_BITS as u32 {
            Span::Single {
                word,
                shift: WORD_BITS as u32 - start - width,
            }
        } else {
            let hi_bits = WORD_BITS as u32 - start;
            Span::Straddle {
                word,
                hi_bits,
                lo_bits: width - hi_bits,
            }
        }
    }

    fn straddle_lock(&self, word: usize) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, a poisoned stripe carries no bad state.
        self.straddle_locks[word % self.straddle_locks.len()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PixelStore for BitfieldCanvas {
    fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    async fn get(&self, position: u64) -> Result<u32, CanvasError> {
        self.get_color(position)
    }

    async fn set(&self, position: u64, color: u32) -> Result<(), CanvasError> {
        self.swap_color(position, color).map(|_| ())
    }
}

/// Mask of the `bits` least significant bits, `bits` in `1..64`
#[inline]
fn low_mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Atomically replace a word with `f(word)`, returning the old word
#[inline]
fn update_word(word: &AtomicU64, f: impl Fn(u64) -> u64) -> u64 {
    let (Ok(old) | Err(old)) = word.fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| Some(f(w)));
    old
}
