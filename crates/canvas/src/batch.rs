//! Batch placement encoding
//!
//! Settlement takes a flat argument list. For a batch of `n` pixels it is
//!
//! ```text
//! [n, pos_1, .., pos_n, color_1, .., color_n, timestamp]
//! ```
//!
//! Positions and colours are each kept in request order; the contract pairs
//! them up by index, not by adjacency.

use placeboard_ipc::{ExtraPixel, ExtraPixelsPlaced, ExtraPixelsRequest};
use serde::{Deserialize, Serialize};

use crate::error::CanvasError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPlacement {
    pub position: u64,
    pub color: u32,
}

impl PixelPlacement {
    pub fn new(position: u64, color: u32) -> Self {
        Self { position, color }
    }
}

impl From<ExtraPixel> for PixelPlacement {
    fn from(pixel: ExtraPixel) -> Self {
        Self::new(pixel.position, pixel.color_id)
    }
}

/// Ordered pixels plus the timestamp they are placed at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlacement {
    pub items: Vec<PixelPlacement>,
    pub timestamp: u64,
}

impl BatchPlacement {
    pub fn new(items: Vec<PixelPlacement>, timestamp: u64) -> Self {
        Self { items, timestamp }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn positions(&self) -> Vec<u64> {
        self.items.iter().map(|p| p.position).collect()
    }

    pub fn colors(&self) -> Vec<u32> {
        self.items.iter().map(|p| p.color).collect()
    }

    /// Settlement arguments for this batch
    pub fn encode(&self) -> Result<Vec<u64>, CanvasError> {
        encode_batch(&self.items, self.timestamp)
    }

    /// Response body describing this batch once settled
    pub fn summary(&self) -> ExtraPixelsPlaced {
        ExtraPixelsPlaced {
            pixels_placed: self.len(),
            positions: self.positions(),
            colors: self.colors(),
            timestamp: self.timestamp,
        }
    }
}

impl From<ExtraPixelsRequest> for BatchPlacement {
    fn from(request: ExtraPixelsRequest) -> Self {
        Self::new(
            request.extra_pixels.into_iter().map(PixelPlacement::from).collect(),
            request.timestamp,
        )
    }
}

/// Encode a batch as `[count, positions.., colors.., timestamp]`.
///
/// An empty batch is a caller error and is never encoded.
pub fn encode_batch(items: &[PixelPlacement], timestamp: u64) -> Result<Vec<u64>, CanvasError> {
    if items.is_empty() {
        return Err(CanvasError::InvalidInput("No pixels provided".to_string()));
    }

    let mut args = Vec::with_capacity(items.len() * 2 + 2);
    args.push(items.len() as u64);
    args.extend(items.iter().map(|p| p.position));
    args.extend(items.iter().map(|p| u64::from(p.color)));
    args.push(timestamp);
    Ok(args)
}

/// Encode a single placement as `[position, color, timestamp]`
pub fn encode_single(position: u64, color: u32, timestamp: u64) -> Vec<u64> {
    vec![position, u64::from(color), timestamp]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_preserves_order() {
        let items = [PixelPlacement::new(5, 2), PixelPlacement::new(9, 0)];
        assert_eq!(encode_batch(&items, 1000).unwrap(), vec![2, 5, 9, 2, 0, 1000]);
    }

    #[test]
    fn test_encode_not_sorted() {
        let items = [
            PixelPlacement::new(40, 1),
            PixelPlacement::new(3, 7),
            PixelPlacement::new(12, 4),
        ];
        assert_eq!(
            encode_batch(&items, 7).unwrap(),
            vec![3, 40, 3, 12, 1, 7, 4, 7]
        );
    }

    #[test]
    fn test_encode_single_pixel() {
        let items = [PixelPlacement::new(0, 0)];
        assert_eq!(encode_batch(&items, 0).unwrap(), vec![1, 0, 0, 0]);
        assert_eq!(encode_single(17, 3, 1000), vec![17, 3, 1000]);
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(
            encode_batch(&[], 1000),
            Err(CanvasError::InvalidInput(_))
        ));
        assert!(BatchPlacement::new(Vec::new(), 1).encode().is_err());
    }

    #[test]
    fn test_from_request() {
        let request = ExtraPixelsRequest {
            extra_pixels: vec![
                ExtraPixel { position: 5, color_id: 2 },
                ExtraPixel { position: 9, color_id: 0 },
            ],
            timestamp: 1000,
        };
        let batch = BatchPlacement::from(request);
        assert_eq!(batch.positions(), vec![5, 9]);
        assert_eq!(batch.colors(), vec![2, 0]);

        let summary = batch.summary();
        assert_eq!(summary.pixels_placed, 2);
        assert_eq!(summary.timestamp, 1000);
    }
}
