//! Error type shared by every canvas operation.

use placeboard_ipc::{ErrorCode, ErrorResponse};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Position out of range: {position} (canvas has {pixel_count} pixels)")]
    PositionOutOfRange { position: u64, pixel_count: u64 },
    #[error("Color out of range: {color} (palette has {palette_count} colors)")]
    ColorOutOfRange { color: u32, palette_count: u32 },
    #[error("Color {color} does not fit in {bit_width} bits")]
    ColorExceedsBitWidth { color: u32, bit_width: u32 },
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Settlement failed: {0}")]
    SettlementFailed(String),
    #[error("Settlement disabled: {0}")]
    SettlementDisabled(String),
    /// The operation may or may not have been applied.
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: &'static str },
}

impl CanvasError {
    /// Reason code reported to clients
    pub fn code(&self) -> ErrorCode {
        match self {
            CanvasError::InvalidInput(_) => ErrorCode::InvalidInput,
            CanvasError::PositionOutOfRange { .. } => ErrorCode::PositionOutOfRange,
            CanvasError::ColorOutOfRange { .. } | CanvasError::ColorExceedsBitWidth { .. } => {
                ErrorCode::ColorOutOfRange
            }
            CanvasError::BackendUnavailable(_) => ErrorCode::BackendUnavailable,
            CanvasError::SettlementFailed(_) => ErrorCode::SettlementFailed,
            CanvasError::SettlementDisabled(_) => ErrorCode::SettlementDisabled,
            CanvasError::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// True for failures detected before anything was mutated or submitted
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CanvasError::InvalidInput(_)
                | CanvasError::PositionOutOfRange { .. }
                | CanvasError::ColorOutOfRange { .. }
                | CanvasError::ColorExceedsBitWidth { .. }
        )
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.code(), self.to_string())
    }
}

impl From<placeboard_ipc::IpcError> for CanvasError {
    fn from(err: placeboard_ipc::IpcError) -> Self {
        CanvasError::InvalidInput(err.to_string())
    }
}
