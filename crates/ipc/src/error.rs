//! Error types for the wire protocol.

use serde::{Deserialize, Serialize};

/// Errors that can occur while decoding or encoding messages.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid message format: {0}")]
    InvalidFormat(String),
}

/// Reason codes reported to clients when a request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed request shape
    InvalidInput,
    PositionOutOfRange,
    ColorOutOfRange,
    /// Store or palette registry unreachable
    BackendUnavailable,
    /// The external settlement action failed
    SettlementFailed,
    /// Settlement is switched off for this deployment
    SettlementDisabled,
    /// Gave up waiting; the operation may or may not have been applied
    Timeout,
}

impl ErrorCode {
    /// HTTP status a transport layer should answer with
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::InvalidInput | ErrorCode::PositionOutOfRange | ErrorCode::ColorOutOfRange => {
                400
            }
            ErrorCode::SettlementDisabled => 403,
            ErrorCode::BackendUnavailable | ErrorCode::SettlementFailed => 500,
            ErrorCode::Timeout => 504,
        }
    }

    /// Whether the request was rejected before anything was attempted
    pub fn is_client_error(self) -> bool {
        self.http_status() < 500
    }
}

/// Error body returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
