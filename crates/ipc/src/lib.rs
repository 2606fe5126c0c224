//! Wire protocol for placeboard
//!
//! Defines the JSON shapes exchanged with canvas clients: pixel placement
//! requests, the extra-pixels batch, attribution records and error codes.

pub mod error;
pub mod messages;

pub use error::{ErrorCode, ErrorResponse, IpcError};
pub use messages::{
    ExtraPixel, ExtraPixelsPlaced, ExtraPixelsRequest, ExtraPixelsResponse, PixelInfo,
    PlacePixelRequest, parse_request,
};
