//! Placeboard canvas - bit-packed shared pixel grid
//!
//! This crate provides the canvas state store and the placement path:
//! - [`geometry`] - Canvas dimensions and bit addressing
//! - [`palette`] - Live palette size oracle and in-memory registry
//! - [`bitfield`] - Bit-packed pixel store with per-pixel atomic get/set
//! - [`validation`] - Placement validation against geometry and palette
//! - [`batch`] - Extra-pixels batch encoding for settlement
//! - [`settlement`] - Settlement sinks (devnet scripts, test doubles)
//! - [`attribution`] - Most recent placer lookup
//! - [`events`] - Placement event listeners
//! - [`service`] - The composed read/write service

pub mod attribution;
pub mod batch;
pub mod bitfield;
pub mod constants;
pub mod error;
pub mod events;
pub mod geometry;
pub mod palette;
pub mod service;
pub mod settlement;
pub mod validation;

pub use attribution::*;
pub use batch::*;
pub use bitfield::*;
pub use constants::*;
pub use error::*;
pub use events::*;
pub use geometry::*;
pub use palette::*;
pub use service::*;
pub use settlement::*;
pub use validation::*;
