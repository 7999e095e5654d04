//! Core data types for pierogis.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - `Colour` - RGB colour values and colour literals
//! - `PixelBuffer` / `Mask` - pixel grids and inclusion masks
//! - `Palette` - ordered colour lists and the shared colour defaults

mod buffer;
mod colour;
mod palette;

pub use buffer::{Mask, PixelBuffer};
pub use colour::Colour;
pub use palette::{Palette, DEFAULT_EXCLUDE, DEFAULT_INCLUDE, DEFAULT_PALETTE};
