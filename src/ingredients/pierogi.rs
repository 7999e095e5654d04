//! A fixed source image used as an ingredient.

use std::sync::Arc;

use crate::types::PixelBuffer;

/// Cooks to its own pixels whatever it is given.
#[derive(Debug, Clone, PartialEq)]
pub struct Pierogi {
    pixels: Arc<PixelBuffer>,
}

impl Pierogi {
    pub fn new(pixels: PixelBuffer) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn shared(pixels: Arc<PixelBuffer>) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &Arc<PixelBuffer> {
        &self.pixels
    }

    pub fn shape(&self) -> (u32, u32) {
        self.pixels.shape()
    }

    pub fn cook(&self) -> PixelBuffer {
        self.pixels.as_ref().clone()
    }
}
