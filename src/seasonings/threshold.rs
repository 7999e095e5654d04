//! Brightness threshold masks.
//!
//! A pixel is included when its luma sits outside the `[lower, upper]`
//! band (`luma <= lower || luma >= upper`). With `inner` set the test flips
//! and pixels inside the band are included instead.

use rayon::prelude::*;

use crate::error::{PierogisError, Result};
use crate::types::{Colour, Mask, PixelBuffer};

/// Threshold seasoning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    lower: u8,
    upper: u8,
    inner: bool,
}

impl Threshold {
    /// Lower bound used when neither bound is given.
    pub const LOWER: u8 = 64;
    /// Upper bound used when neither bound is given.
    pub const UPPER: u8 = 180;

    /// Resolve bounds.
    ///
    /// With neither bound given the defaults [`Self::LOWER`] and
    /// [`Self::UPPER`] apply. With only one given, the other opens fully
    /// (`0` or `255`).
    pub fn new(lower: Option<u8>, upper: Option<u8>) -> Result<Self> {
        let (lower, upper) = match (lower, upper) {
            (None, None) => (Self::LOWER, Self::UPPER),
            (Some(lower), None) => (lower, u8::MAX),
            (None, Some(upper)) => (0, upper),
            (Some(lower), Some(upper)) => (lower, upper),
        };

        if lower > upper {
            return Err(PierogisError::InvalidParameter {
                message: format!("lower threshold {} is above upper threshold {}", lower, upper),
                help: Some("Swap the bounds or use --inner to select the band".to_string()),
            });
        }

        Ok(Self {
            lower,
            upper,
            inner: false,
        })
    }

    /// Include the pixels inside the band rather than outside it.
    pub fn with_inner(mut self, inner: bool) -> Self {
        self.inner = inner;
        self
    }

    pub fn lower(&self) -> u8 {
        self.lower
    }

    pub fn upper(&self) -> u8 {
        self.upper
    }

    pub fn inner(&self) -> bool {
        self.inner
    }

    /// Bounds scaled to [`Colour::luma_milli`] units.
    fn milli_bounds(&self) -> (u32, u32) {
        (self.lower as u32 * 1000, self.upper as u32 * 1000)
    }

    fn includes(&self, luma_milli: u32) -> bool {
        let (lower, upper) = self.milli_bounds();
        if self.inner {
            // the band edges count as inside too
            (lower..=upper).contains(&luma_milli)
        } else {
            luma_milli <= lower || luma_milli >= upper
        }
    }

    /// Mask using a single fused parallel pass over the pixel bytes.
    pub fn mask_fast(&self, buffer: &PixelBuffer) -> Result<Mask> {
        let bits: Vec<bool> = buffer
            .as_raw()
            .par_chunks_exact(3)
            .map(|p| self.includes(Colour::rgb(p[0], p[1], p[2]).luma_milli()))
            .collect();

        Mask::new(buffer.width(), buffer.height(), bits)
    }

    /// Mask built plane by plane: split the channels, weight and sum them
    /// into a luma plane, then compare each bound on its own.
    pub fn mask_reference(&self, buffer: &PixelBuffer) -> Mask {
        let raw = buffer.as_raw();
        let plane = |channel: usize| -> Vec<u32> {
            raw.iter().skip(channel).step_by(3).map(|&v| v as u32).collect()
        };
        let (red, green, blue) = (plane(0), plane(1), plane(2));

        let luma: Vec<u32> = red
            .iter()
            .zip(&green)
            .zip(&blue)
            .map(|((r, g), b)| r * 299 + g * 587 + b * 114)
            .collect();

        let lower = 1000 * u32::from(self.lower);
        let upper = 1000 * u32::from(self.upper);
        let below: Vec<bool> = luma.iter().map(|&l| l <= lower).collect();
        let above: Vec<bool> = luma.iter().map(|&l| l >= upper).collect();
        let at_lower: Vec<bool> = luma.iter().map(|&l| l == lower).collect();
        let at_upper: Vec<bool> = luma.iter().map(|&l| l == upper).collect();

        let (width, height) = buffer.shape();
        Mask::from_fn(width, height, |x, y| {
            let i = y as usize * width as usize + x as usize;
            if self.inner {
                at_lower[i] || at_upper[i] || (!below[i] && !above[i])
            } else {
                below[i] || above[i]
            }
        })
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            lower: Self::LOWER,
            upper: Self::UPPER,
            inner: false,
        }
    }
}
