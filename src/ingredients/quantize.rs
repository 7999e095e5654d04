//! Nearest-palette colour quantization.
//!
//! Every pixel snaps to the closest palette colour by euclidean RGB
//! distance, optionally after ordered or error-diffusion dithering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PierogisError, Result};
use crate::types::{Colour, Palette, PixelBuffer};

/// Dithering applied before the palette snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dither {
    /// Direct nearest-colour mapping.
    #[default]
    None,
    /// Ordered dithering using a Bayer 4x4 threshold matrix.
    Ordered,
    /// Floyd-Steinberg error diffusion.
    FloydSteinberg,
}

impl fmt::Display for Dither {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dither::None => write!(f, "none"),
            Dither::Ordered => write!(f, "ordered"),
            Dither::FloydSteinberg => write!(f, "floyd-steinberg"),
        }
    }
}

impl FromStr for Dither {
    type Err = PierogisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Dither::None),
            "ordered" | "bayer" => Ok(Dither::Ordered),
            "floyd-steinberg" | "fs" => Ok(Dither::FloydSteinberg),
            _ => Err(PierogisError::Parse {
                message: format!("Unknown dither method: {}", s),
                help: Some("Use none, ordered or floyd-steinberg".to_string()),
            }),
        }
    }
}

/// Bayer 4x4 ordered dithering threshold matrix.
/// Values are in `[0, 16)` and normalize to `[-0.5, 0.5)` via `v / 16 - 0.5`.
const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Ordered dither strength in channel units.
const ORDERED_SPREAD: f32 = 32.0;

/// Quantize ingredient parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Quantize {
    palette: Palette,
    dither: Dither,
}

impl Quantize {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            dither: Dither::None,
        }
    }

    pub fn with_dither(mut self, dither: Dither) -> Self {
        self.dither = dither;
        self
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn cook(&self, buffer: &PixelBuffer) -> PixelBuffer {
        match self.dither {
            Dither::None => self.snap(buffer),
            Dither::Ordered => self.dither_ordered(buffer),
            Dither::FloydSteinberg => self.dither_floyd_steinberg(buffer),
        }
    }

    fn snap(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let (width, height) = buffer.shape();
        PixelBuffer::from_fn(width, height, |x, y| self.palette.nearest(buffer.pixel(x, y)))
    }

    /// Shift each channel by the Bayer threshold for its position, then snap.
    fn dither_ordered(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let (width, height) = buffer.shape();
        PixelBuffer::from_fn(width, height, |x, y| {
            // the matrix is laid out top row first
            let row = (height - 1 - y) as usize;
            let threshold = BAYER_4X4[row % 4][x as usize % 4] as f32 / 16.0 - 0.5;
            let offset = threshold * ORDERED_SPREAD;

            let c = buffer.pixel(x, y);
            let shift = |v: u8| (v as f32 + offset).clamp(0.0, 255.0) as u8;
            self.palette.nearest(Colour::rgb(shift(c.r), shift(c.g), shift(c.b)))
        })
    }

    /// Floyd-Steinberg error diffusion, scanning from the top row down.
    ///
    /// ```text
    ///        *   7/16
    ///  3/16 5/16 1/16
    /// ```
    fn dither_floyd_steinberg(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let (width, height) = buffer.shape();
        let (w, h) = (width as usize, height as usize);

        // working copy with f32 channels for error accumulation, top row first
        let mut work: Vec<[f32; 3]> = Vec::with_capacity(w * h);
        for row in 0..h {
            let y = (h - 1 - row) as u32;
            for x in 0..width {
                let c = buffer.pixel(x, y);
                work.push([c.r as f32, c.g as f32, c.b as f32]);
            }
        }

        let mut out = PixelBuffer::filled(width, height, Colour::BLACK);
        let neighbours: [(i64, i64, f32); 4] = [
            (1, 0, 7.0 / 16.0),
            (-1, 1, 3.0 / 16.0),
            (0, 1, 5.0 / 16.0),
            (1, 1, 1.0 / 16.0),
        ];

        for row in 0..h {
            for col in 0..w {
                let old = work[row * w + col];
                let clamped = Colour::rgb(
                    old[0].clamp(0.0, 255.0) as u8,
                    old[1].clamp(0.0, 255.0) as u8,
                    old[2].clamp(0.0, 255.0) as u8,
                );
                let new = self.palette.nearest(clamped);
                out.set(col as u32, (h - 1 - row) as u32, new);

                let err = [
                    old[0] - new.r as f32,
                    old[1] - new.g as f32,
                    old[2] - new.b as f32,
                ];

                for (dx, dy, weight) in &neighbours {
                    let nx = col as i64 + dx;
                    let ny = row as i64 + dy;
                    if nx >= 0 && nx < w as i64 && ny < h as i64 {
                        let cell = &mut work[ny as usize * w + nx as usize];
                        for (channel, e) in cell.iter_mut().zip(err) {
                            *channel += e * weight;
                        }
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> PixelBuffer {
        PixelBuffer::from_fn(16, 8, |x, y| Colour::rgb((x * 16) as u8, (y * 32) as u8, 128))
    }

    fn all_in_palette(buffer: &PixelBuffer, palette: &Palette) -> bool {
        buffer.pixels().all(|c| palette.colours().contains(&c))
    }

    #[test]
    fn test_snap_to_palette() {
        let palette = Palette::new(vec![Colour::BLACK, Colour::WHITE]).unwrap();
        let buffer = PixelBuffer::from_fn(3, 1, |x, _| Colour::rgb(x as u8 * 100, x as u8 * 100, x as u8 * 100));
        let cooked = Quantize::new(palette).cook(&buffer);

        assert_eq!(cooked.pixel(0, 0), Colour::BLACK);
        assert_eq!(cooked.pixel(1, 0), Colour::BLACK);
        assert_eq!(cooked.pixel(2, 0), Colour::WHITE);
    }

    #[test]
    fn test_every_method_stays_in_palette() {
        let palette = Palette::default();
        for dither in [Dither::None, Dither::Ordered, Dither::FloydSteinberg] {
            let cooked = Quantize::new(palette.clone()).with_dither(dither).cook(&gradient());
            assert!(all_in_palette(&cooked, &palette), "dither {}", dither);
        }
    }

    #[test]
    fn test_floyd_steinberg_spreads_grey() {
        let palette = Palette::new(vec![Colour::BLACK, Colour::WHITE]).unwrap();
        let grey = PixelBuffer::filled(8, 8, Colour::rgb(128, 128, 128));

        let plain = Quantize::new(palette.clone()).cook(&grey);
        assert!(plain.pixels().all(|c| c == Colour::WHITE));

        let dithered = Quantize::new(palette)
            .with_dither(Dither::FloydSteinberg)
            .cook(&grey);
        let whites = dithered.pixels().filter(|&c| c == Colour::WHITE).count();
        assert!(whites > 16 && whites < 48, "whites {}", whites);
    }

    #[test]
    fn test_dither_parse_and_display() {
        assert_eq!("fs".parse::<Dither>().unwrap(), Dither::FloydSteinberg);
        assert_eq!("bayer".parse::<Dither>().unwrap(), Dither::Ordered);
        assert!("unknown".parse::<Dither>().is_err());
        assert_eq!(Dither::FloydSteinberg.to_string(), "floyd-steinberg");
    }
}
