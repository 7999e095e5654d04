//! Pixel buffers and boolean masks.
//!
//! A [`PixelBuffer`] is the common currency between every ingredient: a
//! dense `width x height` grid of RGB pixels. Coordinates are `(x, y)` with
//! `y = 0` on the bottom row, so the south-west corner is `(0, 0)`. Images
//! decoded by the `image` crate are stored top row first and get flipped on
//! the way in and out.

use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{PierogisError, Result};

use super::Colour;

/// A dense RGB pixel grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGB bytes, bottom row first.
    ///
    /// Fails with `InvalidBufferShape` when `data` is not exactly
    /// `width * height * 3` bytes long.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(PierogisError::InvalidBufferShape {
                message: format!(
                    "expected {} bytes for a {}x{} RGB buffer, got {}",
                    expected,
                    width,
                    height,
                    data.len()
                ),
            });
        }
        Ok(Self { width, height, data })
    }

    /// A buffer where every pixel is `colour`.
    pub fn filled(width: u32, height: u32, colour: Colour) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * 3);
        for _ in 0..count {
            data.extend_from_slice(&colour.to_rgb());
        }
        Self { width, height, data }
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Colour) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y).to_rgb());
            }
        }
        Self { width, height, data }
    }

    /// Build a buffer from columns indexed `[x][y]`.
    ///
    /// Every column must have the same length.
    pub fn from_columns(columns: &[Vec<[u8; 3]>]) -> Result<Self> {
        let width = columns.len();
        let height = columns.first().map_or(0, |c| c.len());

        if let Some((x, column)) = columns.iter().enumerate().find(|(_, c)| c.len() != height) {
            return Err(PierogisError::InvalidBufferShape {
                message: format!(
                    "column {} has {} pixels, expected {}",
                    x,
                    column.len(),
                    height
                ),
            });
        }

        Ok(Self::from_fn(width as u32, height as u32, |x, y| {
            Colour::from(columns[x as usize][y as usize])
        }))
    }

    /// Convert a decoded image, dropping any alpha channel.
    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from_rgb_image(&image.to_rgb8())
    }

    /// Convert an RGB image (top row first).
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::from_fn(width, height, |x, y| {
            Colour::from(image.get_pixel(x, height - 1 - y).0)
        })
    }

    /// Convert to an RGB image (top row first).
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, row| {
            Rgb(self.pixel(x, self.height - 1 - row).to_rgb())
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw RGB bytes, bottom row first.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<Colour> {
        if x < self.width && y < self.height {
            Some(self.pixel(x, y))
        } else {
            None
        }
    }

    /// Pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Colour {
        let i = self.offset(x, y);
        Colour::rgb(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when `(x, y)` is out of bounds.
    pub fn set(&mut self, x: u32, y: u32, colour: Colour) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&colour.to_rgb());
    }

    /// Iterate pixels in storage order (row by row, bottom row first).
    pub fn pixels(&self) -> impl Iterator<Item = Colour> + '_ {
        self.data
            .chunks_exact(3)
            .map(|p| Colour::rgb(p[0], p[1], p[2]))
    }

    /// Fail with `ShapeMismatch` unless `other` has the same shape.
    pub fn ensure_same_shape(&self, other: &PixelBuffer, what: &str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(PierogisError::ShapeMismatch {
                message: format!(
                    "{} is {}x{} but the buffer is {}x{}",
                    what, other.width, other.height, self.width, self.height
                ),
                help: None,
            });
        }
        Ok(())
    }
}

/// A boolean inclusion plane with the same layout as a [`PixelBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// Mask from raw bits, bottom row first.
    pub fn new(width: u32, height: u32, bits: Vec<bool>) -> Result<Self> {
        if bits.len() != width as usize * height as usize {
            return Err(PierogisError::InvalidBufferShape {
                message: format!(
                    "expected {} mask bits for {}x{}, got {}",
                    width as usize * height as usize,
                    width,
                    height,
                    bits.len()
                ),
            });
        }
        Ok(Self { width, height, bits })
    }

    /// Everything included.
    pub fn all(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self { width, height, bits }
    }

    /// Pixels of `buffer` equal to `include` are in.
    pub fn matching(buffer: &PixelBuffer, include: Colour) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            bits: buffer.pixels().map(|p| p == include).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Number of included pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Logical AND of two masks of the same shape.
    pub fn and(&self, other: &Mask) -> Result<Mask> {
        if self.shape() != other.shape() {
            return Err(PierogisError::ShapeMismatch {
                message: format!(
                    "cannot combine a {}x{} mask with a {}x{} mask",
                    self.width, self.height, other.width, other.height
                ),
                help: None,
            });
        }
        Ok(Mask {
            width: self.width,
            height: self.height,
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(a, b)| *a && *b)
                .collect(),
        })
    }

    /// Encode as a binary buffer: `include` where set, `exclude` elsewhere.
    pub fn to_buffer(&self, include: Colour, exclude: Colour) -> PixelBuffer {
        let mut data = Vec::with_capacity(self.bits.len() * 3);
        for &bit in &self.bits {
            let colour = if bit { include } else { exclude };
            data.extend_from_slice(&colour.to_rgb());
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            data,
        }
    }
}
