//! Resampling resize.

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

use crate::error::{PierogisError, Result};
use crate::types::PixelBuffer;

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resample {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Resample {
    fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for Resample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resample::Nearest => write!(f, "nearest"),
            Resample::Triangle => write!(f, "triangle"),
            Resample::CatmullRom => write!(f, "catmull-rom"),
            Resample::Gaussian => write!(f, "gaussian"),
            Resample::Lanczos3 => write!(f, "lanczos3"),
        }
    }
}

impl FromStr for Resample {
    type Err = PierogisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Resample::Nearest),
            "triangle" | "bilinear" => Ok(Resample::Triangle),
            "catmull-rom" | "bicubic" => Ok(Resample::CatmullRom),
            "gaussian" => Ok(Resample::Gaussian),
            "lanczos3" | "lanczos" => Ok(Resample::Lanczos3),
            _ => Err(PierogisError::Parse {
                message: format!("Unknown resample filter: {}", s),
                help: Some("Use nearest, triangle, catmull-rom, gaussian or lanczos3".to_string()),
            }),
        }
    }
}

/// Resize to explicit dimensions and/or by a scale factor.
///
/// With only one of width and height the other follows the input's aspect
/// ratio. Fractional results round down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Resize {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: f64,
    pub resample: Resample,
}

impl Default for Resize {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            scale: 1.0,
            resample: Resample::default(),
        }
    }
}

impl Resize {
    /// Largest side a resize may produce.
    pub const MAX_SIDE: u32 = 1 << 15;

    pub fn validated(self) -> Result<Self> {
        if self.scale <= 0.0 || !self.scale.is_finite() {
            return Err(PierogisError::invalid(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(PierogisError::invalid("resize dimensions must be non-zero"));
        }
        if let Some(side) = self.width.into_iter().chain(self.height).find(|&s| s > Self::MAX_SIDE) {
            return Err(too_large(side as f64));
        }
        Ok(self)
    }

    /// Output shape for a `width x height` input. Sides above
    /// [`Self::MAX_SIDE`] are rejected.
    pub fn output_shape(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        let (w, h) = (width as f64, height as f64);
        let (w, h) = match (self.width, self.height) {
            (Some(tw), Some(th)) => (tw as f64, th as f64),
            (Some(tw), None) => (tw as f64, tw as f64 * h / w),
            (None, Some(th)) => (th as f64 * w / h, th as f64),
            (None, None) => (w, h),
        };
        let (w, h) = ((w * self.scale).floor(), (h * self.scale).floor());
        if let Some(side) = [w, h].into_iter().find(|&s| s.is_nan() || s > Self::MAX_SIDE as f64) {
            return Err(too_large(side));
        }
        Ok((w as u32, h as u32))
    }

    pub fn cook(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let (width, height) = self.output_shape(buffer.width(), buffer.height())?;
        if width == 0 || height == 0 {
            return Err(PierogisError::InvalidParameter {
                message: format!(
                    "resizing {}x{} gives an empty {}x{} buffer",
                    buffer.width(),
                    buffer.height(),
                    width,
                    height
                ),
                help: Some("Use a larger scale or explicit dimensions".to_string()),
            });
        }
        if (width, height) == buffer.shape() {
            return Ok(buffer.clone());
        }

        let resized = imageops::resize(&buffer.to_image(), width, height, self.resample.filter());
        Ok(PixelBuffer::from_rgb_image(&resized))
    }
}

fn too_large(side: f64) -> PierogisError {
    PierogisError::InvalidParameter {
        message: format!("resize gives a side of {}, above the limit of {}", side, Resize::MAX_SIDE),
        help: Some("Use a smaller scale or explicit dimensions".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;

    #[test]
    fn test_scale_rounds_down() {
        let buffer = PixelBuffer::filled(5, 5, Colour::WHITE);
        let resize = Resize {
            scale: 0.5,
            ..Default::default()
        };
        assert_eq!(resize.cook(&buffer).unwrap().shape(), (2, 2));
    }

    #[test]
    fn test_width_keeps_aspect() {
        let buffer = PixelBuffer::filled(2, 3, Colour::WHITE);
        let resize = Resize {
            width: Some(1),
            ..Default::default()
        };
        assert_eq!(resize.cook(&buffer).unwrap().shape(), (1, 1));
    }

    #[test]
    fn test_explicit_dimensions_and_scale() {
        let buffer = PixelBuffer::filled(4, 4, Colour::BLACK);
        let resize = Resize {
            width: Some(3),
            height: Some(2),
            scale: 2.0,
            ..Default::default()
        };
        assert_eq!(resize.output_shape(4, 4).unwrap(), (6, 4));
        let cooked = resize.cook(&buffer).unwrap();
        assert!(cooked.pixels().all(|c| c == Colour::BLACK));
    }

    #[test]
    fn test_nearest_upscale_keeps_orientation() {
        let buffer = PixelBuffer::from_fn(1, 2, |_, y| if y == 0 { Colour::BLACK } else { Colour::WHITE });
        let resize = Resize {
            scale: 2.0,
            ..Default::default()
        };
        let cooked = resize.cook(&buffer).unwrap();
        assert_eq!(cooked.pixel(0, 0), Colour::BLACK);
        assert_eq!(cooked.pixel(1, 3), Colour::WHITE);
    }

    #[test]
    fn test_invalid() {
        let zero = Resize {
            scale: 0.0,
            ..Default::default()
        };
        assert!(zero.validated().is_err());

        let tiny = Resize {
            scale: 0.1,
            ..Default::default()
        };
        assert!(tiny.cook(&PixelBuffer::filled(2, 2, Colour::WHITE)).is_err());
    }

    #[test]
    fn test_oversized_output_rejected() {
        let buffer = PixelBuffer::filled(2, 2, Colour::WHITE);
        let huge = Resize {
            scale: 1e12,
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert!(matches!(
            huge.cook(&buffer).unwrap_err(),
            PierogisError::InvalidParameter { .. }
        ));

        let wide = Resize {
            width: Some(Resize::MAX_SIDE + 1),
            ..Default::default()
        };
        assert!(wide.validated().is_err());

        // aspect can push the free side over the limit
        let tall = Resize {
            width: Some(Resize::MAX_SIDE),
            ..Default::default()
        };
        assert!(tall.output_shape(1, 2).is_err());
        assert_eq!(tall.output_shape(2, 1).unwrap(), (Resize::MAX_SIDE, Resize::MAX_SIDE / 2));
    }
}
