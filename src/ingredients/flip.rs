//! Mirror a buffer about an axis.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PierogisError, Result};
use crate::types::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flip {
    /// Mirror left and right.
    #[default]
    Horizontal,
    /// Mirror top and bottom.
    Vertical,
}

impl Flip {
    pub fn cook(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let (width, height) = buffer.shape();
        PixelBuffer::from_fn(width, height, |x, y| match self {
            Flip::Horizontal => buffer.pixel(width - 1 - x, y),
            Flip::Vertical => buffer.pixel(x, height - 1 - y),
        })
    }
}

impl FromStr for Flip {
    type Err = PierogisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "horizontal" | "h" | "x" => Ok(Flip::Horizontal),
            "vertical" | "v" | "y" => Ok(Flip::Vertical),
            _ => Err(PierogisError::Parse {
                message: format!("Unknown flip axis: {}", s),
                help: Some("Use horizontal or vertical".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;

    #[test]
    fn test_horizontal_and_vertical() {
        let buffer = PixelBuffer::from_fn(2, 2, |x, y| Colour::rgb(x as u8, y as u8, 0));

        let h = Flip::Horizontal.cook(&buffer);
        assert_eq!(h.pixel(0, 0), Colour::rgb(1, 0, 0));

        let v = Flip::Vertical.cook(&buffer);
        assert_eq!(v.pixel(0, 0), Colour::rgb(0, 1, 0));

        assert_eq!(Flip::Vertical.cook(&v), buffer);
    }

    #[test]
    fn test_parse() {
        assert_eq!("V".parse::<Flip>().unwrap(), Flip::Vertical);
        assert!("diagonal".parse::<Flip>().is_err());
    }
}
