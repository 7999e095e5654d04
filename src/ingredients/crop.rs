//! Cut a rectangular region out of a buffer.

use crate::error::{PierogisError, Result};
use crate::seasonings::Rectangle;
use crate::types::PixelBuffer;

/// Crop to the region a [`Rectangle`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Crop {
    region: Rectangle,
}

impl Crop {
    pub fn new(region: Rectangle) -> Result<Self> {
        Ok(Self {
            region: region.validated()?,
        })
    }

    pub fn region(&self) -> &Rectangle {
        &self.region
    }

    pub fn cook(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let bounds = self.region.bounds(buffer.width(), buffer.height());
        if bounds.is_empty() {
            return Err(PierogisError::InvalidParameter {
                message: format!(
                    "crop region ({}, {})..({}, {}) is empty on a {}x{} buffer",
                    bounds.left,
                    bounds.bottom,
                    bounds.right,
                    bounds.top,
                    buffer.width(),
                    buffer.height()
                ),
                help: Some("Check the offsets against the buffer size".to_string()),
            });
        }

        Ok(PixelBuffer::from_fn(bounds.width(), bounds.height(), |x, y| {
            buffer.pixel(bounds.left + x, bounds.bottom + y)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seasonings::Origin;
    use crate::types::Colour;

    fn fixture() -> PixelBuffer {
        PixelBuffer::from_fn(3, 3, |x, y| Colour::rgb(x as u8, y as u8, 7))
    }

    fn crop(region: Rectangle) -> PixelBuffer {
        Crop::new(region).unwrap().cook(&fixture()).unwrap()
    }

    #[test]
    fn test_width_only() {
        let cooked = crop(Rectangle {
            width: Some(1.0),
            ..Default::default()
        });
        assert_eq!(cooked.shape(), (1, 3));
    }

    #[test]
    fn test_height_only() {
        let cooked = crop(Rectangle {
            height: Some(2.0),
            ..Default::default()
        });
        assert_eq!(cooked.shape(), (3, 2));
    }

    #[test]
    fn test_aspect_only() {
        let narrow = crop(Rectangle {
            aspect: Some(2.0 / 3.0),
            ..Default::default()
        });
        assert_eq!(narrow.shape(), (2, 3));

        let flat = crop(Rectangle {
            aspect: Some(3.0 / 2.0),
            ..Default::default()
        });
        assert_eq!(flat.shape(), (3, 2));
    }

    #[test]
    fn test_dimension_with_aspect() {
        let tall = crop(Rectangle {
            width: Some(1.0),
            aspect: Some(0.5),
            ..Default::default()
        });
        assert_eq!(tall.shape(), (1, 2));

        let wide = crop(Rectangle {
            height: Some(1.0),
            aspect: Some(2.0),
            ..Default::default()
        });
        assert_eq!(wide.shape(), (2, 1));
    }

    #[test]
    fn test_offset_origin() {
        let cooked = crop(Rectangle {
            x: 1.0,
            y: 1.0,
            height: Some(1.0),
            ..Default::default()
        });
        assert_eq!(cooked.shape(), (2, 1));
        assert_eq!(cooked.pixel(0, 0), Colour::rgb(1, 1, 7));
    }

    #[test]
    fn test_corner_origin() {
        let cooked = crop(Rectangle {
            width: Some(1.0),
            height: Some(1.0),
            origin: Origin::Ne,
            ..Default::default()
        });
        assert_eq!(cooked.shape(), (1, 1));
        assert_eq!(cooked.pixel(0, 0), Colour::rgb(2, 2, 7));
    }

    #[test]
    fn test_empty_region_fails() {
        let crop = Crop::new(Rectangle {
            x: 10.0,
            ..Default::default()
        })
        .unwrap();
        assert!(crop.cook(&fixture()).is_err());
    }
}
