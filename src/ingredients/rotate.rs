//! Quarter-turn rotation.

use serde::{Deserialize, Serialize};

use crate::types::{Mask, PixelBuffer};

/// Rotate by `turns` quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rotate {
    pub turns: u32,
    /// When set the top-left pixel becomes the top-right one.
    pub clockwise: bool,
}

impl Default for Rotate {
    fn default() -> Self {
        Self {
            turns: 1,
            clockwise: true,
        }
    }
}

impl Rotate {
    pub fn new(turns: u32, clockwise: bool) -> Self {
        Self { turns, clockwise }
    }

    /// No rotation at all.
    pub fn identity() -> Self {
        Self::new(0, true)
    }

    /// The rotation that undoes `self`.
    pub fn unrotate(&self) -> Rotate {
        Rotate::new(self.turns, !self.clockwise)
    }

    /// Net clockwise quarter turns, in `0..4`.
    fn quarter_turns(&self) -> u32 {
        let turns = self.turns % 4;
        if self.clockwise {
            turns
        } else {
            (4 - turns) % 4
        }
    }

    /// Shape of a rotated `width x height` buffer.
    pub fn output_shape(&self, width: u32, height: u32) -> (u32, u32) {
        if self.quarter_turns() % 2 == 1 {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// For a pixel of the rotated output, the source pixel it comes from.
    fn source(&self, width: u32, height: u32, x: u32, y: u32) -> (u32, u32) {
        match self.quarter_turns() {
            1 => (width - 1 - y, x),
            2 => (width - 1 - x, height - 1 - y),
            3 => (y, height - 1 - x),
            _ => (x, y),
        }
    }

    pub fn cook(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let (width, height) = buffer.shape();
        let (out_w, out_h) = self.output_shape(width, height);
        PixelBuffer::from_fn(out_w, out_h, |x, y| {
            let (sx, sy) = self.source(width, height, x, y);
            buffer.pixel(sx, sy)
        })
    }

    /// Rotate a mask the same way [`Rotate::cook`] rotates pixels.
    pub fn rotate_mask(&self, mask: &Mask) -> Mask {
        let (width, height) = mask.shape();
        let (out_w, out_h) = self.output_shape(width, height);
        Mask::from_fn(out_w, out_h, |x, y| {
            let (sx, sy) = self.source(width, height, x, y);
            mask.get(sx, sy)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;
    use pretty_assertions::assert_eq;

    fn numbered(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| Colour::rgb(x as u8, y as u8, 0))
    }

    #[test]
    fn test_clockwise_quarter_turn() {
        let buffer = numbered(3, 2);
        let rotated = Rotate::default().cook(&buffer);

        assert_eq!(rotated.shape(), (2, 3));
        // top-left (0, 1) ends up top-right (1, 2)
        assert_eq!(rotated.pixel(1, 2), buffer.pixel(0, 1));
        // bottom-left (0, 0) ends up top-left (0, 2)
        assert_eq!(rotated.pixel(0, 2), buffer.pixel(0, 0));
    }

    #[test]
    fn test_counter_clockwise_quarter_turn() {
        let buffer = numbered(3, 2);
        let rotated = Rotate::new(1, false).cook(&buffer);

        // top-left goes to bottom-left
        assert_eq!(rotated.pixel(0, 0), buffer.pixel(0, 1));
        // bottom-right goes to top-right
        assert_eq!(rotated.pixel(1, 2), buffer.pixel(2, 0));
    }

    #[test]
    fn test_four_turns_is_identity() {
        let buffer = numbered(4, 3);
        assert_eq!(Rotate::new(4, true).cook(&buffer), buffer);
        assert_eq!(Rotate::new(2, true).cook(&buffer), Rotate::new(2, false).cook(&buffer));
    }

    #[test]
    fn test_unrotate_restores() {
        let buffer = numbered(5, 3);
        for turns in 0..6 {
            for clockwise in [true, false] {
                let rotate = Rotate::new(turns, clockwise);
                let restored = rotate.unrotate().cook(&rotate.cook(&buffer));
                assert_eq!(restored, buffer, "turns {} clockwise {}", turns, clockwise);
            }
        }
    }

    #[test]
    fn test_mask_follows_pixels() {
        let mask = Mask::from_fn(3, 2, |x, y| x == 0 && y == 1);
        let rotated = Rotate::default().rotate_mask(&mask);
        assert_eq!(rotated.shape(), (2, 3));
        assert!(rotated.get(1, 2));
        assert_eq!(rotated.count(), 1);
    }
}
