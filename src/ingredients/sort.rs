//! Masked intensity sort.
//!
//! The buffer and its mask are rotated so the scan direction runs left to
//! right, every row is split into runs of included pixels, each run is
//! sorted by intensity, and the result is rotated back. Excluded pixels act
//! as fixed separators and never move.

use crate::error::Result;
use crate::seasonings::{Seasoning, Threshold};
use crate::types::{Mask, PixelBuffer};

use super::Rotate;

/// Sort ingredient parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    rotate: Rotate,
    seasoning: Seasoning,
}

impl Sort {
    pub fn new(rotate: Rotate) -> Self {
        Self {
            rotate,
            seasoning: Seasoning::new(Threshold::default()),
        }
    }

    /// Seasoning used to build the mask when none is attached.
    pub fn with_seasoning(mut self, seasoning: Seasoning) -> Self {
        self.seasoning = seasoning;
        self
    }

    pub fn rotate(&self) -> Rotate {
        self.rotate
    }

    /// Sort `buffer` inside `mask`, or inside this sort's own seasoning mask.
    pub fn cook(&self, buffer: &PixelBuffer, mask: Option<&Mask>) -> Result<PixelBuffer> {
        let own;
        let mask = match mask {
            Some(mask) => mask,
            None => {
                own = self.seasoning.mask(buffer)?;
                &own
            }
        };

        let mut rotated = self.rotate.cook(buffer);
        let rotated_mask = self.rotate.rotate_mask(mask);

        for y in 0..rotated.height() {
            sort_row(&mut rotated, &rotated_mask, y);
        }

        Ok(self.rotate.unrotate().cook(&rotated))
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new(Rotate::identity())
    }
}

/// Sort each run of included pixels in row `y` by ascending channel sum.
fn sort_row(buffer: &mut PixelBuffer, mask: &Mask, y: u32) {
    let width = buffer.width();
    let mut x = 0;

    while x < width {
        if !mask.get(x, y) {
            x += 1;
            continue;
        }

        let start = x;
        while x < width && mask.get(x, y) {
            x += 1;
        }

        if x - start > 1 {
            let mut run: Vec<_> = (start..x).map(|rx| buffer.pixel(rx, y)).collect();
            // stable, so equal intensities keep their order
            run.sort_by_key(|colour| colour.sum());
            for (offset, colour) in run.into_iter().enumerate() {
                buffer.set(start + offset as u32, y, colour);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;
    use pretty_assertions::assert_eq;

    fn grey(v: u8) -> Colour {
        Colour::rgb(v, v, v)
    }

    fn row(values: &[u8]) -> PixelBuffer {
        PixelBuffer::from_fn(values.len() as u32, 1, |x, _| grey(values[x as usize]))
    }

    fn values(buffer: &PixelBuffer) -> Vec<u8> {
        buffer.pixels().map(|c| c.r).collect()
    }

    #[test]
    fn test_fully_included_row_sorted() {
        let buffer = row(&[50, 10, 40, 20, 30]);
        let mask = Mask::all(5, 1);
        let sorted = Sort::default().cook(&buffer, Some(&mask)).unwrap();
        assert_eq!(values(&sorted), vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_fully_excluded_row_unchanged() {
        let buffer = row(&[50, 10, 40]);
        let mask = Mask::from_fn(3, 1, |_, _| false);
        let sorted = Sort::default().cook(&buffer, Some(&mask)).unwrap();
        assert_eq!(sorted, buffer);
    }

    #[test]
    fn test_excluded_pixels_separate_runs() {
        let buffer = row(&[30, 20, 10, 99, 5, 4, 3]);
        let mask = Mask::from_fn(7, 1, |x, _| x != 3);
        let sorted = Sort::default().cook(&buffer, Some(&mask)).unwrap();
        assert_eq!(values(&sorted), vec![10, 20, 30, 99, 3, 4, 5]);
    }

    #[test]
    fn test_single_pixel_runs_untouched() {
        let buffer = row(&[30, 20, 10, 0]);
        let mask = Mask::from_fn(4, 1, |x, _| x % 2 == 0);
        let sorted = Sort::default().cook(&buffer, Some(&mask)).unwrap();
        assert_eq!(sorted, buffer);
    }

    #[test]
    fn test_stable_for_equal_intensity() {
        let buffer = PixelBuffer::from_fn(3, 1, |x, _| match x {
            0 => Colour::rgb(30, 0, 0),
            1 => Colour::rgb(0, 0, 30),
            _ => Colour::rgb(0, 0, 1),
        });
        let sorted = Sort::default().cook(&buffer, Some(&Mask::all(3, 1))).unwrap();
        assert_eq!(sorted.pixel(0, 0), Colour::rgb(0, 0, 1));
        assert_eq!(sorted.pixel(1, 0), Colour::rgb(30, 0, 0));
        assert_eq!(sorted.pixel(2, 0), Colour::rgb(0, 0, 30));
    }

    #[test]
    fn test_rotated_sort_runs_along_columns() {
        // one column, values decreasing upward
        let buffer = PixelBuffer::from_fn(1, 3, |_, y| grey(30 - y as u8 * 10));
        let sorted = Sort::new(Rotate::default())
            .cook(&buffer, Some(&Mask::all(1, 3)))
            .unwrap();

        assert_eq!(sorted.shape(), (1, 3));
        let mut column: Vec<u8> = sorted.pixels().map(|c| c.r).collect();
        let mut original: Vec<u8> = buffer.pixels().map(|c| c.r).collect();
        assert_ne!(column, original);
        column.sort();
        original.sort();
        assert_eq!(column, original);
    }

    #[test]
    fn test_default_threshold_mask() {
        // 128 is inside the default band so it stays put
        let buffer = row(&[250, 200, 128, 40, 10]);
        let sorted = Sort::default().cook(&buffer, None).unwrap();
        assert_eq!(values(&sorted), vec![200, 250, 128, 10, 40]);
    }

    #[test]
    fn test_sort_is_a_permutation() {
        let buffer = PixelBuffer::from_fn(6, 4, |x, y| Colour::rgb((x * 40) as u8, (y * 60) as u8, ((x + y) * 17) as u8));
        let sorted = Sort::new(Rotate::new(3, true)).cook(&buffer, None).unwrap();

        let mut before: Vec<_> = buffer.pixels().map(|c| c.to_rgb()).collect();
        let mut after: Vec<_> = sorted.pixels().map(|c| c.to_rgb()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}
