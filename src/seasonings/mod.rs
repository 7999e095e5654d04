//! Seasonings: ingredients that produce selection masks.
//!
//! A seasoning cooks to a binary buffer where every pixel is either its
//! include colour or its exclude colour. Attached to another ingredient it
//! limits which pixels that ingredient may change.

mod rectangle;
mod threshold;

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::ingredients::Ingredient;
use crate::types::{Colour, Mask, PixelBuffer, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};

pub use rectangle::{Bounds, Origin, Rectangle};
pub use threshold::Threshold;

/// How a seasoning decides which pixels are in.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Pixels equal to the include colour.
    Match,
    /// Pixels outside (or inside) a luma band.
    Threshold(Threshold),
    /// Pixels inside a rectangle.
    Rectangle(Rectangle),
}

impl From<Threshold> for Selection {
    fn from(threshold: Threshold) -> Self {
        Selection::Threshold(threshold)
    }
}

impl From<Rectangle> for Selection {
    fn from(rectangle: Rectangle) -> Self {
        Selection::Rectangle(rectangle)
    }
}

/// A mask-producing ingredient.
#[derive(Debug, Clone, PartialEq)]
pub struct Seasoning {
    selection: Selection,
    include: Colour,
    exclude: Colour,
    target: Option<Arc<PixelBuffer>>,
}

impl Seasoning {
    pub fn new(selection: impl Into<Selection>) -> Self {
        Self {
            selection: selection.into(),
            include: DEFAULT_INCLUDE,
            exclude: DEFAULT_EXCLUDE,
            target: None,
        }
    }

    /// Equality test against the include colour.
    pub fn matching() -> Self {
        Self::new(Selection::Match)
    }

    pub fn with_include(mut self, include: Colour) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude(mut self, exclude: Colour) -> Self {
        self.exclude = exclude;
        self
    }

    /// Evaluate against `target` instead of the buffer being cooked.
    pub fn with_target(mut self, target: Arc<PixelBuffer>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn include(&self) -> Colour {
        self.include
    }

    pub fn exclude(&self) -> Colour {
        self.exclude
    }

    pub fn target(&self) -> Option<&PixelBuffer> {
        self.target.as_deref()
    }

    pub fn name(&self) -> &'static str {
        match self.selection {
            Selection::Match => "match",
            Selection::Threshold(_) => "threshold",
            Selection::Rectangle(_) => "rectangle",
        }
    }

    /// The buffer this seasoning reads, after checking its shape.
    fn source<'a>(&'a self, buffer: &'a PixelBuffer) -> Result<&'a PixelBuffer> {
        match &self.target {
            Some(target) => {
                buffer.ensure_same_shape(target, "seasoning target")?;
                Ok(target)
            }
            None => Ok(buffer),
        }
    }

    /// The raw selection, before the include/exclude colour encoding.
    fn select(&self, source: &PixelBuffer) -> Result<Mask> {
        match &self.selection {
            Selection::Match => Ok(Mask::matching(source, self.include)),
            Selection::Threshold(threshold) => threshold.mask_fast(source),
            Selection::Rectangle(rectangle) => Ok(rectangle.mask(source.width(), source.height())),
        }
    }

    /// Inclusion mask for `buffer`.
    ///
    /// A pixel is in when the cooked binary buffer shows the include colour
    /// there, so identical include and exclude colours select everything.
    pub fn mask(&self, buffer: &PixelBuffer) -> Result<Mask> {
        let source = self.source(buffer)?;
        if self.include == self.exclude {
            return Ok(Mask::all(source.width(), source.height()));
        }
        let mask = self.select(source)?;
        trace!(
            seasoning = self.name(),
            included = mask.count(),
            total = buffer.len(),
            "seasoning mask"
        );
        Ok(mask)
    }

    /// Cook to the binary include/exclude buffer.
    pub fn cook(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let source = self.source(buffer)?;
        Ok(self.select(source)?.to_buffer(self.include, self.exclude))
    }

    /// Attach this seasoning to `recipient` as a mask source.
    pub fn season(self, recipient: &mut Ingredient) {
        recipient.season(self);
    }
}

impl Default for Seasoning {
    fn default() -> Self {
        Self::matching()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PierogisError;
    use crate::ingredients::{Effect, Ingredient};
    use pretty_assertions::assert_eq;

    fn checker() -> PixelBuffer {
        PixelBuffer::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Colour::WHITE
            } else {
                Colour::BLACK
            }
        })
    }

    #[test]
    fn test_match_cook_is_binary() {
        let red = Colour::rgb(255, 0, 0);
        let buffer = PixelBuffer::from_fn(2, 1, |x, _| if x == 0 { red } else { Colour::WHITE });
        let cooked = Seasoning::matching()
            .with_include(red)
            .with_exclude(Colour::rgb(0, 0, 255))
            .cook(&buffer)
            .unwrap();

        assert_eq!(cooked.pixel(0, 0), red);
        assert_eq!(cooked.pixel(1, 0), Colour::rgb(0, 0, 255));
    }

    #[test]
    fn test_threshold_cook_uses_colours() {
        let buffer = PixelBuffer::from_fn(2, 1, |x, _| if x == 0 { Colour::WHITE } else { Colour::rgb(128, 128, 128) });
        let cooked = Seasoning::new(Threshold::default()).cook(&buffer).unwrap();
        assert_eq!(cooked.pixel(0, 0), DEFAULT_INCLUDE);
        assert_eq!(cooked.pixel(1, 0), DEFAULT_EXCLUDE);
    }

    #[test]
    fn test_target_overrides_input() {
        let target = Arc::new(checker());
        let seasoning = Seasoning::matching().with_target(target);
        let plain = PixelBuffer::filled(4, 4, Colour::rgb(9, 9, 9));

        let mask = seasoning.mask(&plain).unwrap();
        assert_eq!(mask.count(), 8);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn test_target_shape_mismatch() {
        let seasoning = Seasoning::matching().with_target(Arc::new(checker()));
        let err = seasoning.mask(&PixelBuffer::filled(3, 3, Colour::WHITE)).unwrap_err();
        assert!(matches!(err, PierogisError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_same_include_and_exclude_selects_everything() {
        let seasoning = Seasoning::matching()
            .with_include(Colour::WHITE)
            .with_exclude(Colour::WHITE);
        let mask = seasoning.mask(&checker()).unwrap();
        assert_eq!(mask.count(), 16);
    }

    #[test]
    fn test_season_attaches() {
        let mut ingredient = Ingredient::new(Effect::Noop);
        Seasoning::default().season(&mut ingredient);
        Seasoning::new(Threshold::default()).season(&mut ingredient);
        assert_eq!(ingredient.seasonings().len(), 2);
    }
}
