//! Ingredients: the pixel transforms a recipe is built from.
//!
//! An [`Ingredient`] pairs an [`Effect`] with an opacity and the seasonings
//! that mask it. Effects are a closed set resolved when the recipe is
//! assembled; each one declares whether it keeps the buffer's shape.

mod crop;
mod flip;
pub mod mmpx;
mod pierogi;
mod quantize;
mod resize;
mod rotate;
mod sort;
mod spatial_quantize;

use tracing::trace;

use crate::error::{PierogisError, Result};
use crate::seasonings::Seasoning;
use crate::types::{Mask, PixelBuffer};

pub use crop::Crop;
pub use flip::Flip;
pub use pierogi::Pierogi;
pub use quantize::{Dither, Quantize};
pub use resize::{Resample, Resize};
pub use rotate::Rotate;
pub use sort::Sort;
pub use spatial_quantize::{SpatialQuantize, SpatialQuantizeParams, MAX_PALETTE_SIZE};

/// Whether an effect keeps the shape of the buffer it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeEffect {
    Preserves,
    Transforms,
}

/// The transform an ingredient applies.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Returns the input unchanged.
    Noop,
    Pierogi(Pierogi),
    /// A seasoning cooked on its own yields its binary mask buffer.
    Season(Seasoning),
    Quantize(Quantize),
    SpatialQuantize(SpatialQuantize),
    Sort(Sort),
    Rotate(Rotate),
    Resize(Resize),
    Flip(Flip),
    Crop(Crop),
    Mmpx,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Noop => "noop",
            Effect::Pierogi(_) => "pierogi",
            Effect::Season(seasoning) => seasoning.name(),
            Effect::Quantize(_) => "quantize",
            Effect::SpatialQuantize(_) => "spatial-quantize",
            Effect::Sort(_) => "sort",
            Effect::Rotate(_) => "rotate",
            Effect::Resize(_) => "resize",
            Effect::Flip(_) => "flip",
            Effect::Crop(_) => "crop",
            Effect::Mmpx => "mmpx",
        }
    }

    pub fn shape_effect(&self) -> ShapeEffect {
        match self {
            Effect::Pierogi(_)
            | Effect::Rotate(_)
            | Effect::Resize(_)
            | Effect::Crop(_)
            | Effect::Mmpx => ShapeEffect::Transforms,
            _ => ShapeEffect::Preserves,
        }
    }

    /// Size this effect produces regardless of its input, if any.
    pub fn declared_size(&self) -> Option<(u32, u32)> {
        match self {
            Effect::Pierogi(pierogi) => Some(pierogi.shape()),
            _ => None,
        }
    }

    /// Apply the effect. `mask` is the combined seasoning mask, when any
    /// seasonings are attached; only effects that select their own pixels
    /// read it.
    pub fn cook(&self, buffer: &PixelBuffer, mask: Option<&Mask>) -> Result<PixelBuffer> {
        match self {
            Effect::Noop => Ok(buffer.clone()),
            Effect::Pierogi(pierogi) => Ok(pierogi.cook()),
            Effect::Season(seasoning) => seasoning.cook(buffer),
            Effect::Quantize(quantize) => Ok(quantize.cook(buffer)),
            Effect::SpatialQuantize(quantize) => quantize.cook(buffer),
            Effect::Sort(sort) => sort.cook(buffer, mask),
            Effect::Rotate(rotate) => Ok(rotate.cook(buffer)),
            Effect::Resize(resize) => resize.cook(buffer),
            Effect::Flip(flip) => Ok(flip.cook(buffer)),
            Effect::Crop(crop) => crop.cook(buffer),
            Effect::Mmpx => Ok(mmpx::magnify(buffer)),
        }
    }
}

macro_rules! effect_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Effect {
                fn from(value: $variant) -> Self {
                    Effect::$variant(value)
                }
            }
        )*
    };
}

effect_from!(Pierogi, Quantize, SpatialQuantize, Sort, Rotate, Resize, Flip, Crop);

impl From<Seasoning> for Effect {
    fn from(seasoning: Seasoning) -> Self {
        Effect::Season(seasoning)
    }
}

/// An effect with an opacity and its attached seasonings.
#[derive(Debug, Clone)]
pub struct Ingredient {
    effect: Effect,
    opacity: u8,
    seasonings: Vec<Seasoning>,
}

impl Ingredient {
    /// Full opacity.
    pub const OPACITY: u8 = 100;

    pub fn new(effect: impl Into<Effect>) -> Self {
        Self {
            effect: effect.into(),
            opacity: Self::OPACITY,
            seasonings: Vec::new(),
        }
    }

    /// Set the compositing weight, `0..=100`.
    pub fn with_opacity(mut self, opacity: u8) -> Result<Self> {
        if opacity > 100 {
            return Err(PierogisError::InvalidParameter {
                message: format!("opacity must be 0..=100, got {}", opacity),
                help: None,
            });
        }
        self.opacity = opacity;
        Ok(self)
    }

    pub fn with_seasoning(mut self, seasoning: Seasoning) -> Self {
        self.seasonings.push(seasoning);
        self
    }

    /// Attach a mask source.
    pub fn season(&mut self, seasoning: Seasoning) -> &mut Self {
        self.seasonings.push(seasoning);
        self
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn name(&self) -> &'static str {
        self.effect.name()
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn seasonings(&self) -> &[Seasoning] {
        &self.seasonings
    }

    pub fn shape_effect(&self) -> ShapeEffect {
        self.effect.shape_effect()
    }

    pub fn declared_size(&self) -> Option<(u32, u32)> {
        self.effect.declared_size()
    }

    /// AND of every seasoning mask, or `None` without seasonings.
    pub fn mask(&self, buffer: &PixelBuffer) -> Result<Option<Mask>> {
        let mut combined: Option<Mask> = None;
        for seasoning in &self.seasonings {
            let mask = seasoning.mask(buffer)?;
            combined = Some(match combined {
                Some(existing) => existing.and(&mask)?,
                None => mask,
            });
        }
        Ok(combined)
    }

    /// The effect's raw output, ignoring the mask for compositing.
    pub fn cook(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let mask = self.mask(buffer)?;
        self.effect.cook(buffer, mask.as_ref())
    }

    /// The effect's output where the seasonings include a pixel, and the
    /// input pixel everywhere else.
    pub fn cook_masked(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        if !self.seasonings.is_empty() && self.shape_effect() == ShapeEffect::Transforms {
            return Err(PierogisError::ShapeMismatch {
                message: format!("{} changes the buffer shape and cannot be seasoned", self.name()),
                help: Some("Move the seasoning to an ingredient that keeps the shape".to_string()),
            });
        }

        let mask = self.mask(buffer)?;
        let cooked = self.effect.cook(buffer, mask.as_ref())?;

        if self.shape_effect() == ShapeEffect::Preserves && cooked.shape() != buffer.shape() {
            return Err(PierogisError::InvalidBufferShape {
                message: format!(
                    "{} returned {}x{} for a {}x{} buffer",
                    self.name(),
                    cooked.width(),
                    cooked.height(),
                    buffer.width(),
                    buffer.height()
                ),
            });
        }

        let Some(mask) = mask else {
            return Ok(cooked);
        };

        trace!(ingredient = self.name(), included = mask.count(), "applying mask");
        let (width, height) = buffer.shape();
        Ok(PixelBuffer::from_fn(width, height, |x, y| {
            if mask.get(x, y) {
                cooked.pixel(x, y)
            } else {
                buffer.pixel(x, y)
            }
        }))
    }
}
