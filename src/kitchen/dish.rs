//! One recipe served over one frame.

use std::sync::Arc;

use tracing::debug;

use crate::error::{PierogisError, Result};
use crate::types::{Colour, PixelBuffer};

use super::Recipe;

/// A base frame and the recipe to cook over it.
///
/// Serving stores the cooked buffer; the base is kept so the dish can be
/// served again with another recipe.
#[derive(Debug, Clone)]
pub struct Dish {
    base: Option<PixelBuffer>,
    recipe: Arc<Recipe>,
    cooked: Option<PixelBuffer>,
}

impl Dish {
    pub fn new(base: PixelBuffer, recipe: impl Into<Arc<Recipe>>) -> Self {
        Self {
            base: Some(base),
            recipe: recipe.into(),
            cooked: None,
        }
    }

    /// A dish without a base frame. The first ingredient must declare its
    /// size (a pierogi does).
    pub fn unplated(recipe: impl Into<Arc<Recipe>>) -> Self {
        Self {
            base: None,
            recipe: recipe.into(),
            cooked: None,
        }
    }

    pub fn with_recipe(mut self, recipe: impl Into<Arc<Recipe>>) -> Self {
        self.recipe = recipe.into();
        self.cooked = None;
        self
    }

    pub fn base(&self) -> Option<&PixelBuffer> {
        self.base.as_ref()
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn cooked(&self) -> Option<&PixelBuffer> {
        self.cooked.as_ref()
    }

    pub fn is_served(&self) -> bool {
        self.cooked.is_some()
    }

    /// The cooked buffer if served, else the base.
    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.cooked.as_ref().or(self.base.as_ref())
    }

    /// Cook the recipe and keep the result.
    pub fn serve(mut self) -> Result<Self> {
        let blank;
        let base = match &self.base {
            Some(base) => base,
            None => {
                blank = self.blank()?;
                &blank
            }
        };

        let cooked = self.recipe.cook(base)?;
        debug!(
            ingredients = self.recipe.len(),
            width = cooked.width(),
            height = cooked.height(),
            "served dish"
        );
        self.cooked = Some(cooked);
        Ok(self)
    }

    /// White canvas sized by the first ingredient.
    fn blank(&self) -> Result<PixelBuffer> {
        let size = self.recipe.ingredients().first().and_then(|i| i.declared_size());
        match size {
            Some((width, height)) => Ok(PixelBuffer::filled(width, height, Colour::WHITE)),
            None => Err(PierogisError::InvalidParameter {
                message: "a dish without a base frame needs a sized first ingredient".to_string(),
                help: Some("Start the recipe with a pierogi or pass a frame".to_string()),
            }),
        }
    }
}
