//! Ordered, opacity-composited ingredient chains.

use tracing::debug;

use crate::error::{PierogisError, Result};
use crate::ingredients::Ingredient;
use crate::types::PixelBuffer;

/// An ordered list of ingredients cooked one over another.
#[derive(Debug, Clone, Default)]
pub struct Recipe {
    ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self { ingredients }
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn push(&mut self, ingredient: Ingredient) {
        self.ingredients.push(ingredient);
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Cook every ingredient in order over the running buffer.
    ///
    /// Each step's masked output is blended onto the result of all prior
    /// steps by the ingredient's opacity. An empty recipe returns a copy of
    /// `buffer`.
    pub fn cook(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let mut under = buffer.clone();

        for (step, ingredient) in self.ingredients.iter().enumerate() {
            let cooked = ingredient.cook_masked(&under)?;
            debug!(
                step,
                ingredient = ingredient.name(),
                opacity = ingredient.opacity(),
                width = cooked.width(),
                height = cooked.height(),
                "cooked ingredient"
            );
            under = composite(cooked, &under, ingredient.opacity())
                .map_err(|e| at_step(e, step, ingredient))?;
        }

        Ok(under)
    }
}

impl FromIterator<Ingredient> for Recipe {
    fn from_iter<T: IntoIterator<Item = Ingredient>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn at_step(error: PierogisError, step: usize, ingredient: &Ingredient) -> PierogisError {
    match error {
        PierogisError::ShapeMismatch { message, help } => PierogisError::ShapeMismatch {
            message: format!("step {} ({}): {}", step + 1, ingredient.name(), message),
            help,
        },
        other => other,
    }
}

/// Blend `cooked` over `under` at `opacity` percent.
///
/// Channels are mixed as `(c * op + u * (100 - op) + 50) / 100` in wide
/// integers and clipped back to 8 bits. A shape change replaces `under`
/// outright, which only makes sense at full opacity.
pub fn composite(cooked: PixelBuffer, under: &PixelBuffer, opacity: u8) -> Result<PixelBuffer> {
    if cooked.shape() != under.shape() {
        if opacity == 100 {
            return Ok(cooked);
        }
        return Err(PierogisError::ShapeMismatch {
            message: format!(
                "cannot blend a {}x{} result over a {}x{} buffer at opacity {}",
                cooked.width(),
                cooked.height(),
                under.width(),
                under.height(),
                opacity
            ),
            help: Some("Shape-changing ingredients must run at opacity 100".to_string()),
        });
    }

    match opacity {
        100 => Ok(cooked),
        0 => Ok(under.clone()),
        _ => {
            let op = opacity as u32;
            let data = cooked
                .as_raw()
                .iter()
                .zip(under.as_raw())
                .map(|(&c, &u)| ((c as u32 * op + u as u32 * (100 - op) + 50) / 100).min(255) as u8)
                .collect();
            PixelBuffer::new(under.width(), under.height(), data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::{Effect, Flip, Quantize, Resize, Rotate, Sort};
    use crate::seasonings::{Seasoning, Threshold};
    use crate::types::{Colour, Palette};
    use pretty_assertions::assert_eq;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            Colour::rgb((x * 40) as u8, (y * 50) as u8, ((x + y) * 20) as u8)
        })
    }

    fn red_quantize() -> Quantize {
        Quantize::new(Palette::new(vec![Colour::rgb(255, 0, 0), Colour::rgb(0, 0, 255)]).unwrap())
    }

    #[test]
    fn test_empty_recipe_is_identity() {
        for (w, h) in [(1, 1), (3, 2), (5, 5)] {
            let buffer = gradient(w, h);
            assert_eq!(Recipe::default().cook(&buffer).unwrap(), buffer);
        }
    }

    #[test]
    fn test_opacity_zero_leaves_buffer() {
        let buffer = gradient(4, 4);
        let recipe = Recipe::default().with_ingredient(Ingredient::new(red_quantize()).with_opacity(0).unwrap());
        assert_eq!(recipe.cook(&buffer).unwrap(), buffer);
    }

    #[test]
    fn test_opacity_full_equals_raw_cook() {
        let buffer = gradient(4, 4);
        let ingredient = Ingredient::new(red_quantize());
        let raw = ingredient.cook(&buffer).unwrap();
        let recipe = Recipe::new(vec![ingredient]);
        assert_eq!(recipe.cook(&buffer).unwrap(), raw);
    }

    #[test]
    fn test_half_opacity_rounds() {
        let under = PixelBuffer::filled(1, 1, Colour::rgb(0, 10, 255));
        let cooked = PixelBuffer::filled(1, 1, Colour::rgb(255, 11, 0));
        let blended = composite(cooked, &under, 50).unwrap();
        // (255*50 + 50) / 100 = 128, (11*50 + 10*50 + 50) / 100 = 11
        assert_eq!(blended.pixel(0, 0), Colour::rgb(128, 11, 128));
    }

    #[test]
    fn test_order_matters() {
        let buffer = gradient(3, 2);
        let flip_then_rotate = Recipe::new(vec![
            Ingredient::new(Flip::Horizontal),
            Ingredient::new(Rotate::default()),
        ]);
        let rotate_then_flip = Recipe::new(vec![
            Ingredient::new(Rotate::default()),
            Ingredient::new(Flip::Horizontal),
        ]);
        assert!(flip_then_rotate.cook(&buffer).unwrap() != rotate_then_flip.cook(&buffer).unwrap());
    }

    #[test]
    fn test_shape_change_at_full_opacity() {
        let buffer = gradient(4, 2);
        let recipe = Recipe::new(vec![
            Ingredient::new(Rotate::default()),
            Ingredient::new(Sort::default()),
        ]);
        let cooked = recipe.cook(&buffer).unwrap();
        assert_eq!(cooked.shape(), (2, 4));
    }

    #[test]
    fn test_shape_change_below_full_opacity_fails() {
        let resize = Resize {
            scale: 2.0,
            ..Default::default()
        };
        let recipe = Recipe::new(vec![Ingredient::new(resize).with_opacity(50).unwrap()]);
        let err = recipe.cook(&gradient(2, 2)).unwrap_err();
        assert!(matches!(err, PierogisError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_masked_ingredient_in_recipe() {
        let buffer = PixelBuffer::from_fn(2, 1, |x, _| if x == 0 { Colour::WHITE } else { Colour::rgb(120, 120, 120) });
        let recipe = Recipe::new(vec![
            Ingredient::new(red_quantize()).with_seasoning(Seasoning::new(Threshold::default()))
        ]);
        let cooked = recipe.cook(&buffer).unwrap();
        assert_eq!(cooked.pixel(0, 0), Colour::rgb(255, 0, 0));
        assert_eq!(cooked.pixel(1, 0), Colour::rgb(120, 120, 120));
    }

    #[test]
    fn test_noop_collects() {
        let recipe: Recipe = vec![Ingredient::new(Effect::Noop); 3].into_iter().collect();
        assert_eq!(recipe.len(), 3);
    }
}
