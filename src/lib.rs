//! pierogis - image and animation effects pipeline
//!
//! Pixel transforms ("ingredients") are chained into recipes, masked by
//! seasonings, served over one frame (a dish) or many (a course), and
//! plated to a still image, an animated GIF or a directory of frames.

pub mod cancel;
pub mod cli;
pub mod error;
pub mod ingredients;
pub mod kitchen;
pub mod menu;
pub mod output;
pub mod plate;
pub mod seasonings;
pub mod types;

pub use cancel::CancelToken;
pub use error::{PierogisError, Result};
pub use ingredients::{Effect, Ingredient, ShapeEffect};
pub use kitchen::{Course, Dish, Recipe};
pub use menu::{parse_recipe, prep, IngredientKind, Order};
pub use plate::{open_source, sink_for, FrameSink, FrameSource, PlaybackOptions};
pub use seasonings::{Seasoning, Threshold};
pub use types::{Colour, Mask, Palette, PixelBuffer};
