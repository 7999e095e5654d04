//! Kitchen: recipes, dishes and courses.
//!
//! A [`Recipe`] chains ingredients with opacity compositing, a [`Dish`] is
//! one recipe served over one frame, and a [`Course`] is the ordered run of
//! dishes that makes an animation.

mod course;
mod dish;
mod recipe;

pub use course::Course;
pub use dish::Dish;
pub use recipe::{composite, Recipe};
