//! A sequence of dishes played back as an animation.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{PierogisError, Result};
use crate::plate::{resolve_fps, sink_for, FrameSink, PlaybackOptions};
use crate::types::PixelBuffer;

use super::{Dish, Recipe};

/// Ordered dishes plus the rate they play at.
#[derive(Debug, Clone, Default)]
pub struct Course {
    dishes: Vec<Dish>,
    fps: Option<f64>,
}

impl Course {
    pub fn new(dishes: Vec<Dish>) -> Self {
        Self { dishes, fps: None }
    }

    /// One dish per frame, all sharing `recipe`.
    pub fn from_frames(frames: Vec<PixelBuffer>, recipe: impl Into<Arc<Recipe>>) -> Self {
        let recipe = recipe.into();
        Self::new(
            frames
                .into_iter()
                .map(|frame| Dish::new(frame, Arc::clone(&recipe)))
                .collect(),
        )
    }

    /// One dish per frame, with the recipe for frame `i` built by `recipe_for(i)`.
    pub fn generate<F>(frames: Vec<PixelBuffer>, mut recipe_for: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Recipe>,
    {
        let dishes = frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| Ok(Dish::new(frame, recipe_for(i)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(dishes))
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn fps(&self) -> Option<f64> {
        self.fps
    }

    pub fn dishes(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    /// Serve every dish in order, returning a new course.
    pub fn serve(&self) -> Result<Course> {
        let dishes = self
            .dishes
            .iter()
            .cloned()
            .map(Dish::serve)
            .collect::<Result<Vec<_>>>()?;
        debug!(dishes = dishes.len(), "served course");
        Ok(self.with_dishes(dishes))
    }

    /// Serve dishes across the rayon pool. Results keep frame order.
    pub fn serve_parallel(&self) -> Result<Course> {
        let dishes = self
            .dishes
            .par_iter()
            .cloned()
            .map(Dish::serve)
            .collect::<Result<Vec<_>>>()?;
        debug!(dishes = dishes.len(), threads = rayon::current_num_threads(), "served course in parallel");
        Ok(self.with_dishes(dishes))
    }

    fn with_dishes(&self, dishes: Vec<Dish>) -> Course {
        Course {
            dishes,
            fps: self.fps,
        }
    }

    /// Each dish's cooked buffer, or its base when not yet served.
    pub fn frames(&self) -> Result<Vec<PixelBuffer>> {
        self.dishes
            .iter()
            .enumerate()
            .map(|(i, dish)| {
                dish.buffer().cloned().ok_or_else(|| {
                    PierogisError::invalid(format!("dish {} has no frame; serve the course first", i))
                })
            })
            .collect()
    }

    /// Rate used when writing: `fps`, else `1000 / duration`, else the
    /// course's own rate, else the default.
    pub fn resolve_fps(&self, fps: Option<f64>, duration: Option<f64>) -> f64 {
        resolve_fps(fps, duration, self.fps)
    }

    /// Write a still for one frame or an animation for many.
    pub fn save(&self, path: &Path, fps: Option<f64>, duration: Option<f64>, optimize: bool) -> Result<()> {
        let sink = sink_for(path, self.len())?;
        self.save_to(sink.as_ref(), fps, duration, optimize)
    }

    pub fn save_to(
        &self,
        sink: &dyn FrameSink,
        fps: Option<f64>,
        duration: Option<f64>,
        optimize: bool,
    ) -> Result<()> {
        let options = PlaybackOptions {
            fps: self.resolve_fps(fps, duration),
            optimize,
        };
        let frames = self.frames()?;
        debug!(path = %sink.path().display(), frames = frames.len(), fps = options.fps, "saving course");
        sink.write(&frames, &options)
    }
}
