//! Cooking a file: load frames, serve the course, plate the result.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use tracing::info;

use crate::error::Result;
use crate::kitchen::{Course, Recipe};
use crate::menu::Order;
use crate::output::{display_path, plural, Printer};
use crate::plate::{open_source, sink_for, FrameSink, FramesDirSink};

/// Directory cooked files land in unless told otherwise.
pub const COOKED_DIR: &str = "cooked";

/// Options shared by every cooking command
#[derive(Args, Debug, Clone)]
pub struct CookArgs {
    /// Image, animated GIF or directory of frames
    pub path: PathBuf,

    /// Output file or directory [default: cooked/<name>.png or .gif]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Frames per second for animated output
    #[arg(long)]
    pub fps: Option<f64>,

    /// Milliseconds per frame, used when --fps is not given
    #[arg(long)]
    pub duration: Option<f64>,

    /// Keep repeated frames and use fast compression
    #[arg(long)]
    pub no_optimize: bool,

    /// Write numbered frames into a directory
    #[arg(long)]
    pub frames: bool,

    /// Cook frames in parallel
    #[arg(long)]
    pub parallel: bool,
}

/// Resolved output settings for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub output: Option<PathBuf>,
    pub fps: Option<f64>,
    pub duration: Option<f64>,
    pub optimize: bool,
    pub frames: bool,
    pub parallel: bool,
}

impl From<&CookArgs> for Plan {
    fn from(args: &CookArgs) -> Self {
        Self {
            output: args.output.clone(),
            fps: args.fps,
            duration: args.duration,
            optimize: !args.no_optimize,
            frames: args.frames,
            parallel: args.parallel,
        }
    }
}

impl Plan {
    /// Fill unset values from an order file. Flags given on the command
    /// line win.
    pub fn with_order(mut self, order: &Order) -> Self {
        self.output = self.output.or_else(|| order.output.clone());
        self.fps = self.fps.or(order.fps);
        self.duration = self.duration.or(order.duration);
        self.optimize = self.optimize && order.optimize;
        self
    }
}

/// `cooked/<stem>.png` for a still, `.gif` for an animation, or a
/// `cooked/<stem>` directory when writing frames.
pub fn default_output(input: &Path, frame_count: usize, frames: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("pierogi");

    let dir = Path::new(COOKED_DIR);
    if frames {
        dir.join(stem)
    } else if frame_count > 1 {
        dir.join(format!("{}.gif", stem))
    } else {
        dir.join(format!("{}.png", stem))
    }
}

/// Cook `path` with `recipe` and write the result, returning the output path.
pub fn run(path: &Path, recipe: Recipe, plan: &Plan, printer: &Printer) -> Result<PathBuf> {
    let started = Instant::now();

    let source = open_source(path)?;
    let frames = source.frames()?;
    let count = frames.len();

    printer.status(
        "Cooking",
        &format!("{} ({})", display_path(path), plural(count, "frame", "frames")),
    );
    if !recipe.is_empty() {
        let names: Vec<&str> = recipe.ingredients().iter().map(|i| i.name()).collect();
        printer.info("Recipe", &names.join(" > "));
    }

    let mut course = Course::from_frames(frames, recipe);
    if let Some(fps) = source.fps() {
        course = course.with_fps(fps);
    }

    let served = if plan.parallel {
        course.serve_parallel()?
    } else {
        course.serve()?
    };

    let output = plan
        .output
        .clone()
        .unwrap_or_else(|| default_output(path, count, plan.frames));
    let sink: Box<dyn FrameSink> = if plan.frames {
        Box::new(FramesDirSink::new(&output))
    } else {
        sink_for(&output, count)?
    };

    if count == 1 && !plan.frames && (plan.fps.is_some() || plan.duration.is_some()) {
        printer.warning("Ignoring", "frame rate for a single frame");
    }

    served.save_to(sink.as_ref(), plan.fps, plan.duration, plan.optimize)?;
    info!(output = %output.display(), frames = count, "plated");

    printer.status("Plated", &display_path(&output));
    printer.status(
        "Finished",
        &format!("{} in {:.2}s", plural(count, "frame", "frames"), started.elapsed().as_secs_f64()),
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::{Flip, Ingredient};
    use crate::plate::FrameSource;
    use crate::types::{Colour, PixelBuffer};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn plan(output: PathBuf) -> Plan {
        Plan {
            output: Some(output),
            fps: None,
            duration: None,
            optimize: true,
            frames: false,
            parallel: false,
        }
    }

    #[test]
    fn test_default_output() {
        assert_eq!(default_output(Path::new("in/cat.jpg"), 1, false), PathBuf::from("cooked/cat.png"));
        assert_eq!(default_output(Path::new("in/cat.gif"), 4, false), PathBuf::from("cooked/cat.gif"));
        assert_eq!(default_output(Path::new("in/cat.gif"), 4, true), PathBuf::from("cooked/cat"));
    }

    #[test]
    fn test_order_fills_unset_values() {
        let order = Order::parse("fps: 8\noptimize: false\noutput: o.gif\n").unwrap();
        let mut base = plan(PathBuf::from("mine.gif"));
        base.fps = None;
        let merged = base.with_order(&order);

        assert_eq!(merged.output, Some(PathBuf::from("mine.gif")));
        assert_eq!(merged.fps, Some(8.0));
        assert!(!merged.optimize);
    }

    #[test]
    fn test_run_still() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.png");
        let buffer = PixelBuffer::from_fn(2, 1, |x, _| Colour::rgb(x as u8 * 200, 0, 0));
        buffer.to_image().save(&input).unwrap();

        let output = dir.path().join("out.png");
        let recipe = Recipe::new(vec![Ingredient::new(Flip::Horizontal)]);
        let written = run(&input, recipe, &plan(output.clone()), &Printer::new(true)).unwrap();

        assert_eq!(written, output);
        let cooked = open_source(&output).unwrap().frame(0).unwrap();
        assert_eq!(cooked.pixel(0, 0), Colour::rgb(200, 0, 0));
    }
}
