//! Command-line parameters for each ingredient.
//!
//! The same definitions back the CLI subcommands and the steps of a recipe
//! string, so `pierogis sort --turns 1` and `"sort --turns 1"` agree.

use clap::{Args, Subcommand};

use crate::error::Result;
use crate::ingredients::{
    Crop, Dither, Effect, Flip, Ingredient, Quantize, Resample, Resize, Rotate, Sort,
    SpatialQuantize, SpatialQuantizeParams,
};
use crate::seasonings::{Origin, Rectangle, Seasoning, Threshold};
use crate::types::{Colour, Palette};

/// Luma band selection
#[derive(Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// Include pixels with luma at or below this
    #[arg(short = 'l', long)]
    pub lower: Option<u8>,

    /// Include pixels with luma at or above this
    #[arg(short = 'u', long)]
    pub upper: Option<u8>,

    /// Include the band between the bounds instead
    #[arg(short = 'i', long)]
    pub inner: bool,

    /// Colour marking included pixels
    #[arg(long)]
    pub include: Option<Colour>,

    /// Colour marking excluded pixels
    #[arg(long)]
    pub exclude: Option<Colour>,
}

impl ThresholdArgs {
    pub fn threshold(&self) -> Result<Threshold> {
        Ok(Threshold::new(self.lower, self.upper)?.with_inner(self.inner))
    }

    pub fn seasoning(&self) -> Result<Seasoning> {
        Ok(with_colours(Seasoning::new(self.threshold()?), self.include, self.exclude))
    }
}

pub(crate) fn with_colours(seasoning: Seasoning, include: Option<Colour>, exclude: Option<Colour>) -> Seasoning {
    let seasoning = match include {
        Some(colour) => seasoning.with_include(colour),
        None => seasoning,
    };
    match exclude {
        Some(colour) => seasoning.with_exclude(colour),
        None => seasoning,
    }
}

/// Direction from the `--clockwise`/`--ccw` pair. The flags override each
/// other, so at most one is set; neither means clockwise.
fn turn_clockwise(clockwise: bool, ccw: bool) -> bool {
    clockwise || !ccw
}

/// Sort runs of bright and dark pixels
#[derive(Args, Debug, Clone, Default)]
pub struct SortArgs {
    /// Quarter turns applied before sorting
    #[arg(short = 't', long, default_value_t = 0)]
    pub turns: u32,

    /// Turn clockwise (the default)
    #[arg(long, overrides_with = "ccw")]
    pub clockwise: bool,

    /// Turn counter-clockwise
    #[arg(long, overrides_with = "clockwise")]
    pub ccw: bool,

    #[command(flatten)]
    pub threshold: ThresholdArgs,
}

impl SortArgs {
    pub fn prep(&self) -> Result<Ingredient> {
        let rotate = Rotate::new(self.turns, turn_clockwise(self.clockwise, self.ccw));
        let sort = Sort::new(rotate).with_seasoning(self.threshold.seasoning()?);
        Ok(Ingredient::new(sort))
    }
}

/// Reduce to a small palette
#[derive(Args, Debug, Clone, Default)]
pub struct QuantizeArgs {
    /// Number of colours to choose
    #[arg(short = 'n', long)]
    pub palette_size: Option<u32>,

    /// Fixed palette, e.g. "#000000,#ffffff"; on its own it snaps without annealing
    #[arg(short = 'p', long)]
    pub palette: Option<String>,

    /// Dithering for a fixed-palette snap: none, ordered or floyd-steinberg
    #[arg(long)]
    pub dither: Option<Dither>,

    /// Iterations per coarseness level
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Sweeps per temperature
    #[arg(long)]
    pub repeats: Option<u32>,

    #[arg(long)]
    pub initial_temp: Option<f64>,

    #[arg(long)]
    pub final_temp: Option<f64>,

    /// Filter side: 1, 3 or 5
    #[arg(long)]
    pub filter_size: Option<u32>,

    /// Dithering strength
    #[arg(short = 'd', long)]
    pub dithering_level: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl QuantizeArgs {
    /// Whether only a palette snap was asked for.
    fn is_snap(&self) -> bool {
        let annealing = self.palette_size.is_some()
            || self.iterations.is_some()
            || self.repeats.is_some()
            || self.initial_temp.is_some()
            || self.final_temp.is_some()
            || self.filter_size.is_some()
            || self.dithering_level.is_some()
            || self.seed.is_some();
        self.dither.is_some() || (self.palette.is_some() && !annealing)
    }

    pub fn prep(&self) -> Result<Ingredient> {
        let palette = self.palette.as_deref().map(Palette::parse).transpose()?;

        if self.is_snap() {
            let quantize = Quantize::new(palette.unwrap_or_default()).with_dither(self.dither.unwrap_or_default());
            return Ok(Ingredient::new(quantize));
        }

        let defaults = SpatialQuantizeParams::default();
        let params = SpatialQuantizeParams {
            palette_size: self
                .palette_size
                .or(palette.as_ref().map(|p| p.len() as u32))
                .unwrap_or(defaults.palette_size),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            repeats: self.repeats.unwrap_or(defaults.repeats),
            initial_temp: self.initial_temp.unwrap_or(defaults.initial_temp),
            final_temp: self.final_temp.unwrap_or(defaults.final_temp),
            filter_size: self.filter_size.unwrap_or(defaults.filter_size),
            dithering_level: self.dithering_level.unwrap_or(defaults.dithering_level),
            seed: self.seed.unwrap_or(defaults.seed),
            palette,
        };
        Ok(Ingredient::new(SpatialQuantize::new(params)?))
    }
}

/// Change dimensions
#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    /// Target width; height follows the aspect ratio when omitted
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height
    #[arg(long)]
    pub height: Option<u32>,

    /// Scale factor applied after width and height
    #[arg(short = 's', long, default_value_t = 1.0)]
    pub scale: f64,

    /// nearest, triangle, catmull-rom, gaussian or lanczos3
    #[arg(short = 'f', long, default_value_t = Resample::Nearest)]
    pub filter: Resample,
}

impl ResizeArgs {
    pub fn prep(&self) -> Result<Ingredient> {
        let resize = Resize {
            width: self.width,
            height: self.height,
            scale: self.scale,
            resample: self.filter,
        }
        .validated()?;
        Ok(Ingredient::new(resize))
    }
}

/// Quarter-turn rotation
#[derive(Args, Debug, Clone)]
pub struct RotateArgs {
    #[arg(short = 't', long, default_value_t = 1)]
    pub turns: u32,

    /// Turn clockwise (the default)
    #[arg(long, overrides_with = "ccw")]
    pub clockwise: bool,

    /// Turn counter-clockwise
    #[arg(long, overrides_with = "clockwise")]
    pub ccw: bool,
}

impl RotateArgs {
    pub fn prep(&self) -> Result<Ingredient> {
        Ok(Ingredient::new(Rotate::new(self.turns, turn_clockwise(self.clockwise, self.ccw))))
    }
}

/// Rectangular region
#[derive(Args, Debug, Clone, Default)]
pub struct RectangleArgs {
    /// Width in pixels, or a fraction when below 1
    #[arg(long)]
    pub width: Option<f64>,

    /// Height in pixels, or a fraction when below 1
    #[arg(long)]
    pub height: Option<f64>,

    /// Horizontal offset from the origin
    #[arg(short = 'x', long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub x: f64,

    /// Vertical offset from the origin
    #[arg(short = 'y', long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub y: f64,

    /// Width over height, used for a missing dimension
    #[arg(long)]
    pub aspect: Option<f64>,

    /// Anchor: ne, nw, se, sw, n, e, s, w or c
    #[arg(long, default_value_t = Origin::Sw)]
    pub origin: Origin,
}

impl RectangleArgs {
    pub fn rectangle(&self) -> Result<Rectangle> {
        Rectangle {
            width: self.width,
            height: self.height,
            x: self.x,
            y: self.y,
            aspect: self.aspect,
            origin: self.origin,
        }
        .validated()
    }

    pub fn prep_crop(&self) -> Result<Ingredient> {
        Ok(Ingredient::new(Crop::new(self.rectangle()?)?))
    }
}

/// Mirror about an axis
#[derive(Args, Debug, Clone)]
pub struct FlipArgs {
    /// horizontal or vertical
    #[arg(short = 'a', long, default_value = "horizontal")]
    pub axis: Flip,
}

impl FlipArgs {
    pub fn prep(&self) -> Result<Ingredient> {
        Ok(Ingredient::new(self.axis))
    }
}

/// One step of a recipe string.
#[derive(Subcommand, Debug, Clone)]
pub enum Step {
    /// Sort pixel runs by intensity
    Sort(SortArgs),
    /// Reduce colours, spatially or by palette snap
    Quantize(QuantizeArgs),
    /// Black and white luma mask
    Threshold(ThresholdArgs),
    /// Rectangle mask
    Rectangle(RectangleArgs),
    Resize(ResizeArgs),
    Rotate(RotateArgs),
    /// Cut out a rectangle
    Crop(RectangleArgs),
    Flip(FlipArgs),
    /// 2x pixel-art upscale
    Mmpx,
    /// Pass frames through unchanged
    Noop,
}

impl Step {
    pub fn prep(&self) -> Result<Ingredient> {
        match self {
            Step::Sort(args) => args.prep(),
            Step::Quantize(args) => args.prep(),
            Step::Threshold(args) => Ok(Ingredient::new(args.seasoning()?)),
            Step::Rectangle(args) => Ok(Ingredient::new(Seasoning::new(args.rectangle()?))),
            Step::Resize(args) => args.prep(),
            Step::Rotate(args) => args.prep(),
            Step::Crop(args) => args.prep_crop(),
            Step::Flip(args) => args.prep(),
            Step::Mmpx => Ok(Ingredient::new(Effect::Mmpx)),
            Step::Noop => Ok(Ingredient::new(Effect::Noop)),
        }
    }
}
