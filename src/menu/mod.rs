//! The menu: building ingredients from names and parameters.
//!
//! Ingredient type names are resolved to an [`IngredientKind`] once, when a
//! recipe is assembled. Parameters arrive either as a flat key/value map
//! (order files) or as command-line style text (recipe strings).

mod args;
mod order;

use std::fmt;
use std::str::FromStr;

use clap::Parser;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PierogisError, Result};
use crate::ingredients::{
    Crop, Dither, Effect, Flip, Ingredient, Quantize, Resize, Rotate, Sort, SpatialQuantize,
    SpatialQuantizeParams,
};
use crate::kitchen::Recipe;
use crate::seasonings::{Rectangle, Seasoning, Threshold};
use crate::types::{Colour, Palette};

pub use args::{
    FlipArgs, QuantizeArgs, RectangleArgs, ResizeArgs, RotateArgs, SortArgs, Step, ThresholdArgs,
};
pub use order::{Order, OrderEntry};

/// Every ingredient that can be named in a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngredientKind {
    Sort,
    Quantize,
    SpatialQuantize,
    Threshold,
    Rectangle,
    Rotate,
    Resize,
    Flip,
    Crop,
    Mmpx,
    Noop,
}

impl IngredientKind {
    pub const ALL: [IngredientKind; 11] = [
        IngredientKind::Sort,
        IngredientKind::Quantize,
        IngredientKind::SpatialQuantize,
        IngredientKind::Threshold,
        IngredientKind::Rectangle,
        IngredientKind::Rotate,
        IngredientKind::Resize,
        IngredientKind::Flip,
        IngredientKind::Crop,
        IngredientKind::Mmpx,
        IngredientKind::Noop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IngredientKind::Sort => "sort",
            IngredientKind::Quantize => "quantize",
            IngredientKind::SpatialQuantize => "spatial-quantize",
            IngredientKind::Threshold => "threshold",
            IngredientKind::Rectangle => "rectangle",
            IngredientKind::Rotate => "rotate",
            IngredientKind::Resize => "resize",
            IngredientKind::Flip => "flip",
            IngredientKind::Crop => "crop",
            IngredientKind::Mmpx => "mmpx",
            IngredientKind::Noop => "noop",
        }
    }

    /// Kinds that can be attached to other ingredients as masks.
    pub fn is_seasoning(self) -> bool {
        matches!(self, IngredientKind::Threshold | IngredientKind::Rectangle)
    }
}

impl fmt::Display for IngredientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IngredientKind {
    type Err = PierogisError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase().replace('_', "-");
        IngredientKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lowered)
            .ok_or_else(|| PierogisError::Parse {
                message: format!("Unknown ingredient: {}", s),
                help: Some(format!(
                    "Known ingredients: {}",
                    IngredientKind::ALL.map(|k| k.name()).join(", ")
                )),
            })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SortParams {
    turns: u32,
    clockwise: Option<bool>,
    lower: Option<u8>,
    upper: Option<u8>,
    inner: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct QuantizeParams {
    palette: Option<Palette>,
    dither: Dither,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ThresholdParams {
    lower: Option<u8>,
    upper: Option<u8>,
    inner: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FlipParams {
    axis: Flip,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

fn parse_params<T: DeserializeOwned>(kind: IngredientKind, params: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(params)).map_err(|e| PierogisError::InvalidParameter {
        message: format!("{}: {}", kind, e),
        help: Some(format!("Check the parameters given to {}", kind)),
    })
}

fn take<T: DeserializeOwned>(
    kind: IngredientKind,
    params: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>> {
    params
        .remove(key)
        .map(|value| {
            serde_json::from_value(value).map_err(|e| PierogisError::InvalidParameter {
                message: format!("{} {}: {}", kind, key, e),
                help: None,
            })
        })
        .transpose()
}

/// Build a seasoning from its parameters, including `include`/`exclude`
/// colours.
pub fn prep_seasoning(kind: IngredientKind, params: &Map<String, Value>) -> Result<Seasoning> {
    let mut params = params.clone();
    let include: Option<Colour> = take(kind, &mut params, "include")?;
    let exclude: Option<Colour> = take(kind, &mut params, "exclude")?;

    let seasoning = match kind {
        IngredientKind::Threshold => {
            let p: ThresholdParams = parse_params(kind, params)?;
            Seasoning::new(Threshold::new(p.lower, p.upper)?.with_inner(p.inner))
        }
        IngredientKind::Rectangle => {
            let rectangle: Rectangle = parse_params(kind, params)?;
            Seasoning::new(rectangle.validated()?)
        }
        _ => {
            return Err(PierogisError::InvalidParameter {
                message: format!("{} cannot be used as a seasoning", kind),
                help: Some("Seasonings are threshold or rectangle".to_string()),
            })
        }
    };

    Ok(args::with_colours(seasoning, include, exclude))
}

fn prep_effect(kind: IngredientKind, params: Map<String, Value>) -> Result<Effect> {
    let effect = match kind {
        IngredientKind::Sort => {
            let p: SortParams = parse_params(kind, params)?;
            let threshold = Threshold::new(p.lower, p.upper)?.with_inner(p.inner);
            let rotate = Rotate::new(p.turns, p.clockwise.unwrap_or(true));
            Sort::new(rotate).with_seasoning(Seasoning::new(threshold)).into()
        }
        IngredientKind::Quantize => {
            let p: QuantizeParams = parse_params(kind, params)?;
            Quantize::new(p.palette.unwrap_or_default())
                .with_dither(p.dither)
                .into()
        }
        IngredientKind::SpatialQuantize => {
            let p: SpatialQuantizeParams = parse_params(kind, params)?;
            SpatialQuantize::new(p)?.into()
        }
        IngredientKind::Threshold | IngredientKind::Rectangle => {
            Effect::Season(prep_seasoning(kind, &params)?)
        }
        IngredientKind::Rotate => parse_params::<Rotate>(kind, params)?.into(),
        IngredientKind::Resize => parse_params::<Resize>(kind, params)?.validated()?.into(),
        IngredientKind::Flip => parse_params::<FlipParams>(kind, params)?.axis.into(),
        IngredientKind::Crop => Crop::new(parse_params(kind, params)?)?.into(),
        IngredientKind::Mmpx | IngredientKind::Noop => {
            parse_params::<NoParams>(kind, params)?;
            if kind == IngredientKind::Mmpx {
                Effect::Mmpx
            } else {
                Effect::Noop
            }
        }
    };
    Ok(effect)
}

/// Build an ingredient from a flat parameter map.
///
/// `opacity` and `seasonings` are handled here; every other key must be a
/// parameter of `kind`.
pub fn prep(kind: IngredientKind, params: &Map<String, Value>) -> Result<Ingredient> {
    let mut params = params.clone();
    let opacity: Option<u8> = take(kind, &mut params, "opacity")?;
    let seasonings: Vec<OrderEntry> = take(kind, &mut params, "seasonings")?.unwrap_or_default();

    let mut ingredient = Ingredient::new(prep_effect(kind, params)?);
    if let Some(opacity) = opacity {
        ingredient = ingredient.with_opacity(opacity)?;
    }
    for entry in &seasonings {
        ingredient.season(prep_seasoning(entry.kind, &entry.params)?);
    }

    debug!(
        ingredient = %kind,
        opacity = ingredient.opacity(),
        seasonings = ingredient.seasonings().len(),
        "prepped ingredient"
    );
    Ok(ingredient)
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct StepLine {
    #[command(subcommand)]
    step: Step,
}

/// Parse a recipe string such as `"sort --turns 1; quantize -n 8"`.
///
/// Steps are separated by `;` and take the same options as the matching
/// CLI subcommands.
pub fn parse_recipe(text: &str) -> Result<Recipe> {
    text.split(';')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(|step| {
            let line = StepLine::try_parse_from(step.split_whitespace()).map_err(|e| {
                PierogisError::Parse {
                    message: format!("Invalid recipe step '{}'", step),
                    help: Some(e.render().to_string().trim().to_string()),
                }
            })?;
            line.step.prep()
        })
        .collect()
}
