//! Order files: a whole cooking job in YAML.
//!
//! ```yaml
//! fps: 12
//! output: cooked/spin.gif
//! recipe:
//!   - type: sort
//!     turns: 1
//!     seasonings:
//!       - type: threshold
//!         lower: 40
//!   - type: quantize
//!     palette: ["#000000", "#ffffff"]
//!     opacity: 50
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{PierogisError, Result};
use crate::kitchen::Recipe;

use super::{prep, IngredientKind};

/// One recipe entry: a type name plus its flat parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntry {
    #[serde(rename = "type")]
    pub kind: IngredientKind,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// A cooking job loaded from an order file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Order {
    /// Playback rate for animated output.
    pub fps: Option<f64>,

    /// Milliseconds per frame, used when `fps` is unset.
    pub duration: Option<f64>,

    /// Merge repeated frames and compress harder.
    pub optimize: bool,

    /// Where to write the result.
    pub output: Option<PathBuf>,

    pub recipe: Vec<OrderEntry>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            fps: None,
            duration: None,
            optimize: true,
            output: None,
            recipe: vec![],
        }
    }
}

impl Order {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PierogisError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read order: {}", e),
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| PierogisError::Parse {
            message: format!("Invalid order: {}", e),
            help: Some("Each recipe entry needs a type, e.g. `- type: sort`".to_string()),
        })
    }

    /// Whether `path` looks like an order file.
    pub fn is_order_path(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
    }

    /// Prep every entry into a recipe.
    pub fn recipe(&self) -> Result<Recipe> {
        self.recipe
            .iter()
            .map(|entry| prep(entry.kind, &entry.params))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_order() {
        let order = Order::parse(
            r##"
fps: 12
optimize: false
output: out/spin.gif
recipe:
  - type: sort
    turns: 1
    seasonings:
      - type: threshold
        lower: 40
  - type: quantize
    palette: ["#000000", [255, 255, 255]]
    opacity: 50
"##,
        )
        .unwrap();

        assert_eq!(order.fps, Some(12.0));
        assert!(!order.optimize);
        assert_eq!(order.output, Some(PathBuf::from("out/spin.gif")));

        let recipe = order.recipe().unwrap();
        assert_eq!(recipe.len(), 2);
        assert_eq!(recipe.ingredients()[0].seasonings().len(), 1);
        assert_eq!(recipe.ingredients()[1].opacity(), 50);
    }

    #[test]
    fn test_defaults() {
        let order = Order::parse("recipe: []").unwrap();
        assert!(order.optimize);
        assert_eq!(order.fps, None);
        assert!(order.recipe().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_top_level_key() {
        assert!(Order::parse("speed: 3").is_err());
    }

    #[test]
    fn test_unknown_type() {
        let err = Order::parse("recipe:\n  - type: flambe\n").unwrap_err();
        assert!(matches!(err, PierogisError::Parse { .. }));
    }

    #[test]
    fn test_bad_params_surface_on_recipe() {
        let order = Order::parse("recipe:\n  - type: rotate\n    spin: 2\n").unwrap();
        assert!(matches!(order.recipe().unwrap_err(), PierogisError::InvalidParameter { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.yaml");
        std::fs::write(&path, "fps: 5\nrecipe:\n  - type: mmpx\n").unwrap();

        assert!(Order::is_order_path(&path));
        let order = Order::load(&path).unwrap();
        assert_eq!(order.fps, Some(5.0));
        assert_eq!(order.recipe().unwrap().len(), 1);
    }
}
