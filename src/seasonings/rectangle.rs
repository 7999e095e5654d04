//! Rectangular region masks.
//!
//! A rectangle is placed relative to one of nine compass anchors on the
//! bounding buffer. Offsets and dimensions with an absolute value below 1
//! are fractions of the bounding dimension; anything else is in pixels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PierogisError, Result};
use crate::types::Mask;

/// Anchor a rectangle is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Ne,
    Nw,
    Se,
    #[default]
    Sw,
    N,
    E,
    S,
    W,
    C,
}

impl Origin {
    pub const ALL: [Origin; 9] = [
        Origin::Ne,
        Origin::Nw,
        Origin::Se,
        Origin::Sw,
        Origin::N,
        Origin::E,
        Origin::S,
        Origin::W,
        Origin::C,
    ];

    /// Anchor point and `(left, right, bottom, top)` extension factors.
    ///
    /// The left edge sits at `anchor.x - left * width`, the right edge at
    /// `anchor.x + right * width`, and likewise vertically.
    fn anchor(self, width: f64, height: f64) -> ((f64, f64), [f64; 4]) {
        match self {
            Origin::Sw => ((0.0, 0.0), [0.0, 1.0, 0.0, 1.0]),
            Origin::Se => ((width, 0.0), [1.0, 0.0, 0.0, 1.0]),
            Origin::Nw => ((0.0, height), [0.0, 1.0, 1.0, 0.0]),
            Origin::Ne => ((width, height), [1.0, 0.0, 1.0, 0.0]),
            Origin::C => ((width * 0.5, height * 0.5), [0.5, 0.5, 0.5, 0.5]),
            Origin::N => ((width * 0.5, height), [0.5, 0.5, 1.0, 0.0]),
            Origin::E => ((width, height * 0.5), [1.0, 0.0, 0.5, 0.5]),
            Origin::S => ((width * 0.5, 0.0), [0.5, 0.5, 0.0, 1.0]),
            Origin::W => ((0.0, height * 0.5), [0.0, 1.0, 0.5, 0.5]),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Ne => "ne",
            Origin::Nw => "nw",
            Origin::Se => "se",
            Origin::Sw => "sw",
            Origin::N => "n",
            Origin::E => "e",
            Origin::S => "s",
            Origin::W => "w",
            Origin::C => "c",
        };
        f.write_str(name)
    }
}

impl FromStr for Origin {
    type Err = PierogisError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        Origin::ALL
            .into_iter()
            .find(|origin| origin.to_string() == lowered)
            .ok_or_else(|| PierogisError::Parse {
                message: format!("Unknown origin: {}", s),
                help: Some("Use one of ne, nw, se, sw, n, e, s, w, c".to_string()),
            })
    }
}

/// Resolved rectangle in pixel coordinates, `left <= x < right` and
/// `bottom <= y < top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
    pub top: u32,
}

impl Bounds {
    pub fn bottom_left(&self) -> (u32, u32) {
        (self.left, self.bottom)
    }

    pub fn top_right(&self) -> (u32, u32) {
        (self.right, self.top)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.top.saturating_sub(self.bottom)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.bottom && y < self.top
    }
}

/// Rectangle seasoning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rectangle {
    /// Width in pixels, or a fraction of the bounding width.
    pub width: Option<f64>,
    /// Height in pixels, or a fraction of the bounding height.
    pub height: Option<f64>,
    /// Horizontal anchor offset.
    pub x: f64,
    /// Vertical anchor offset.
    pub y: f64,
    /// `width / height`, used to fill a missing dimension.
    pub aspect: Option<f64>,
    pub origin: Origin,
}

impl Rectangle {
    /// Check the parameters, returning them unchanged when usable.
    pub fn validated(self) -> Result<Self> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(value) = value {
                if value <= 0.0 || !value.is_finite() {
                    return Err(PierogisError::InvalidParameter {
                        message: format!("rectangle {} must be positive, got {}", name, value),
                        help: Some("Leave it unset to span the whole buffer".to_string()),
                    });
                }
            }
        }

        if let Some(aspect) = self.aspect {
            if aspect <= 0.0 || !aspect.is_finite() {
                return Err(PierogisError::invalid(format!(
                    "aspect must be a positive ratio, got {}",
                    aspect
                )));
            }
        }

        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(PierogisError::invalid("rectangle offsets must be finite"));
        }

        Ok(self)
    }

    /// Resolve the rectangle against a `width x height` bounding buffer.
    pub fn bounds(&self, width: u32, height: u32) -> Bounds {
        let (bw, bh) = (width as f64, height as f64);
        let ((mut ax, mut ay), [left, right, bottom, top]) = self.origin.anchor(bw, bh);

        ax += scaled(self.x, bw);
        ay += scaled(self.y, bh);

        let w = self.width.map(|v| scaled(v, bw));
        let h = self.height.map(|v| scaled(v, bh));

        let (w, h) = match (w, h) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, self.aspect.map_or(bh, |a| w / a)),
            (None, Some(h)) => (self.aspect.map_or(bw, |a| h * a), h),
            (None, None) => match self.aspect {
                Some(a) if bw / bh > a => (bh * a, bh),
                Some(a) => (bw, bw / a),
                None => (bw, bh),
            },
        };

        // truncation toward zero, then clamp into the buffer
        let clamp_x = |v: f64| (v as i64).clamp(0, width as i64) as u32;
        let clamp_y = |v: f64| (v as i64).clamp(0, height as i64) as u32;

        Bounds {
            left: clamp_x(ax - left * w),
            bottom: clamp_y(ay - bottom * h),
            right: clamp_x(ax + right * w),
            top: clamp_y(ay + top * h),
        }
    }

    /// Inclusion mask for a `width x height` buffer.
    pub fn mask(&self, width: u32, height: u32) -> Mask {
        let bounds = self.bounds(width, height);
        Mask::from_fn(width, height, |x, y| bounds.contains(x, y))
    }
}

fn scaled(value: f64, bound: f64) -> f64 {
    if value.abs() < 1.0 {
        value * bound
    } else {
        value
    }
}
