//! Shared palette and colour defaults.

use serde::{Deserialize, Serialize};

use crate::error::{PierogisError, Result};

use super::Colour;

/// Default include colour for seasonings.
pub const DEFAULT_INCLUDE: Colour = Colour::WHITE;

/// Default exclude colour for seasonings.
pub const DEFAULT_EXCLUDE: Colour = Colour::BLACK;

/// The PICO-8 16-colour palette, used wherever no palette is given.
pub const DEFAULT_PALETTE: [Colour; 16] = [
    Colour::rgb(0, 0, 0),       // 0  black
    Colour::rgb(29, 43, 83),    // 1  dark blue
    Colour::rgb(126, 37, 83),   // 2  dark purple
    Colour::rgb(0, 135, 81),    // 3  dark green
    Colour::rgb(171, 82, 54),   // 4  brown
    Colour::rgb(95, 87, 79),    // 5  dark grey
    Colour::rgb(194, 195, 199), // 6  light grey
    Colour::rgb(255, 241, 232), // 7  white
    Colour::rgb(255, 0, 77),    // 8  red
    Colour::rgb(255, 163, 0),   // 9  orange
    Colour::rgb(255, 236, 39),  // 10 yellow
    Colour::rgb(0, 228, 54),    // 11 green
    Colour::rgb(41, 173, 255),  // 12 blue
    Colour::rgb(131, 118, 156), // 13 indigo
    Colour::rgb(255, 119, 168), // 14 pink
    Colour::rgb(255, 204, 170), // 15 peach
];

/// A non-empty, ordered list of colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Colour>", into = "Vec<Colour>")]
pub struct Palette {
    colours: Vec<Colour>,
}

impl Palette {
    /// Create a palette, rejecting an empty colour list.
    pub fn new(colours: Vec<Colour>) -> Result<Self> {
        if colours.is_empty() {
            return Err(PierogisError::InvalidParameter {
                message: "palette must contain at least one colour".to_string(),
                help: Some("Omit the palette to use the default 16 colours".to_string()),
            });
        }
        Ok(Self { colours })
    }

    /// Parse a comma or whitespace separated list of hex colours.
    pub fn parse(s: &str) -> Result<Self> {
        let colours = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(Colour::from_hex)
            .collect::<Result<Vec<_>>>()?;
        Self::new(colours)
    }

    pub fn colours(&self) -> &[Colour] {
        &self.colours
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Index of the closest colour by euclidean RGB distance.
    ///
    /// Ties resolve to the first colour in palette order.
    pub fn nearest_index(&self, colour: Colour) -> usize {
        let mut best_index = 0;
        let mut best_dist = u32::MAX;

        for (i, candidate) in self.colours.iter().enumerate() {
            let dist = colour.distance_sq(*candidate);
            if dist < best_dist {
                best_dist = dist;
                best_index = i;
            }
        }

        best_index
    }

    /// The closest colour by euclidean RGB distance.
    pub fn nearest(&self, colour: Colour) -> Colour {
        self.colours[self.nearest_index(colour)]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colours: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl TryFrom<Vec<Colour>> for Palette {
    type Error = PierogisError;

    fn try_from(colours: Vec<Colour>) -> Result<Self> {
        Self::new(colours)
    }
}

impl From<Palette> for Vec<Colour> {
    fn from(palette: Palette) -> Self {
        palette.colours
    }
}
