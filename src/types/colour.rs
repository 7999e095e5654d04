//! Colour type and parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PierogisError, Result};

/// An RGB colour value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "ColourLiteral", into = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    /// Create a new colour from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Parse a hex colour string.
    ///
    /// Supports formats:
    /// - `#RGB` (3 digits, expanded to 6)
    /// - `#RRGGBB` (6 digits)
    ///
    /// The leading `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);

        if !hex.is_ascii() {
            return Err(invalid_hex(s));
        }

        match hex.len() {
            3 => {
                // #RGB -> #RRGGBB
                let mut digits = [0u8; 3];
                for (slot, c) in digits.iter_mut().zip(hex.chars()) {
                    *slot = parse_hex_digit(c)?;
                }
                let [r, g, b] = digits;
                Ok(Self::rgb(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 => {
                let r = parse_hex_byte(&hex[0..2])?;
                let g = parse_hex_byte(&hex[2..4])?;
                let b = parse_hex_byte(&hex[4..6])?;
                Ok(Self::rgb(r, g, b))
            }
            _ => Err(invalid_hex(s)),
        }
    }

    /// Convert to an RGB array.
    pub fn to_rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Sum of the three channels.
    pub fn sum(self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }

    /// Weighted luma `299 R + 587 G + 114 B`, a thousand times the
    /// 0..=255 luma. Exact, so greys land on their own value.
    pub fn luma_milli(self) -> u32 {
        299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32
    }

    /// Weighted luma `0.299 R + 0.587 G + 0.114 B`.
    pub fn luma(self) -> f64 {
        self.luma_milli() as f64 / 1000.0
    }

    /// Squared euclidean distance in RGB space.
    pub fn distance_sq(self, other: Colour) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl From<[u8; 3]> for Colour {
    fn from(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }
}

impl From<Colour> for [u8; 3] {
    fn from(colour: Colour) -> Self {
        colour.to_rgb()
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        colour.to_string()
    }
}

impl FromStr for Colour {
    type Err = PierogisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colour literal as it appears in order files: `"#ff0000"` or `[255, 0, 0]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColourLiteral {
    Hex(String),
    Triple([u8; 3]),
}

impl TryFrom<ColourLiteral> for Colour {
    type Error = PierogisError;

    fn try_from(literal: ColourLiteral) -> Result<Self> {
        match literal {
            ColourLiteral::Hex(s) => Colour::from_hex(&s),
            ColourLiteral::Triple(rgb) => Ok(Colour::from(rgb)),
        }
    }
}

fn invalid_hex(s: &str) -> PierogisError {
    PierogisError::Parse {
        message: format!("Invalid hex colour: {}", s),
        help: Some("Use #RGB or #RRGGBB format, or an [r, g, b] triple".to_string()),
    }
}

/// Parse a single hex digit.
fn parse_hex_digit(c: char) -> Result<u8> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or_else(|| PierogisError::Parse {
            message: format!("Invalid hex digit: {}", c),
            help: None,
        })
}

/// Parse a two-character hex byte.
fn parse_hex_byte(s: &str) -> Result<u8> {
    u8::from_str_radix(s, 16).map_err(|_| PierogisError::Parse {
        message: format!("Invalid hex byte: {}", s),
        help: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_6digit() {
        let c = Colour::from_hex("#FF0000").unwrap();
        assert_eq!(c, Colour::rgb(255, 0, 0));

        let c = Colour::from_hex("#1a1a2e").unwrap();
        assert_eq!(c, Colour::rgb(0x1a, 0x1a, 0x2e));
    }

    #[test]
    fn test_from_hex_3digit() {
        let c = Colour::from_hex("#ABC").unwrap();
        assert_eq!(c, Colour::rgb(0xAA, 0xBB, 0xCC));
    }

    #[test]
    fn test_from_hex_no_hash() {
        let c = Colour::from_hex("00ff00").unwrap();
        assert_eq!(c, Colour::rgb(0, 255, 0));
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(Colour::from_hex("#GGG").is_err());
        assert!(Colour::from_hex("#12345").is_err());
        assert!(Colour::from_hex("#FF000080").is_err());
        assert!(Colour::from_hex("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Colour::rgb(255, 0, 10)), "#FF000A");
    }

    #[test]
    fn test_deserialize_literals() {
        let hex: Colour = serde_json::from_str("\"#0000ff\"").unwrap();
        assert_eq!(hex, Colour::rgb(0, 0, 255));

        let triple: Colour = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(triple, Colour::rgb(1, 2, 3));

        assert!(serde_json::from_str::<Colour>("[1, 2]").is_err());
        assert!(serde_json::from_str::<Colour>("\"nope\"").is_err());
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(Colour::BLACK.luma(), 0.0);
        assert!((Colour::WHITE.luma() - 255.0).abs() < 1e-9);
        assert!((Colour::rgb(100, 100, 100).luma() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_grey_luma_is_exact() {
        for v in 0..=255u8 {
            assert_eq!(Colour::rgb(v, v, v).luma_milli(), v as u32 * 1000);
        }
    }

    #[test]
    fn test_distance_sq() {
        assert_eq!(Colour::BLACK.distance_sq(Colour::rgb(1, 2, 3)), 14);
        assert_eq!(Colour::WHITE.distance_sq(Colour::WHITE), 0);
    }
}
