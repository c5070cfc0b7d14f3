//! Palette resolution for the closed set of brand colors.
//!
//! Every color that can appear in a generated file name or be substituted
//! into a template is listed here. Adding a color means extending
//! [`ColorToken`]; nothing is inferred from arbitrary hex input.

use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// ColorToken
// ============================================================================

/// A semantic brand color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    /// The primary brand purple.
    Aesir,
    White,
    Black,
    Gray,
}

impl ColorToken {
    /// All palette entries, in declaration order.
    pub const ALL: [ColorToken; 4] = [Self::Aesir, Self::White, Self::Black, Self::Gray];

    /// Returns the `#RRGGBB` value substituted into templates.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Aesir => "#37109F",
            Self::White => "#FFFFFF",
            Self::Black => "#000000",
            Self::Gray => "#383838",
        }
    }

    /// Returns the lowercase ASCII token used in file names.
    pub fn name_token(self) -> &'static str {
        match self {
            Self::Aesir => "aesir",
            Self::White => "white",
            Self::Black => "black",
            Self::Gray => "gray",
        }
    }

    /// Returns the color as 8-bit sRGB components.
    pub fn rgb(self) -> Srgb<u8> {
        match self {
            Self::Aesir => Srgb::new(0x37, 0x10, 0x9f),
            Self::White => Srgb::new(0xff, 0xff, 0xff),
            Self::Black => Srgb::new(0x00, 0x00, 0x00),
            Self::Gray => Srgb::new(0x38, 0x38, 0x38),
        }
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_token())
    }
}

impl FromStr for ColorToken {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|token| token.name_token().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownColor(s.to_string()))
    }
}

// ============================================================================
// Background
// ============================================================================

/// The backdrop of a variant: a palette color, or nothing at all.
///
/// Serializes to the color's name token, or `"none"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Background {
    /// Pure transparency, distinct from every palette color.
    None,
    Solid(ColorToken),
}

impl Background {
    const NONE_TOKEN: &'static str = "none";

    pub fn name_token(self) -> &'static str {
        match self {
            Self::None => Self::NONE_TOKEN,
            Self::Solid(color) => color.name_token(),
        }
    }

    /// Returns the fill color, or `None` for a transparent backdrop.
    pub fn color(self) -> Option<ColorToken> {
        match self {
            Self::None => None,
            Self::Solid(color) => Some(color),
        }
    }
}

impl From<ColorToken> for Background {
    fn from(color: ColorToken) -> Self {
        Self::Solid(color)
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_token())
    }
}

impl FromStr for Background {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(Self::NONE_TOKEN) {
            Ok(Self::None)
        } else {
            s.parse().map(Self::Solid)
        }
    }
}

impl From<Background> for String {
    fn from(background: Background) -> Self {
        background.name_token().to_string()
    }
}

impl TryFrom<String> for Background {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
