//! RGB color representation and parsing of user-supplied colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    const HEX_ERROR: &'static str = "Invalid color format. Use #RRGGBB format.";

    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Parse a `#RRGGBB` string (hex digits in either case).
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::Color;
    ///
    /// let color = Color::parse_hex("#ff8000").unwrap();
    /// assert_eq!((color.red(), color.green(), color.blue()), (255, 128, 0));
    ///
    /// assert!(Color::parse_hex("ff8000").is_err());
    /// assert!(Color::parse_hex("#ff80").is_err());
    /// assert!(Color::parse_hex("#gg8000").is_err());
    /// ```
    pub fn parse_hex(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidFormat(Self::HEX_ERROR.to_string());

        let digits = s.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Build a color from three integers, each of which must be in 0-255.
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::Color;
    ///
    /// assert_eq!(Color::from_rgb(255, 0, 0).unwrap(), Color::rgb(255, 0, 0));
    /// assert!(Color::from_rgb(256, 0, 0).is_err());
    /// assert!(Color::from_rgb(0, -1, 0).is_err());
    /// ```
    pub fn from_rgb(red: i64, green: i64, blue: i64) -> Result<Self, Error> {
        let channel = |name: &str, value: i64| {
            u8::try_from(value).map_err(|_| {
                Error::InvalidFormat(format!("{name} component {value} is outside 0-255"))
            })
        };
        Ok(Self::rgb(
            channel("red", red)?,
            channel("green", green)?,
            channel("blue", blue)?,
        ))
    }

    /// Encode as an uppercase `#RRGGBB` string.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::parse_hex(s)
    }
}

/// A color as a client may send it.
///
/// Accepts `"#RRGGBB"`, `[r, g, b]` or `{"r": .., "g": .., "b": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    Hex(String),
    Triple([i64; 3]),
    Channels { r: i64, g: i64, b: i64 },
}

impl ColorInput {
    /// Validate and normalize into a [`Color`].
    pub fn resolve(&self) -> Result<Color, Error> {
        match self {
            ColorInput::Hex(s) => Color::parse_hex(s),
            ColorInput::Triple([r, g, b]) | ColorInput::Channels { r, g, b } => {
                Color::from_rgb(*r, *g, *b)
            }
        }
    }
}
