//! Brightness level for dimmable devices.

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Brightness level from 0 to 100 percent.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Brightness {
    const MAX: u8 = 100;

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (0-100).
    pub fn create(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Brightness { value })
    }

    /// Validate user input, which may be any integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::Brightness;
    ///
    /// assert_eq!(Brightness::parse(50).unwrap().value(), 50);
    /// assert!(Brightness::parse(101).is_err());
    /// assert!(Brightness::parse(-1).is_err());
    /// ```
    pub fn parse(value: i64) -> Result<Self, Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::create)
            .ok_or_else(|| Error::InvalidFormat(format!("brightness {value} is outside 0-100")))
    }

    /// Whether the device should be powered on to show this level.
    pub fn is_lit(&self) -> bool {
        self.value > 0
    }
}
