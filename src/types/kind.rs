//! Device capability classes.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// The capability class of a device.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    /// A binary on/off switch such as a smart plug.
    Switch,
    /// A dimmable color bulb.
    Bulb,
}

/// What a device kind can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub brightness: bool,
    pub color: bool,
}

impl DeviceKind {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            DeviceKind::Switch => Capabilities {
                brightness: false,
                color: false,
            },
            DeviceKind::Bulb => Capabilities {
                brightness: true,
                color: true,
            },
        }
    }

    /// Guess the kind from a device name: anything called a plug is a switch.
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::DeviceKind;
    ///
    /// assert_eq!(DeviceKind::infer("living_room_plug"), DeviceKind::Switch);
    /// assert_eq!(DeviceKind::infer("desk_light"), DeviceKind::Bulb);
    /// ```
    pub fn infer(name: &str) -> Self {
        if name.to_lowercase().contains("plug") {
            DeviceKind::Switch
        } else {
            DeviceKind::Bulb
        }
    }
}

/// The color form a bulb's driver accepts.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    #[default]
    Rgb,
    Hsv,
}
