//! Device state as reported by a device.

use serde::{Deserialize, Serialize};

use crate::types::{Color, Hsv};

/// Power, hue and brightness of a device at the time it was queried.
///
/// Switches only report power; `hue` and `brightness` are `None` for them.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub is_on: bool,
    pub hue: Option<u16>,
    pub brightness: Option<u8>,
}

impl DeviceState {
    pub fn switch(is_on: bool) -> Self {
        DeviceState {
            is_on,
            hue: None,
            brightness: None,
        }
    }
}

impl From<&PilotResult> for DeviceState {
    fn from(res: &PilotResult) -> Self {
        let hue = res
            .hue
            .or_else(|| res.get_color().map(|c| Hsv::from(&c).hue()));

        DeviceState {
            is_on: res.state,
            hue,
            brightness: res.dimming,
        }
    }
}

/// Device status as reported via getPilot.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct PilotReply {
    pub result: PilotResult,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct PilotResult {
    pub state: bool,
    pub hue: Option<u16>,
    pub dimming: Option<u8>,
    #[serde(rename = "r")]
    pub red: Option<u8>,
    #[serde(rename = "g")]
    pub green: Option<u8>,
    #[serde(rename = "b")]
    pub blue: Option<u8>,
}

impl PilotResult {
    pub fn get_color(&self) -> Option<Color> {
        match (self.red, self.green, self.blue) {
            (Some(r), Some(g), Some(b)) => Some(Color::rgb(r, g, b)),
            _ => None,
        }
    }
}
