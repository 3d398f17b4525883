//! Power actions for device control.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Requested power state change.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerAction {
    /// Turn the device on
    On,
    /// Turn the device off
    Off,
    /// Read the current state and switch to the opposite one
    Toggle,
}

impl PowerAction {
    /// Label for the power state a device ends up in.
    pub(crate) fn state_label(on: bool) -> &'static str {
        if on { "on" } else { "off" }
    }
}
