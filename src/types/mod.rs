//! Value types for device control parameters.

mod brightness;
mod color;
mod hsv;
mod kind;
mod power;

pub use brightness::Brightness;
pub use color::{Color, ColorInput};
pub use hsv::Hsv;
pub use kind::{Capabilities, ColorFormat, DeviceKind};
pub use power::PowerAction;
