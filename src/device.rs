//! The device driver seam.
//!
//! A [`Connector`] authenticates against a [`DeviceEndpoint`] and yields a
//! [`Device`]; the pair is kept together in an immutable [`DeviceHandle`].
//! Handles are never mutated: a reconnect builds a new one.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::Error;
use crate::status::DeviceState;
use crate::types::{Brightness, Color, ColorFormat, DeviceKind, Hsv};

type Result<T> = std::result::Result<T, Error>;

/// Opaque device identifier, unique within the configuration.
pub type DeviceName = String;

/// Where a device lives and what it can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub address: SocketAddr,
    pub kind: DeviceKind,
    pub color_format: ColorFormat,
}

impl DeviceEndpoint {
    pub fn new(address: SocketAddr, kind: DeviceKind) -> Self {
        DeviceEndpoint {
            address,
            kind,
            color_format: ColorFormat::default(),
        }
    }

    pub fn with_color_format(mut self, color_format: ColorFormat) -> Self {
        self.color_format = color_format;
        self
    }
}

/// Credential pair used to authenticate against every device.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        }
    }
}

/// A color in the form a particular driver accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPayload {
    Rgb(Color),
    Hsv(Hsv),
}

/// Convert a color into what the device of the given kind expects.
///
/// Switches have no color channel, so they get `None` and the caller treats
/// the color step as done.
///
/// # Examples
///
/// ```
/// use lights_gateway::{Color, ColorFormat, ColorPayload, DeviceKind, to_device_representation};
///
/// let red = Color::rgb(255, 0, 0);
/// assert_eq!(
///     to_device_representation(&red, DeviceKind::Bulb, ColorFormat::Rgb),
///     Some(ColorPayload::Rgb(red))
/// );
/// assert_eq!(to_device_representation(&red, DeviceKind::Switch, ColorFormat::Rgb), None);
/// ```
pub fn to_device_representation(
    color: &Color,
    kind: DeviceKind,
    format: ColorFormat,
) -> Option<ColorPayload> {
    if !kind.capabilities().color {
        return None;
    }
    Some(match format {
        ColorFormat::Rgb => ColorPayload::Rgb(*color),
        ColorFormat::Hsv => ColorPayload::Hsv(Hsv::from(color)),
    })
}

/// An authenticated session to a single device.
///
/// Drivers report an expired session as [`Error::SessionExpired`] so that
/// callers can reconnect and try again.
#[async_trait]
pub trait Device: Send + Sync + fmt::Debug {
    async fn turn_on(&self) -> Result<()>;

    async fn turn_off(&self) -> Result<()>;

    async fn set_brightness(&self, brightness: Brightness) -> Result<()>;

    async fn set_color(&self, color: &ColorPayload) -> Result<()>;

    async fn get_state(&self) -> Result<DeviceState>;
}

/// Opens authenticated sessions to devices.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn Device>>;
}

/// A live device together with the endpoint it was opened against.
#[derive(Debug)]
pub struct DeviceHandle {
    endpoint: DeviceEndpoint,
    device: Box<dyn Device>,
}

impl DeviceHandle {
    pub fn new(endpoint: DeviceEndpoint, device: Box<dyn Device>) -> Self {
        DeviceHandle { endpoint, device }
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    pub fn kind(&self) -> DeviceKind {
        self.endpoint.kind
    }

    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }
}
