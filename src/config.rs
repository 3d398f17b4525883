//! Gateway settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `GATEWAY_*` environment variables. `PORT` is honoured as well.
//!
//! ```toml
//! username = "me@example.com"
//! device_timeout_secs = 10
//!
//! [[devices]]
//! name = "kitchen_light"
//! address = "192.168.68.60"
//!
//! [[devices]]
//! name = "living_room_plug"
//! address = "192.168.68.64"
//! kind = "switch"
//! ```

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::device::{Credentials, DeviceEndpoint, DeviceName};
use crate::errors::Error;
use crate::light;
use crate::types::{ColorFormat, DeviceKind};

type Result<T> = std::result::Result<T, Error>;

/// One configured device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: DeviceName,
    pub address: IpAddr,
    #[serde(default = "default_device_port")]
    pub port: u16,
    /// Inferred from the name when omitted.
    pub kind: Option<DeviceKind>,
    #[serde(default)]
    pub color_format: ColorFormat,
}

impl DeviceConfig {
    pub fn endpoint(&self) -> DeviceEndpoint {
        let kind = self.kind.unwrap_or_else(|| DeviceKind::infer(&self.name));
        DeviceEndpoint::new(SocketAddr::new(self.address, self.port), kind)
            .with_color_format(self.color_format)
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Time budget for one device's part in a request.
    #[serde(default = "default_device_timeout")]
    pub device_timeout_secs: u64,

    /// Time budget for connecting to one device at startup.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub username: String,

    /// Never serialized back out.
    #[serde(default = "default_password", skip_serializing)]
    pub password: SecretString,

    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind: default_bind(),
            port: default_port(),
            device_timeout_secs: default_device_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            username: String::new(),
            password: default_password(),
            devices: Vec::new(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_password() -> SecretString {
    SecretString::from(String::new())
}
fn default_port() -> u16 {
    8080
}
fn default_device_port() -> u16 {
    light::PORT
}
fn default_device_timeout() -> u64 {
    10
}
fn default_connect_timeout() -> u64 {
    5
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment
            .merge(Env::raw().only(&["PORT"]))
            .merge(Env::prefixed("GATEWAY_").ignore(&["CONFIG"]));

        Self::from_figment(&figment)
    }

    /// Extract and validate settings from an already-built figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(Error::Config("device name must not be empty".into()));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(Error::Config(format!(
                    "device {} is configured more than once",
                    device.name
                )));
            }
        }
        if self.device_timeout_secs == 0 {
            return Err(Error::Config("device_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, self.password.expose_secret())
    }

    /// Device names and endpoints in configuration order.
    pub fn endpoints(&self) -> Vec<(DeviceName, DeviceEndpoint)> {
        self.devices
            .iter()
            .map(|device| (device.name.clone(), device.endpoint()))
            .collect()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
