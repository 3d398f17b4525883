//! # lights_gateway
//!
//! An HTTP gateway that controls a named set of smart lights and plugs at
//! once.
//!
//! One request fans out to every selected device concurrently. Each device
//! gets its own outcome, so a device that is offline, slow or broken never
//! spoils the result for the others. When a device reports that its
//! session expired, the gateway logs in again and retries the operation
//! exactly once.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lights_gateway::{
//!     ControlRequest, LanConnector, Orchestrator, PowerAction, Registry, SessionManager, Settings,
//! };
//!
//! async fn toggle_everything() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(Some("gateway.toml".as_ref()))?;
//!     let connector = Arc::new(LanConnector);
//!     let credentials = settings.credentials();
//!
//!     let registry = Registry::connect_all(
//!         settings.endpoints(),
//!         connector.as_ref(),
//!         &credentials,
//!         settings.connect_timeout(),
//!     )
//!     .await;
//!
//!     let sessions = SessionManager::new(Arc::new(registry), connector, credentials);
//!     let orchestrator = Orchestrator::new(sessions, settings.device_timeout());
//!
//!     let outcomes = orchestrator
//!         .dispatch(ControlRequest::set_state(PowerAction::Toggle, None))
//!         .await;
//!     for (name, outcome) in &outcomes {
//!         println!("{name}: {outcome:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Components
//!
//! - [`Registry`]: one slot per configured device, holding a live
//!   [`DeviceHandle`] or nothing
//! - [`SessionManager`]: reconnect-and-retry-once on session expiry
//! - [`Orchestrator`]: concurrent dispatch with per-device timeouts
//! - [`Color`], [`Hsv`], [`ColorInput`]: color parsing and conversion
//! - [`Device`] / [`Connector`]: the driver seam, implemented for the LAN
//!   protocol by [`Light`] / [`LanConnector`]
//! - [`api::router`]: the HTTP surface

pub mod api;
mod config;
mod device;
mod errors;
mod light;
mod orchestrator;
mod registry;
mod response;
mod session;
mod status;
mod types;

// Re-export public API
pub use config::{DeviceConfig, Settings};
pub use device::{
    ColorPayload, Connector, Credentials, Device, DeviceEndpoint, DeviceHandle, DeviceName,
    to_device_representation,
};
pub use errors::{Error, ErrorKind};
pub use light::{LanConnector, Light, PORT as LAN_PORT, SESSION_EXPIRED_CODE};
pub use orchestrator::{ControlRequest, Operation, Orchestrator, Properties};
pub use registry::Registry;
pub use response::{ControlOutcome, Failure, OutcomeValue, Outcomes};
pub use session::SessionManager;
pub use status::DeviceState;
pub use types::{
    Brightness, Capabilities, Color, ColorFormat, ColorInput, DeviceKind, Hsv, PowerAction,
};
