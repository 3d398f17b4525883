//! Concurrent fan-out of one control request to many devices.
//!
//! Each targeted device runs as its own task, through the
//! [`SessionManager`], under its own timeout. A device that fails, times
//! out, or panics only affects its own entry in the returned [`Outcomes`];
//! the request always waits for every device to finish.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::device::{DeviceHandle, DeviceName, to_device_representation};
use crate::errors::Error;
use crate::registry::Registry;
use crate::response::{ControlOutcome, OutcomeValue, Outcomes};
use crate::session::SessionManager;
use crate::types::{Brightness, Color, ColorInput, PowerAction};

type Result<T> = std::result::Result<T, Error>;

/// Property changes to apply to each device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    pub brightness: Option<Brightness>,
    pub color: Option<Color>,
}

impl Properties {
    /// Validate raw user input.
    ///
    /// # Examples
    ///
    /// ```
    /// use lights_gateway::{ColorInput, Properties};
    ///
    /// let props = Properties::parse(Some(50), Some(&ColorInput::Hex("#FF0000".into()))).unwrap();
    /// assert_eq!(props.brightness.unwrap().value(), 50);
    ///
    /// assert!(Properties::parse(None, Some(&ColorInput::Hex("red".into()))).is_err());
    /// assert!(Properties::parse(Some(150), None).is_err());
    /// ```
    pub fn parse(brightness: Option<i64>, color: Option<&ColorInput>) -> Result<Self> {
        Ok(Properties {
            brightness: brightness.map(Brightness::parse).transpose()?,
            color: color.map(ColorInput::resolve).transpose()?,
        })
    }

    /// Apply the changes in order: power on, brightness, color.
    ///
    /// Steps already applied are not undone if a later one fails.
    async fn apply(&self, handle: &DeviceHandle) -> Result<()> {
        let device = handle.device();
        let kind = handle.kind();
        let capabilities = kind.capabilities();

        if let Some(brightness) = self.brightness {
            if brightness.is_lit() {
                device.turn_on().await?;
            }
            if capabilities.brightness {
                device.set_brightness(brightness).await?;
            } else if !brightness.is_lit() {
                device.turn_off().await?;
            }
        }

        if let Some(color) = &self.color {
            let payload =
                to_device_representation(color, kind, handle.endpoint().color_format);
            if let Some(payload) = payload {
                device.set_color(&payload).await?;
            }
        }

        Ok(())
    }
}

/// What to do to each targeted device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SetState(PowerAction),
    SetProperties(Properties),
    QueryInfo,
}

/// An operation and the devices it targets.
///
/// `targets == None` means every configured device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub operation: Operation,
    pub targets: Option<Vec<DeviceName>>,
}

impl ControlRequest {
    pub fn set_state(action: PowerAction, targets: Option<Vec<DeviceName>>) -> Self {
        ControlRequest {
            operation: Operation::SetState(action),
            targets,
        }
    }

    /// Build a property-set request, rejecting malformed input up front.
    pub fn set_properties(
        brightness: Option<i64>,
        color: Option<&ColorInput>,
        targets: Option<Vec<DeviceName>>,
    ) -> Result<Self> {
        Ok(ControlRequest {
            operation: Operation::SetProperties(Properties::parse(brightness, color)?),
            targets,
        })
    }

    pub fn query_info(targets: Option<Vec<DeviceName>>) -> Self {
        ControlRequest {
            operation: Operation::QueryInfo,
            targets,
        }
    }
}

enum Unit {
    Done(ControlOutcome),
    Running(JoinHandle<ControlOutcome>),
}

/// Dispatches control requests across the registry.
#[derive(Clone)]
pub struct Orchestrator {
    sessions: SessionManager,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(sessions: SessionManager, timeout: Duration) -> Self {
        Orchestrator { sessions, timeout }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.sessions.registry()
    }

    /// Run `request` against every target and collect one outcome per target.
    ///
    /// Unknown names yield `NotFound` and devices without a live session
    /// yield `Unreachable`; neither is dispatched. Duplicate names are
    /// dispatched once.
    pub async fn dispatch(&self, request: ControlRequest) -> Outcomes {
        let ControlRequest { operation, targets } = request;
        let targets =
            targets.unwrap_or_else(|| self.registry().names().cloned().collect::<Vec<_>>());
        let operation = Arc::new(operation);

        debug!("Dispatching {operation:?} to {} device(s)", targets.len());

        let mut units: IndexMap<DeviceName, Unit> = IndexMap::with_capacity(targets.len());
        for name in targets {
            if units.contains_key(&name) {
                continue;
            }
            let unit = match self.registry().resolve(&name) {
                Ok(handle) => Unit::Running(tokio::spawn(run_unit(
                    self.sessions.clone(),
                    name.clone(),
                    handle,
                    Arc::clone(&operation),
                    self.timeout,
                ))),
                Err(e) => {
                    warn!("Skipping {name}: {e}");
                    Unit::Done(e.into())
                }
            };
            units.insert(name, unit);
        }

        let collected = join_all(units.into_iter().map(|(name, unit)| async move {
            let outcome = match unit {
                Unit::Done(outcome) => outcome,
                Unit::Running(task) => match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Task for {name} did not complete: {e}");
                        Error::Task(e.to_string()).into()
                    }
                },
            };
            (name, outcome)
        }))
        .await;

        collected.into_iter().collect()
    }
}

async fn run_unit(
    sessions: SessionManager,
    name: DeviceName,
    handle: Arc<DeviceHandle>,
    operation: Arc<Operation>,
    timeout: Duration,
) -> ControlOutcome {
    let work = sessions.execute(&name, handle, |handle| apply(handle, &operation));
    let result = tokio::time::timeout(timeout, work)
        .await
        .unwrap_or(Err(Error::Timeout(timeout)));

    if let Err(e) = &result {
        warn!("Operation on {name} failed: {e}");
    }
    result.into()
}

/// One complete attempt of `operation`; retried as a whole on session expiry.
async fn apply(handle: Arc<DeviceHandle>, operation: &Operation) -> Result<OutcomeValue> {
    let device = handle.device();
    match operation {
        Operation::SetState(action) => {
            let on = match action {
                PowerAction::On => true,
                PowerAction::Off => false,
                PowerAction::Toggle => !device.get_state().await?.is_on,
            };
            if on {
                device.turn_on().await?;
            } else {
                device.turn_off().await?;
            }
            Ok(OutcomeValue::Confirmation(
                PowerAction::state_label(on).to_string(),
            ))
        }
        Operation::SetProperties(properties) => {
            properties.apply(&handle).await?;
            Ok(OutcomeValue::Confirmation("properties set".to_string()))
        }
        Operation::QueryInfo => Ok(OutcomeValue::State(device.get_state().await?)),
    }
}
