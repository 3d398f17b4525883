//! Per-device outcomes of a control request.

use indexmap::IndexMap;
use serde::Serialize;

use crate::device::DeviceName;
use crate::errors::{Error, ErrorKind};
use crate::status::DeviceState;

/// What a successful operation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutcomeValue {
    /// A short confirmation such as `"on"` or `"properties set"`.
    Confirmation(String),
    /// The state read from the device.
    State(DeviceState),
}

/// Why an operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

/// The result of one device's part in a request.
///
/// Serializes to the success value itself, or to `{"error": {kind, message}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlOutcome {
    Success(OutcomeValue),
    Failure { error: Failure },
}

impl ControlOutcome {
    pub fn confirmation(text: &str) -> Self {
        ControlOutcome::Success(OutcomeValue::Confirmation(text.to_string()))
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        ControlOutcome::Failure {
            error: Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ControlOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            ControlOutcome::Success(_) => None,
            ControlOutcome::Failure { error } => Some(error.kind),
        }
    }

    pub fn value(&self) -> Option<&OutcomeValue> {
        match self {
            ControlOutcome::Success(value) => Some(value),
            ControlOutcome::Failure { .. } => None,
        }
    }
}

impl From<Error> for ControlOutcome {
    fn from(err: Error) -> Self {
        ControlOutcome::failure(err.kind(), err.to_string())
    }
}

impl From<std::result::Result<OutcomeValue, Error>> for ControlOutcome {
    fn from(result: std::result::Result<OutcomeValue, Error>) -> Self {
        match result {
            Ok(value) => ControlOutcome::Success(value),
            Err(err) => err.into(),
        }
    }
}

/// Outcomes keyed by device name, in the order the devices were requested.
pub type Outcomes = IndexMap<DeviceName, ControlOutcome>;
