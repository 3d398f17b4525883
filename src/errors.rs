use std::string::FromUtf8Error;
use std::time::Duration;

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Coarse classification of an [`Error`], as reported in per-device outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed color or brightness input; rejected before dispatch.
    InvalidFormat,
    /// The device name is not part of the configuration.
    NotFound,
    /// The device has no live session.
    Unreachable,
    /// The device's authenticated session lapsed.
    SessionExpired,
    /// The device (or the transport to it) reported a fault.
    DeviceError,
    /// The per-device operation exceeded its time budget.
    Timeout,
}

/// All error types that can occur while controlling devices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Color or brightness input could not be parsed.
    #[error("{0}")]
    InvalidFormat(String),

    /// No device with this name is configured.
    #[error("device {0} not found")]
    NotFound(String),

    /// The device could not be connected to.
    #[error("device {name} is unreachable: {reason}")]
    Unreachable { name: String, reason: String },

    /// The device rejected the session token.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// The device replied with an error code.
    #[error("device error {code}: {message}")]
    Device { code: i64, message: String },

    /// The operation did not finish in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A network socket operation failed while communicating with a device.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The UDP response from a device contained invalid UTF-8.
    #[error("utf8 decoding error: {0:?}")]
    Utf8Decode(FromUtf8Error),

    /// The reply was well-formed JSON but not what the protocol expects.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The settings could not be loaded or are inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A per-device task panicked or was cancelled.
    #[error("device task failed: {0}")]
    Task(String),
}

impl Error {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Unreachable { .. } => ErrorKind::Unreachable,
            Error::SessionExpired(_) => ErrorKind::SessionExpired,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Device { .. }
            | Error::JsonDump(_)
            | Error::JsonLoad(_)
            | Error::Socket { .. }
            | Error::Utf8Decode(_)
            | Error::UnexpectedReply(_)
            | Error::Config(_)
            | Error::Task(_) => ErrorKind::DeviceError,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind() == ErrorKind::SessionExpired
    }

    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new unreachable error
    pub fn unreachable(name: &str, reason: impl ToString) -> Self {
        Error::Unreachable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new device error
    pub fn device(code: i64, message: &str) -> Self {
        Error::Device {
            code,
            message: message.to_string(),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
