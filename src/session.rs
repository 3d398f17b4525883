//! Session expiry handling.
//!
//! An operation is attempted once against the current handle. If the device
//! reports that the session expired, a new session is opened, published to
//! the [`Registry`], and the same operation is attempted exactly once more.
//! Any other failure, or a failure of the second attempt, is final.

use std::future::Future;
use std::sync::Arc;

use log::{info, warn};

use crate::device::{Connector, Credentials, DeviceHandle};
use crate::errors::Error;
use crate::registry::Registry;

type Result<T> = std::result::Result<T, Error>;

/// Runs device operations with a single reconnect-and-retry on session expiry.
#[derive(Clone)]
pub struct SessionManager {
    registry: Arc<Registry>,
    connector: Arc<dyn Connector>,
    credentials: Credentials,
}

impl SessionManager {
    pub fn new(
        registry: Arc<Registry>,
        connector: Arc<dyn Connector>,
        credentials: Credentials,
    ) -> Self {
        SessionManager {
            registry,
            connector,
            credentials,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run `attempt` against `handle`, reconnecting once if the session expired.
    ///
    /// `attempt` must perform the whole logical operation: on retry it is
    /// called again from the start with the new handle.
    pub async fn execute<T, F, Fut>(
        &self,
        name: &str,
        handle: Arc<DeviceHandle>,
        attempt: F,
    ) -> Result<T>
    where
        F: Fn(Arc<DeviceHandle>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match attempt(Arc::clone(&handle)).await {
            Err(e) if e.is_session_expired() => {
                warn!("Session for {name} expired ({e}), reconnecting");
                let fresh = self.reconnect(name, &handle).await?;
                attempt(fresh).await
            }
            outcome => outcome,
        }
    }

    /// Open a new session for `name` and publish it to the registry.
    ///
    /// On failure the device is marked absent.
    pub async fn reconnect(&self, name: &str, stale: &DeviceHandle) -> Result<Arc<DeviceHandle>> {
        let endpoint = stale.endpoint();
        match self.connector.connect(endpoint, &self.credentials).await {
            Ok(device) => {
                let fresh = Arc::new(DeviceHandle::new(endpoint.clone(), device));
                self.registry.replace(name, Arc::clone(&fresh));
                info!("Reconnected to {name} at {}", endpoint.address);
                Ok(fresh)
            }
            Err(e) => {
                warn!("Reconnect to {name} at {} failed: {e}", endpoint.address);
                self.registry.mark_absent(name);
                Err(Error::unreachable(name, format!("reconnect failed: {e}")))
            }
        }
    }
}
