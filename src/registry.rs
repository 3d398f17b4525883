//! Device registry: one slot per configured device name.
//!
//! The set of names is fixed when the registry is built. Each slot holds
//! either a live [`DeviceHandle`] or nothing; slots are swapped atomically,
//! so readers always see a whole handle (possibly a stale one) and never
//! block on writers.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use futures::future::join_all;
use indexmap::IndexMap;
use log::{error, info};

use crate::device::{Connector, Credentials, DeviceEndpoint, DeviceHandle, DeviceName};
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
struct Slot {
    endpoint: DeviceEndpoint,
    handle: ArcSwapOption<DeviceHandle>,
}

/// Maps every configured device name to its live handle, if any.
#[derive(Debug, Default)]
pub struct Registry {
    slots: IndexMap<DeviceName, Slot>,
}

impl Registry {
    /// Create a registry where every device starts out absent.
    ///
    /// Later duplicates of a name are ignored.
    pub fn new(endpoints: impl IntoIterator<Item = (DeviceName, DeviceEndpoint)>) -> Self {
        let mut slots = IndexMap::new();
        for (name, endpoint) in endpoints {
            slots.entry(name).or_insert(Slot {
                endpoint,
                handle: ArcSwapOption::empty(),
            });
        }
        Registry { slots }
    }

    /// Create a registry and connect to every device concurrently.
    ///
    /// Devices that fail to connect within `timeout` stay absent.
    pub async fn connect_all(
        endpoints: impl IntoIterator<Item = (DeviceName, DeviceEndpoint)>,
        connector: &dyn Connector,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Self {
        let registry = Self::new(endpoints);

        let attempts = registry.slots.iter().map(move |(name, slot)| async move {
            let endpoint = &slot.endpoint;
            match tokio::time::timeout(timeout, connector.connect(endpoint, credentials)).await {
                Ok(Ok(device)) => {
                    info!("Connected to {name} at {} successfully.", endpoint.address);
                    slot.handle
                        .store(Some(Arc::new(DeviceHandle::new(endpoint.clone(), device))));
                }
                Ok(Err(e)) => {
                    error!("Failed to connect to {name} at {}: {e}", endpoint.address);
                }
                Err(_) => {
                    error!(
                        "Failed to connect to {name} at {}: timed out after {timeout:?}",
                        endpoint.address
                    );
                }
            }
        });
        join_all(attempts).await;

        registry
    }

    /// Look up the live handle for `name`.
    ///
    /// Fails with [`Error::NotFound`] for unknown names and
    /// [`Error::Unreachable`] for devices without a live session.
    pub fn resolve(&self, name: &str) -> Result<Arc<DeviceHandle>> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        slot.handle
            .load_full()
            .ok_or_else(|| Error::unreachable(name, "no live session"))
    }

    /// Install a freshly connected handle for `name`.
    ///
    /// Returns `false` if the name is not configured.
    pub fn replace(&self, name: &str, handle: Arc<DeviceHandle>) -> bool {
        match self.slots.get(name) {
            Some(slot) => {
                slot.handle.store(Some(handle));
                true
            }
            None => false,
        }
    }

    /// Drop the handle for `name`, leaving the device absent.
    pub fn mark_absent(&self, name: &str) {
        if let Some(slot) = self.slots.get(name) {
            slot.handle.store(None);
        }
    }

    pub fn endpoint(&self, name: &str) -> Option<&DeviceEndpoint> {
        self.slots.get(name).map(|slot| &slot.endpoint)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Configured names in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &DeviceName> {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of devices that currently have a live handle.
    pub fn connected(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.handle.load().is_some())
            .count()
    }
}
