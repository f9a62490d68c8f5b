use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use indexmap::IndexMap;

use crate::device::filter::Query;
use crate::device::types::Device;

struct RegistryInner {
    // insertion ordered; an existing key keeps its position on update
    devices: IndexMap<String, Device>,
    query: String,
}

/// The set of observed devices and the query that is currently in effect.
///
/// Clones share the same state. Every operation takes the one lock that guards the devices, their
/// order and the query, so readers never see a half applied update.
#[derive(Clone)]
pub struct DeviceRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let inner = RegistryInner {
            devices: IndexMap::new(),
            query: String::new(),
        };
        DeviceRegistry { inner: Arc::new(Mutex::new(inner)) }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // No operation can leave the state half updated, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a device on first sighting, otherwise only refresh its signal strength.
    pub fn observe(&self, address: &str, display_name: Option<&str>, signal_strength: i16) {
        let mut inner = self.lock();

        match inner.devices.get_mut(address) {
            Some(device) => {
                device.signal_strength = signal_strength;
            },
            None => {
                let device = Device {
                    address: address.to_string(),
                    display_name: display_name.map(String::from),
                    signal_strength,
                    connected: false,
                };
                inner.devices.insert(address.to_string(), device);
            },
        }
    }

    /// Returns `false` if the address was never observed, in which case nothing changes.
    pub fn set_connection_state(&self, address: &str, connected: bool) -> bool {
        let mut inner = self.lock();

        match inner.devices.get_mut(address) {
            Some(device) => {
                device.connected = connected;
                true
            },
            None => false,
        }
    }

    /// Remember `query` as the current query and return the matching devices in insertion order.
    pub fn search(&self, query: &str) -> Vec<Device> {
        let mut inner = self.lock();
        inner.query = query.to_string();
        Self::filtered(&inner)
    }

    /// Same as `search` with the remembered query.
    pub fn current_view(&self) -> Vec<Device> {
        let inner = self.lock();
        Self::filtered(&inner)
    }

    pub fn current_query(&self) -> String {
        self.lock().query.clone()
    }

    pub fn get(&self, address: &str) -> Option<Device> {
        self.lock().devices.get(address).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().devices.is_empty()
    }

    /// Forget every device. The current query stays in effect.
    pub fn clear(&self) {
        self.lock().devices.clear();
    }

    fn filtered(inner: &RegistryInner) -> Vec<Device> {
        let query = Query::new(&inner.query);

        inner.devices
            .values()
            .filter(|device| query.matches(device))
            .cloned()
            .collect()
    }
}
