use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::constants::SCAN_EVENT_CHANNEL_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Register sightings that carry no advertised name; they are listed by address.
    pub include_unnamed_devices: bool,
    /// Only report peripherals advertising one of these services. Empty means everything.
    pub service_filter: Vec<Uuid>,
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            include_unnamed_devices: true,
            service_filter: vec![],
            event_channel_capacity: SCAN_EVENT_CHANNEL_SIZE,
        }
    }
}
