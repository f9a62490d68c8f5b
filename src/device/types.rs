use uuid::Uuid;

/// One entry per distinct hardware address, as handed out by the registry.
///
/// Values of this type are always copies; the registry keeps the authoritative record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub address: String,
    pub display_name: Option<String>,
    pub signal_strength: i16,
    pub connected: bool,
}

/// A single advertisement as delivered by the platform scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub address: String,
    pub display_name: Option<String>,
    pub signal_strength: i16,
}

impl Sighting {
    pub fn new(address: impl Into<String>, display_name: Option<&str>, signal_strength: i16) -> Self {
        Sighting {
            address: address.into(),
            display_name: display_name.map(String::from),
            signal_strength,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Sighting(Sighting),
    Batch(Vec<Sighting>),
    ConnectionStateChange { address: String, connected: bool },
    Failed(i32),
    /// The producer of scan events stopped unexpectedly.
    Interrupted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RegistryChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub uuid: Uuid,
    pub characteristics: Vec<Uuid>,
}
