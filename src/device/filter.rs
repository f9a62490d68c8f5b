use crate::device::types::Device;

/// A lowercased search needle.
///
/// `str::to_lowercase` applies the Unicode default case mapping, so the result does not depend on
/// the locale of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    needle: String,
}

impl Query {
    pub fn new(query: &str) -> Self {
        Query { needle: query.to_lowercase() }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// A device matches when its name or its address contains the needle. Unnamed devices are
    /// matched on the address only.
    pub fn matches(&self, device: &Device) -> bool {
        if self.is_empty() {
            return true;
        }

        let name_matches = device.display_name
            .as_ref()
            .map(|name| name.to_lowercase().contains(&self.needle))
            .unwrap_or(false);

        name_matches || device.address.to_lowercase().contains(&self.needle)
    }
}
