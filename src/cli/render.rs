use std::fmt::Write;

use crate::device::types::Device;

pub const UNKNOWN_DEVICE_LABEL: &str = "Unknown Device";

pub fn device_label(device: &Device) -> &str {
    device.display_name.as_deref().unwrap_or(UNKNOWN_DEVICE_LABEL)
}

pub fn connection_label(device: &Device) -> &'static str {
    if device.connected { "Connected" } else { "Disconnected" }
}

pub fn render_row(device: &Device) -> String {
    format!(
        "{:<24} {:<17} RSSI: {:>4}  {}",
        device_label(device),
        device.address,
        device.signal_strength,
        connection_label(device),
    )
}

pub fn render_view(query: &str, devices: &[Device]) -> String {
    let mut out = String::new();

    if query.is_empty() {
        let _ = writeln!(out, "-- {} device(s) --", devices.len());
    } else {
        let _ = writeln!(out, "-- {} device(s) matching \"{}\" --", devices.len(), query);
    }

    for device in devices {
        out.push_str(&render_row(device));
        out.push('\n');
    }

    out
}
