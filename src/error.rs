use std::io;
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Failures of the scan stream. These are reported once and never retried here.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan failed with platform error code {code}")]
    Transient { code: i32 },

    #[error("Error scanning for devices (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,

    #[error("Adapters stopped delivering scan events")]
    EventsEnded,

    #[error("Scan was interrupted: {reason}")]
    Interrupted { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SightingError {
    #[error("Sighting has an empty address")]
    MalformedSighting,
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("Device {address} is not known to any adapter")]
    UnknownDevice { address: String },

    #[error("Device operation took too long")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (scan): {source}")]
    ScanError { #[from] source: ScanError },

    #[error("Failed to start application (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("Failed to write to the terminal: {source}")]
    IOError { #[from] source: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected() {
        let err = ConfigError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.is_file_not_found_error());

        let err = ConfigError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(!err.is_file_not_found_error());
        assert!(!ConfigError::NoConfigPath.is_file_not_found_error());
    }

    #[test]
    fn transient_error_keeps_the_platform_code() {
        let err = ScanError::Transient { code: 2 };
        assert_eq!(err.to_string(), "Scan failed with platform error code 2");
    }
}
