use std::env::current_exe;
use std::path::{Path, PathBuf};
use std::str;
use directories_next::ProjectDirs;
use log::{info, warn};
use tokio::fs;

use crate::config::types::Config;
use crate::error::ConfigError;

// creates a path to <exe>.json in the same directory as the executable
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(mut path) => {
            if !path.set_extension("json") {
                warn!("current exe has no filename: {}", path.to_string_lossy());
                return None
            }

            Some(path)
        },
        Err(err) => {
            warn!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// creates a path to ble-device-list.json in an os dependent standard directory, such as
// ~/.config on linux.
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ble-device-list").map(|dirs| {
        dirs.config_dir().join("ble-device-list.json")
    })
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        if path.is_file() {
            return Ok(path);
        }
    }

    match get_local_config_path() {
        None => Err(ConfigError::NoConfigPath),
        Some(path) => Ok(path),
    }
}

#[derive(Debug, Clone)]
pub struct ConfigIO {
    path: PathBuf,
}

impl ConfigIO {
    /// Use `path` if given, otherwise the portable or the per-user config file.
    pub fn new(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(v) => v,
            None => get_config_path()?,
        };

        info!("Using config file {}", path.to_string_lossy());
        Ok(ConfigIO { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Config, ConfigError> {
        let content = fs::read(&self.path).await?;

        if content.is_empty() {
            return Ok(Config::default());
        }

        let content = str::from_utf8(&content)?;
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Like `read`, but a missing file means the defaults.
    pub async fn read_or_default(&self) -> Result<Config, ConfigError> {
        match self.read().await {
            Ok(config) => Ok(config),
            Err(err) if err.is_file_not_found_error() => {
                info!("Config file not found, using defaults");
                Ok(Config::default())
            },
            Err(err) => Err(err),
        }
    }

    pub async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(directory) = self.path.parent() {
            fs::create_dir_all(directory).await?;
        }

        info!("Saving config");
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::process;
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ble-device-list-test-{}", process::id()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_reads_as_defaults() {
        let config_io = ConfigIO::new(Some(scratch_path("missing.json"))).unwrap();

        let err = config_io.read().await.unwrap_err();
        assert!(err.is_file_not_found_error());
        assert_eq!(config_io.read_or_default().await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn saved_config_reads_back() {
        let path = scratch_path("saved.json");
        let config_io = ConfigIO::new(Some(path.clone())).unwrap();
        let config = Config { include_unnamed_devices: false, ..Config::default() };

        config_io.save(&config).await.unwrap();
        assert_eq!(config_io.read().await.unwrap(), config);

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn empty_file_reads_as_defaults() {
        let path = scratch_path("empty.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();

        let config_io = ConfigIO::new(Some(path.clone())).unwrap();
        assert_eq!(config_io.read().await.unwrap(), Config::default());

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let path = scratch_path("invalid.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let config_io = ConfigIO::new(Some(path.clone())).unwrap();
        assert!(matches!(config_io.read_or_default().await, Err(ConfigError::JsonError { .. })));

        std::fs::remove_file(path).unwrap();
    }
}
