//! File-backed settings provider
//!
//! Reads the raw settings map from a YAML file. A missing or unreadable
//! file yields an empty map, which sanitation treats as "disabled"; the
//! CLI surfaces that instead of failing outright.

use std::path::{Path, PathBuf};

use tracing::warn;

use errbeacon_core::ports::SettingsProvider;
use errbeacon_core::RawConfig;

pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileSettings {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsProvider for FileSettings {
    fn raw_config(&self) -> RawConfig {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "could not read settings file");
                return RawConfig::new();
            }
        };
        match serde_yaml::from_str(&text) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "could not parse settings file");
                RawConfig::new()
            }
        }
    }
}
