//! Settings provider port

use crate::config::RawConfig;

/// Source of the raw admin settings map.
///
/// The forwarder reads settings exactly once per initialization attempt;
/// providers may serve from memory, a file or the host's settings store.
pub trait SettingsProvider: Send + Sync {
    fn raw_config(&self) -> RawConfig;
}

/// In-memory provider serving a fixed map. Used by tests and by callers
/// that already hold the settings.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    raw: RawConfig,
}

impl StaticSettings {
    pub fn new(raw: RawConfig) -> Self {
        StaticSettings { raw }
    }
}

impl SettingsProvider for StaticSettings {
    fn raw_config(&self) -> RawConfig {
        self.raw.clone()
    }
}
