use serde::{Deserialize, Serialize};

/// Top-level sidebar settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SidebarSettings {
    pub notifications: NotificationSettings,
    pub backend: BackendSettings,
    pub history: HistorySettings,
}

/// Change notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationSettings {
    /// Quiet period after the last change event before subscribers run.
    pub debounce_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

/// Which backend variant to run against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Use the host when it answers, otherwise the simulated store.
    #[default]
    Auto,
    Live,
    Simulated,
}

/// Tab host connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    pub mode: BackendMode,
    /// `host:port` of the host bridge.
    pub host_addr: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            mode: BackendMode::Auto,
            host_addr: None,
            request_timeout_ms: 2000,
        }
    }
}

/// Recently-closed list settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistorySettings {
    pub recently_closed_limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            recently_closed_limit: 10,
        }
    }
}
