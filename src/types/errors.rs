use std::fmt;

use super::group::GroupId;
use super::tab::TabId;

// === HostError ===

/// Errors raised by the host bridge transport.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host reported that the referenced tab or group does not exist.
    NotFound(String),
    /// The host does not implement the requested method.
    Unsupported(String),
    /// The host accepted the request but failed to carry it out.
    Failed(String),
    /// No response arrived within the request timeout.
    Timeout(String),
    /// The connection to the host is closed.
    Disconnected,
    /// A message could not be encoded or decoded.
    Protocol(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::NotFound(msg) => write!(f, "Host object not found: {}", msg),
            HostError::Unsupported(method) => write!(f, "Host method unsupported: {}", method),
            HostError::Failed(msg) => write!(f, "Host request failed: {}", msg),
            HostError::Timeout(method) => write!(f, "Host request timed out: {}", method),
            HostError::Disconnected => write!(f, "Host connection closed"),
            HostError::Protocol(msg) => write!(f, "Host protocol error: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

// === BackendError ===

/// Errors related to backend adapter operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Tab with the given ID no longer exists.
    TabNotFound(TabId),
    /// Group with the given ID no longer exists.
    GroupNotFound(GroupId),
    /// The external tab host is not reachable.
    Unavailable(String),
    /// Listing tabs or groups failed.
    FetchFailure(String),
    /// A mutation was rejected by the host.
    Host(String),
}

impl BackendError {
    /// True for the races where the referenced object vanished before the call.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::TabNotFound(_) | BackendError::GroupNotFound(_))
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            BackendError::GroupNotFound(id) => write!(f, "Tab group not found: {}", id),
            BackendError::Unavailable(msg) => write!(f, "Tab host unavailable: {}", msg),
            BackendError::FetchFailure(msg) => write!(f, "Failed to fetch tabs: {}", msg),
            BackendError::Host(msg) => write!(f, "Tab host error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

// === SidebarError ===

/// Errors surfaced by the sidebar engine to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarError {
    /// Reconciliation could not fetch state; the previous snapshot is kept.
    FetchFailure(String),
    /// A mutation failed for a reason other than a stale id.
    Backend(BackendError),
}

impl fmt::Display for SidebarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SidebarError::FetchFailure(msg) => {
                write!(f, "Refresh failed, keeping last snapshot: {}", msg)
            }
            SidebarError::Backend(e) => write!(f, "Sidebar operation failed: {}", e),
        }
    }
}

impl std::error::Error for SidebarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SidebarError::Backend(e) => Some(e),
            SidebarError::FetchFailure(_) => None,
        }
    }
}

impl From<BackendError> for SidebarError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::FetchFailure(msg) => SidebarError::FetchFailure(msg),
            other => SidebarError::Backend(other),
        }
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
