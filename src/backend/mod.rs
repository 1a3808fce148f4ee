//! Backend Adapter.
//!
//! One capability contract, two variants: `LiveBackend` proxies every call
//! to the external tab host, `SimulatedBackend` owns an in-process store.
//! The variant is chosen once at startup and wrapped in [`Backend`].

pub mod demo;
pub mod live;
pub mod simulated;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::types::errors::BackendError;
use crate::types::group::{Group, GroupId};
use crate::types::recent::ClosedTab;
use crate::types::tab::{Tab, TabId};

pub use live::LiveBackend;
pub use simulated::SimulatedBackend;

/// Trait defining the tab backend interface.
///
/// Mutations fail with `TabNotFound`/`GroupNotFound` when the referenced id
/// vanished before the call, and return once the change is durable.
#[async_trait]
pub trait TabBackend: Send + Sync {
    /// Tabs of the current window, pinned partition first, each in index order.
    async fn list_tabs(&self) -> Result<Vec<Tab>, BackendError>;
    async fn list_groups(&self) -> Result<BTreeMap<GroupId, Group>, BackendError>;
    async fn activate(&self, tab_id: TabId) -> Result<(), BackendError>;
    async fn close(&self, tab_id: TabId) -> Result<(), BackendError>;
    async fn create(&self, url: Option<&str>) -> Result<TabId, BackendError>;
    /// Moves a tab to `target` within its own partition.
    async fn move_tab(&self, tab_id: TabId, target: usize) -> Result<(), BackendError>;
    async fn toggle_pin(&self, tab: &Tab) -> Result<(), BackendError>;
    async fn toggle_mute(&self, tab: &Tab) -> Result<(), BackendError>;
    async fn set_group_collapsed(&self, group_id: GroupId, collapsed: bool)
        -> Result<(), BackendError>;
    /// Most recent first, bounded length.
    async fn recently_closed(&self) -> Result<Vec<ClosedTab>, BackendError>;
}

/// The backend selected at startup.
pub enum Backend {
    Live(LiveBackend),
    Simulated(SimulatedBackend),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Live(_) => "live",
            Backend::Simulated(_) => "simulated",
        }
    }

    fn inner(&self) -> &dyn TabBackend {
        match self {
            Backend::Live(b) => b,
            Backend::Simulated(b) => b,
        }
    }
}

#[async_trait]
impl TabBackend for Backend {
    async fn list_tabs(&self) -> Result<Vec<Tab>, BackendError> {
        self.inner().list_tabs().await
    }

    async fn list_groups(&self) -> Result<BTreeMap<GroupId, Group>, BackendError> {
        self.inner().list_groups().await
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), BackendError> {
        self.inner().activate(tab_id).await
    }

    async fn close(&self, tab_id: TabId) -> Result<(), BackendError> {
        self.inner().close(tab_id).await
    }

    async fn create(&self, url: Option<&str>) -> Result<TabId, BackendError> {
        self.inner().create(url).await
    }

    async fn move_tab(&self, tab_id: TabId, target: usize) -> Result<(), BackendError> {
        self.inner().move_tab(tab_id, target).await
    }

    async fn toggle_pin(&self, tab: &Tab) -> Result<(), BackendError> {
        self.inner().toggle_pin(tab).await
    }

    async fn toggle_mute(&self, tab: &Tab) -> Result<(), BackendError> {
        self.inner().toggle_mute(tab).await
    }

    async fn set_group_collapsed(
        &self,
        group_id: GroupId,
        collapsed: bool,
    ) -> Result<(), BackendError> {
        self.inner().set_group_collapsed(group_id, collapsed).await
    }

    async fn recently_closed(&self) -> Result<Vec<ClosedTab>, BackendError> {
        self.inner().recently_closed().await
    }
}
