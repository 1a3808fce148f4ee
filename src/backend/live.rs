use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::TabBackend;
use crate::host::protocol::{HostGroup, HostTab, WINDOW_ID_CURRENT};
use crate::host::transport::HostTransport;
use crate::reorder;
use crate::types::errors::{BackendError, HostError};
use crate::types::group::{Group, GroupId};
use crate::types::recent::ClosedTab;
use crate::types::tab::{Tab, TabId};

/// Backend that proxies every operation to the external tab host.
///
/// Nothing is cached: each list call is a fresh query. The host numbers tabs
/// in one space with pinned tabs first; this adapter exposes per-partition
/// indices and translates move targets back.
pub struct LiveBackend {
    transport: Arc<dyn HostTransport>,
    recent_limit: usize,
}

impl LiveBackend {
    pub fn new(transport: Arc<dyn HostTransport>, recent_limit: usize) -> Self {
        Self {
            transport,
            recent_limit,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, HostError> {
        let value = self.transport.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| HostError::Protocol(format!("{}: {}", method, e)))
    }

    async fn update_tab(&self, tab_id: TabId, properties: Value) -> Result<(), BackendError> {
        self.transport
            .call("tabs.update", json!({ "tabId": tab_id.0, "updateProperties": properties }))
            .await
            .map(|_| ())
            .map_err(|e| tab_error(tab_id, e))
    }
}

fn tab_error(tab_id: TabId, e: HostError) -> BackendError {
    match e {
        HostError::NotFound(_) => BackendError::TabNotFound(tab_id),
        other => BackendError::Host(other.to_string()),
    }
}

/// Orders host tabs pinned-first and renumbers each partition from zero.
fn partition_tabs(raw: Vec<HostTab>) -> Vec<Tab> {
    let mut tabs: Vec<Tab> = raw.into_iter().filter_map(HostTab::into_tab).collect();
    tabs.sort_by_key(|t| (!t.pinned, t.index));
    let pinned_count = tabs.iter().filter(|t| t.pinned).count();
    let (pinned, unpinned) = tabs.split_at_mut(pinned_count);
    reorder::renumber(pinned);
    reorder::renumber(unpinned);
    tabs
}

#[async_trait]
impl TabBackend for LiveBackend {
    async fn list_tabs(&self) -> Result<Vec<Tab>, BackendError> {
        let raw: Vec<HostTab> = self
            .call("tabs.query", json!({ "currentWindow": true }))
            .await
            .map_err(|e| BackendError::FetchFailure(e.to_string()))?;
        Ok(partition_tabs(raw))
    }

    async fn list_groups(&self) -> Result<BTreeMap<GroupId, Group>, BackendError> {
        let result: Result<Vec<HostGroup>, HostError> = self
            .call("tabGroups.query", json!({ "windowId": WINDOW_ID_CURRENT }))
            .await;
        match result {
            Ok(groups) => Ok(groups
                .into_iter()
                .map(|g| (GroupId(g.id), Group::from(g)))
                .collect()),
            Err(HostError::Unsupported(_)) => {
                log::debug!("host has no tab group support");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(BackendError::FetchFailure(e.to_string())),
        }
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), BackendError> {
        self.update_tab(tab_id, json!({ "active": true })).await
    }

    async fn close(&self, tab_id: TabId) -> Result<(), BackendError> {
        self.transport
            .call("tabs.remove", json!({ "tabId": tab_id.0 }))
            .await
            .map(|_| ())
            .map_err(|e| tab_error(tab_id, e))
    }

    async fn create(&self, url: Option<&str>) -> Result<TabId, BackendError> {
        let params = match url {
            Some(url) => json!({ "url": url }),
            None => json!({}),
        };
        let created: HostTab = self
            .call("tabs.create", params)
            .await
            .map_err(|e| BackendError::Host(e.to_string()))?;
        created
            .id
            .map(TabId)
            .ok_or_else(|| BackendError::Host("created tab has no id".to_string()))
    }

    /// `target` is an index within the tab's partition; unpinned targets are
    /// shifted past the pinned tabs to form the host index.
    async fn move_tab(&self, tab_id: TabId, target: usize) -> Result<(), BackendError> {
        let tabs = self.list_tabs().await?;
        let tab = tabs
            .iter()
            .find(|t| t.id == tab_id)
            .ok_or(BackendError::TabNotFound(tab_id))?;
        let pinned_count = tabs.iter().filter(|t| t.pinned).count();
        let host_index = if tab.pinned {
            reorder::clamp_target(target, pinned_count)
        } else {
            pinned_count + reorder::clamp_target(target, tabs.len() - pinned_count)
        };

        self.transport
            .call("tabs.move", json!({ "tabId": tab_id.0, "index": host_index }))
            .await
            .map(|_| ())
            .map_err(|e| tab_error(tab_id, e))
    }

    async fn toggle_pin(&self, tab: &Tab) -> Result<(), BackendError> {
        self.update_tab(tab.id, json!({ "pinned": !tab.pinned })).await
    }

    async fn toggle_mute(&self, tab: &Tab) -> Result<(), BackendError> {
        self.update_tab(tab.id, json!({ "muted": !tab.muted })).await
    }

    async fn set_group_collapsed(
        &self,
        group_id: GroupId,
        collapsed: bool,
    ) -> Result<(), BackendError> {
        self.transport
            .call(
                "tabGroups.update",
                json!({ "groupId": group_id.0, "updateProperties": { "collapsed": collapsed } }),
            )
            .await
            .map(|_| ())
            .map_err(|e| match e {
                HostError::NotFound(_) => BackendError::GroupNotFound(group_id),
                other => BackendError::Host(other.to_string()),
            })
    }

    async fn recently_closed(&self) -> Result<Vec<ClosedTab>, BackendError> {
        let result: Result<Vec<ClosedTab>, HostError> = self
            .call("sessions.getRecentlyClosed", json!({ "maxResults": self.recent_limit }))
            .await;
        match result {
            Ok(mut entries) => {
                entries.truncate(self.recent_limit);
                Ok(entries)
            }
            Err(HostError::Unsupported(_)) => Ok(Vec::new()),
            Err(e) => Err(BackendError::Host(e.to_string())),
        }
    }
}
