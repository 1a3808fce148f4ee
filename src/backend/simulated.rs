use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::TabBackend;
use crate::bus::Notifier;
use crate::reorder;
use crate::types::errors::BackendError;
use crate::types::group::{Group, GroupId};
use crate::types::recent::ClosedTab;
use crate::types::tab::{Tab, TabId, TabStatus};

const DEFAULT_URL: &str = "about:blank";
const NEW_TAB_TITLE: &str = "New Tab";

/// Authoritative in-process tab collection.
///
/// Pinned and unpinned tabs live in separate vectors; each vector's position
/// is the tab's `index`.
struct Store {
    pinned: Vec<Tab>,
    unpinned: Vec<Tab>,
    groups: BTreeMap<GroupId, Group>,
    recently_closed: VecDeque<ClosedTab>,
    next_id: i64,
}

impl Store {
    fn new(mut tabs: Vec<Tab>, groups: Vec<Group>) -> Self {
        tabs.sort_by_key(|t| t.index);
        let next_id = tabs.iter().map(|t| t.id.0).max().unwrap_or(0) + 1;
        let (mut pinned, mut unpinned): (Vec<Tab>, Vec<Tab>) =
            tabs.into_iter().partition(|t| t.pinned);
        reorder::renumber(&mut pinned);
        reorder::renumber(&mut unpinned);

        Self {
            pinned,
            unpinned,
            groups: groups.into_iter().map(|g| (g.id, g)).collect(),
            recently_closed: VecDeque::new(),
            next_id,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.pinned.iter().chain(self.unpinned.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tab> {
        self.pinned.iter_mut().chain(self.unpinned.iter_mut())
    }

    /// Returns (pinned partition?, position) of a tab.
    fn locate(&self, tab_id: TabId) -> Option<(bool, usize)> {
        if let Some(pos) = self.pinned.iter().position(|t| t.id == tab_id) {
            return Some((true, pos));
        }
        self.unpinned
            .iter()
            .position(|t| t.id == tab_id)
            .map(|pos| (false, pos))
    }

    fn partition_mut(&mut self, pinned: bool) -> &mut Vec<Tab> {
        if pinned {
            &mut self.pinned
        } else {
            &mut self.unpinned
        }
    }

    fn tab_mut(&mut self, tab_id: TabId) -> Result<&mut Tab, BackendError> {
        self.iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or(BackendError::TabNotFound(tab_id))
    }

    fn set_active(&mut self, tab_id: Option<TabId>) {
        for tab in self.iter_mut() {
            tab.active = Some(tab.id) == tab_id;
        }
    }
}

/// In-process backend used when no tab host is reachable.
///
/// Every mutation runs to completion under the store lock and then signals
/// the change bus.
pub struct SimulatedBackend {
    store: Mutex<Store>,
    notifier: Notifier,
    recent_limit: usize,
}

impl SimulatedBackend {
    pub fn new(tabs: Vec<Tab>, groups: Vec<Group>, notifier: Notifier) -> Self {
        Self {
            store: Mutex::new(Store::new(tabs, groups)),
            notifier,
            recent_limit: 10,
        }
    }

    /// Seeds the recently-closed list, most recent first.
    pub fn with_recently_closed(self, entries: Vec<ClosedTab>) -> Self {
        {
            let mut store = self.lock();
            store.recently_closed = entries.into_iter().collect();
            store.recently_closed.truncate(self.recent_limit);
        }
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self.lock().recently_closed.truncate(limit);
        self
    }

    pub fn tab_count(&self) -> usize {
        let store = self.lock();
        store.pinned.len() + store.unpinned.len()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn changed(&self, op: &str) {
        log::debug!("simulated backend: {}", op);
        self.notifier.notify();
    }
}

#[async_trait]
impl TabBackend for SimulatedBackend {
    async fn list_tabs(&self) -> Result<Vec<Tab>, BackendError> {
        Ok(self.lock().iter().cloned().collect())
    }

    async fn list_groups(&self) -> Result<BTreeMap<GroupId, Group>, BackendError> {
        Ok(self.lock().groups.clone())
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), BackendError> {
        {
            let mut store = self.lock();
            store.locate(tab_id).ok_or(BackendError::TabNotFound(tab_id))?;
            store.set_active(Some(tab_id));
        }
        self.changed("activate");
        Ok(())
    }

    /// Closes a tab. If it was active, the neighbour that takes its place
    /// (or the new last tab) becomes active.
    async fn close(&self, tab_id: TabId) -> Result<(), BackendError> {
        {
            let mut store = self.lock();
            let (pinned, pos) = store.locate(tab_id).ok_or(BackendError::TabNotFound(tab_id))?;
            let order_pos = if pinned { pos } else { store.pinned.len() + pos };

            let partition = store.partition_mut(pinned);
            let closed = partition.remove(pos);
            reorder::renumber(partition);

            if closed.active {
                let next = store
                    .iter()
                    .nth(order_pos)
                    .or_else(|| store.iter().last())
                    .map(|t| t.id);
                store.set_active(next);
            }

            store.recently_closed.push_front(ClosedTab {
                id: closed.id.0,
                title: closed.title,
                url: closed.url,
            });
            store.recently_closed.truncate(self.recent_limit);
        }
        self.changed("close");
        Ok(())
    }

    /// Appends a fresh active tab at the end of the unpinned partition.
    async fn create(&self, url: Option<&str>) -> Result<TabId, BackendError> {
        let id = {
            let mut store = self.lock();
            let id = TabId(store.next_id);
            store.next_id += 1;
            store.set_active(None);

            let index = store.unpinned.len();
            let mut tab = Tab::new(id, index, NEW_TAB_TITLE, url.unwrap_or(DEFAULT_URL));
            tab.active = true;
            tab.status = TabStatus::Complete;
            store.unpinned.push(tab);
            id
        };
        self.changed("create");
        Ok(id)
    }

    async fn move_tab(&self, tab_id: TabId, target: usize) -> Result<(), BackendError> {
        {
            let mut store = self.lock();
            let (pinned, pos) = store.locate(tab_id).ok_or(BackendError::TabNotFound(tab_id))?;
            let partition = store.partition_mut(pinned);
            if reorder::clamp_target(target, partition.len()) == pos {
                return Ok(());
            }
            reorder::move_within(partition, pos, target);
        }
        self.changed("move");
        Ok(())
    }

    /// Pinning appends to the pinned partition and leaves any group;
    /// unpinning puts the tab first in the unpinned partition.
    async fn toggle_pin(&self, tab: &Tab) -> Result<(), BackendError> {
        {
            let mut store = self.lock();
            let (pinned, pos) = store.locate(tab.id).ok_or(BackendError::TabNotFound(tab.id))?;
            let mut moved = store.partition_mut(pinned).remove(pos);
            moved.pinned = !pinned;
            if pinned {
                store.unpinned.insert(0, moved);
            } else {
                moved.group_id = GroupId::NONE;
                store.pinned.push(moved);
            }
            reorder::renumber(&mut store.pinned);
            reorder::renumber(&mut store.unpinned);
        }
        self.changed("toggle pin");
        Ok(())
    }

    async fn toggle_mute(&self, tab: &Tab) -> Result<(), BackendError> {
        {
            let mut store = self.lock();
            let stored = store.tab_mut(tab.id)?;
            stored.muted = !stored.muted;
        }
        self.changed("toggle mute");
        Ok(())
    }

    async fn set_group_collapsed(
        &self,
        group_id: GroupId,
        collapsed: bool,
    ) -> Result<(), BackendError> {
        {
            let mut store = self.lock();
            let group = store
                .groups
                .get_mut(&group_id)
                .ok_or(BackendError::GroupNotFound(group_id))?;
            group.collapsed = collapsed;
        }
        self.changed("set group collapsed");
        Ok(())
    }

    async fn recently_closed(&self) -> Result<Vec<ClosedTab>, BackendError> {
        Ok(self.lock().recently_closed.iter().cloned().collect())
    }
}
