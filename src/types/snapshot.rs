//! Render-ready view of the current window's tabs and groups.
//!
//! A `Snapshot` is produced wholesale by one reconciliation pass and never
//! edited afterwards; consumers share it behind an `Arc`.

use std::collections::BTreeMap;

use serde::Serialize;

use super::group::{Group, GroupId};
use super::tab::{Tab, TabId};

/// One line of the unpinned section of the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SidebarRow {
    /// The following tabs (until the next header or ungrouped tab) belong to this group.
    GroupHeader { group_id: GroupId },
    Tab { tab: Tab },
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Snapshot {
    /// Every fetched tab, pinned partition first, each partition in index order.
    pub tabs: Vec<Tab>,
    pub groups: BTreeMap<GroupId, Group>,
    /// Search query the display sequences were filtered with.
    pub query: String,
    /// Pinned tabs matching the query, in fetched order.
    pub pinned: Vec<Tab>,
    /// Unpinned display sequence with group boundaries and collapse applied.
    pub rows: Vec<SidebarRow>,
    pub generation: u64,
}

impl Snapshot {
    /// Builds the display sequences from freshly fetched data.
    ///
    /// Pure: the same inputs always produce an equal snapshot.
    pub fn build(
        tabs: Vec<Tab>,
        groups: BTreeMap<GroupId, Group>,
        query: &str,
        generation: u64,
    ) -> Self {
        let needle = query.trim().to_lowercase();
        let mut pinned = Vec::new();
        let mut rows = Vec::new();
        let mut previous_group = GroupId::NONE;

        for tab in tabs.iter().filter(|t| t.matches_query(&needle)) {
            if tab.pinned {
                pinned.push(tab.clone());
                continue;
            }

            // Tabs pointing at a group we did not receive render as ungrouped.
            let group = groups.get(&tab.group_id);
            let group_id = group.map(|g| g.id).unwrap_or(GroupId::NONE);

            if group_id != previous_group && group_id != GroupId::NONE {
                rows.push(SidebarRow::GroupHeader { group_id });
            }
            previous_group = group_id;

            if group.map(|g| g.collapsed).unwrap_or(false) {
                continue;
            }
            rows.push(SidebarRow::Tab { tab: tab.clone() });
        }

        Self {
            tabs,
            groups,
            query: query.to_string(),
            pinned,
            rows,
            generation,
        }
    }

    /// Tabs the view would draw: pinned first, then unpinned rows.
    pub fn visible_tabs(&self) -> impl Iterator<Item = &Tab> {
        self.pinned.iter().chain(self.rows.iter().filter_map(|row| match row {
            SidebarRow::Tab { tab } => Some(tab),
            SidebarRow::GroupHeader { .. } => None,
        }))
    }

    /// All fetched members of a group, including ones hidden by collapse.
    pub fn group_members(&self, group_id: GroupId) -> Vec<&Tab> {
        self.tabs.iter().filter(|t| t.group_id == group_id).collect()
    }

    pub fn find_tab(&self, tab_id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.active)
    }

    pub fn headers(&self) -> Vec<GroupId> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                SidebarRow::GroupHeader { group_id } => Some(*group_id),
                SidebarRow::Tab { .. } => None,
            })
            .collect()
    }
}
