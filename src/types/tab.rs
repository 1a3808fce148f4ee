use std::fmt;

use serde::{Deserialize, Serialize};

use super::group::GroupId;

/// Backend-assigned tab handle. Never reused while the tab exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load status reported by the tab host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    #[default]
    Complete,
}

/// Represents one open tab in the current window.
///
/// `index` is the position within the tab's partition: pinned tabs are
/// numbered `0..pinned_count` and unpinned tabs `0..unpinned_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub index: usize,
    pub title: String,
    pub url: String,
    pub fav_icon_url: Option<String>,
    pub active: bool,
    pub pinned: bool,
    pub status: TabStatus,
    pub group_id: GroupId,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub audible: bool,
}

impl Tab {
    /// Creates an ungrouped, unpinned, inactive tab at `index`.
    pub fn new(id: TabId, index: usize, title: &str, url: &str) -> Self {
        Self {
            id,
            index,
            title: title.to_string(),
            url: url.to_string(),
            fav_icon_url: None,
            active: false,
            pinned: false,
            status: TabStatus::Complete,
            group_id: GroupId::NONE,
            muted: false,
            audible: false,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id != GroupId::NONE
    }

    /// Case-insensitive substring match against title or url.
    /// `needle` must already be lowercased; an empty needle matches everything.
    pub fn matches_query(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.url.to_lowercase().contains(needle)
    }
}

/// Returns true when `index` addresses an element of a collection of size `len`.
pub fn index_in_range(index: usize, len: usize) -> bool {
    index < len
}
