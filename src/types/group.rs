use std::fmt;

use serde::{Deserialize, Serialize};

/// Tab group handle as assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl GroupId {
    /// Sentinel carried by tabs that belong to no group.
    pub const NONE: GroupId = GroupId(-1);
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed palette offered by the host for tab groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    #[default]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

/// A named, colored, collapsible cluster of tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: Option<String>,
    pub color: GroupColor,
    pub collapsed: bool,
}

impl Group {
    pub fn new(id: GroupId, title: &str, color: GroupColor) -> Self {
        Self {
            id,
            title: Some(title.to_string()),
            color,
            collapsed: false,
        }
    }
}
