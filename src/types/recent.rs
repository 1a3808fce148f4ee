use serde::{Deserialize, Serialize};

/// An entry of the recently-closed list, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTab {
    pub id: i64,
    pub title: String,
    pub url: String,
}
