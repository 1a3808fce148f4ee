//! Host bridge wire format.
//!
//! Newline-delimited JSON, one object per line:
//! Request:  {"id":1, "method":"tabs.query", "params":{"currentWindow":true}}
//! Response: {"id":1, "result":[...]} or {"id":1, "error":{"code":"not_found","message":"..."}}
//! Event:    {"event":"tabs.onMoved", ...}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::errors::HostError;
use crate::types::group::{Group, GroupColor, GroupId};
use crate::types::tab::{Tab, TabId, TabStatus};

/// Sentinel window id meaning "the window the host considers current".
pub const WINDOW_ID_CURRENT: i64 = -2;

/// Host events that mean tab or group state changed.
pub const CHANGE_EVENTS: &[&str] = &[
    "tabs.onCreated",
    "tabs.onUpdated",
    "tabs.onRemoved",
    "tabs.onActivated",
    "tabs.onMoved",
    "tabs.onAttached",
    "tabs.onDetached",
    "tabGroups.onCreated",
    "tabGroups.onUpdated",
    "tabGroups.onRemoved",
];

pub fn is_change_event(name: &str) -> bool {
    CHANGE_EVENTS.contains(&name)
}

#[derive(Debug, Serialize)]
pub struct HostRequest<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HostErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl From<HostErrorBody> for HostError {
    fn from(body: HostErrorBody) -> Self {
        match body.code.as_str() {
            "not_found" => HostError::NotFound(body.message),
            "unsupported" => HostError::Unsupported(body.message),
            _ => HostError::Failed(body.message),
        }
    }
}

/// Anything the host may send us.
///
/// Variants are tried in order. `Event` comes first: event payloads may carry
/// an `id` of their own (e.g. the created tab) and must not be taken for a
/// response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HostMessage {
    Event {
        event: String,
    },
    Response {
        id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<HostErrorBody>,
    },
}

impl HostMessage {
    pub fn parse(line: &str) -> Result<Self, HostError> {
        serde_json::from_str(line).map_err(|e| HostError::Protocol(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HostMutedInfo {
    #[serde(default)]
    pub muted: bool,
}

/// Tab record as reported by the host; most fields may be absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostTab {
    pub id: Option<i64>,
    #[serde(default)]
    pub index: usize,
    pub title: Option<String>,
    pub url: Option<String>,
    pub fav_icon_url: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    pub status: Option<String>,
    pub group_id: Option<i64>,
    pub muted_info: Option<HostMutedInfo>,
    pub audible: Option<bool>,
}

impl HostTab {
    /// Normalizes into a `Tab`. `index` is left as the host's unified index;
    /// callers renumber per partition. Tabs without an id are dropped.
    pub fn into_tab(self) -> Option<Tab> {
        let id = self.id?;
        let status = match self.status.as_deref() {
            Some("loading") => TabStatus::Loading,
            _ => TabStatus::Complete,
        };
        Some(Tab {
            id: TabId(id),
            index: self.index,
            title: self.title.filter(|t| !t.is_empty()).unwrap_or_else(|| "New Tab".to_string()),
            url: self.url.unwrap_or_default(),
            fav_icon_url: self.fav_icon_url.filter(|u| !u.is_empty()),
            active: self.active,
            pinned: self.pinned,
            status,
            group_id: self.group_id.map(GroupId).unwrap_or(GroupId::NONE),
            muted: self.muted_info.map(|m| m.muted).unwrap_or(false),
            audible: self.audible.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostGroup {
    pub id: i64,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: GroupColor,
    #[serde(default)]
    pub collapsed: bool,
}

/// Colors outside the known palette render as grey.
fn lenient_color<'de, D>(deserializer: D) -> Result<GroupColor, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|name| serde_json::from_value(Value::String(name)).ok())
        .unwrap_or_default())
}

impl From<HostGroup> for Group {
    fn from(g: HostGroup) -> Self {
        Group {
            id: GroupId(g.id),
            title: g.title.filter(|t| !t.is_empty()),
            color: g.color,
            collapsed: g.collapsed,
        }
    }
}
