//! RPC method handler for the sidebar's JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches view requests to the engine owned by `App`.

use serde_json::{json, Value};

use crate::app::App;
use crate::engine::{MutationOutcome, RefreshOutcome};
use crate::settings::SettingsEngineTrait;
use crate::types::group::GroupId;
use crate::types::tab::TabId;

fn tab_id(params: &Value) -> Result<TabId, String> {
    params
        .get("tab_id")
        .and_then(|v| v.as_i64())
        .map(TabId)
        .ok_or_else(|| "missing tab_id".to_string())
}

fn group_id(params: &Value) -> Result<GroupId, String> {
    params
        .get("group_id")
        .and_then(|v| v.as_i64())
        .map(GroupId)
        .ok_or_else(|| "missing group_id".to_string())
}

fn outcome(result: MutationOutcome) -> Value {
    json!({ "outcome": result })
}

fn refreshed(result: RefreshOutcome) -> Result<Value, String> {
    match result {
        RefreshOutcome::Applied(snapshot) => serde_json::to_value(&*snapshot).map_err(|e| e.to_string()),
        RefreshOutcome::Superseded => Ok(json!({ "superseded": true })),
    }
}

/// Dispatch a JSON-RPC method call to the sidebar engine.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    let engine = &app.engine;
    match method {
        "ping" => Ok(json!({ "pong": true })),

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(settings.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut settings = app.settings.lock().map_err(|e| e.to_string())?;
            settings.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({ "ok": true }))
        }
        "settings.reset" => {
            let mut settings = app.settings.lock().map_err(|e| e.to_string())?;
            settings.reset().map_err(|e| e.to_string())?;
            serde_json::to_value(settings.get_settings()).map_err(|e| e.to_string())
        }

        // ─── Snapshot ───
        "sidebar.snapshot" => serde_json::to_value(&*engine.snapshot()).map_err(|e| e.to_string()),
        "sidebar.refresh" => refreshed(engine.refresh().await.map_err(|e| e.to_string())?),
        "sidebar.search" => {
            let query = params.get("query").and_then(|v| v.as_str()).unwrap_or("");
            refreshed(engine.set_search_query(query).await.map_err(|e| e.to_string())?)
        }

        // ─── Tabs ───
        "tab.activate" => {
            let id = tab_id(params)?;
            engine.activate(id).await.map(outcome).map_err(|e| e.to_string())
        }
        "tab.close" => {
            let id = tab_id(params)?;
            engine.close(id).await.map(outcome).map_err(|e| e.to_string())
        }
        "tab.create" => {
            let url = params.get("url").and_then(|v| v.as_str());
            let id = engine.create(url).await.map_err(|e| e.to_string())?;
            Ok(json!({ "tab_id": id }))
        }
        "tab.drop" => {
            let id = tab_id(params)?;
            let target = params
                .get("target_index")
                .and_then(|v| v.as_u64())
                .ok_or("missing target_index")? as usize;
            engine.drop_tab(id, target).await.map(outcome).map_err(|e| e.to_string())
        }
        "tab.togglePin" => {
            let id = tab_id(params)?;
            engine.toggle_pin(id).await.map(outcome).map_err(|e| e.to_string())
        }
        "tab.toggleMute" => {
            let id = tab_id(params)?;
            engine.toggle_mute(id).await.map(outcome).map_err(|e| e.to_string())
        }

        // ─── Groups ───
        "group.toggleCollapsed" => {
            let id = group_id(params)?;
            engine
                .toggle_group_collapsed(id)
                .await
                .map(outcome)
                .map_err(|e| e.to_string())
        }

        // ─── Sessions ───
        "sessions.recentlyClosed" => {
            let entries = engine.recently_closed().await.map_err(|e| e.to_string())?;
            Ok(json!(entries))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
