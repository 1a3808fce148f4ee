//! Unit tests for the RPC handler, covering every JSON-RPC method dispatched by
//! `handle_method` through the same code path the `tabsidebar-rpc` binary uses.

use std::time::Duration;

use serde_json::json;

use tabsidebar::app::App;
use tabsidebar::backend::{Backend, SimulatedBackend};
use tabsidebar::bus::ChangeBus;
use tabsidebar::rpc_handler::handle_method;
use tabsidebar::settings::{SettingsEngine, SettingsEngineTrait};
use tabsidebar::types::group::GroupId;
use tabsidebar::types::settings::SidebarSettings;
use tabsidebar::types::tab::TabId;
use tempfile::TempDir;

/// A started App over the demo window, with its settings file in a temp directory.
async fn setup() -> (App, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let bus = ChangeBus::new(Duration::from_millis(50));
    let backend = Backend::Simulated(SimulatedBackend::with_demo_data(bus.notifier(), 10));
    let app = App::assemble(SettingsEngine::new(Some(path)), bus, backend);
    app.startup().await;
    (app, tmp)
}

// ─── Misc ───

#[tokio::test]
async fn test_ping() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "ping", &json!({})).await.unwrap();
    assert_eq!(res, json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "nonexistent.method", &json!({})).await;
    assert_eq!(res.unwrap_err(), "unknown method: nonexistent.method");
}

#[tokio::test]
async fn test_settings_get() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "settings.get", &json!({})).await.unwrap();
    assert_eq!(res["notifications"]["debounce_ms"], 50);
    assert_eq!(res["backend"]["mode"], "auto");
}

#[tokio::test]
async fn test_settings_set_persists() {
    let (app, tmp) = setup().await;

    let res = handle_method(
        &app,
        "settings.set",
        &json!({"key": "notifications.debounce_ms", "value": 120}),
    )
    .await
    .unwrap();
    assert_eq!(res, json!({"ok": true}));

    let res = handle_method(&app, "settings.get", &json!({})).await.unwrap();
    assert_eq!(res["notifications"]["debounce_ms"], 120);

    let mut reloaded = SettingsEngine::new(Some(
        tmp.path().join("settings.json").to_string_lossy().to_string(),
    ));
    assert_eq!(reloaded.load().unwrap().notifications.debounce_ms, 120);
}

#[tokio::test]
async fn test_settings_set_rejects_bad_input() {
    let (app, _tmp) = setup().await;

    let res = handle_method(&app, "settings.set", &json!({"value": 1})).await;
    assert_eq!(res.unwrap_err(), "missing key");

    let res = handle_method(&app, "settings.set", &json!({"key": "backend.mode"})).await;
    assert_eq!(res.unwrap_err(), "missing value");

    let res = handle_method(&app, "settings.set", &json!({"key": "backend.nope", "value": 1})).await;
    assert!(res.unwrap_err().starts_with("Invalid settings key"));

    let res = handle_method(&app, "settings.set", &json!({"key": "backend.mode", "value": 3})).await;
    assert!(res.unwrap_err().starts_with("Invalid settings value"));
}

#[tokio::test]
async fn test_settings_reset() {
    let (app, tmp) = setup().await;
    handle_method(&app, "settings.set", &json!({"key": "backend.mode", "value": "live"}))
        .await
        .unwrap();

    let res = handle_method(&app, "settings.reset", &json!({})).await.unwrap();

    assert_eq!(res["backend"]["mode"], "auto");
    let mut reloaded = SettingsEngine::new(Some(
        tmp.path().join("settings.json").to_string_lossy().to_string(),
    ));
    assert_eq!(reloaded.load().unwrap(), SidebarSettings::default());
}

// ─── Snapshot ───

#[tokio::test]
async fn test_snapshot_after_startup() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "sidebar.snapshot", &json!({})).await.unwrap();

    assert_eq!(res["tabs"].as_array().unwrap().len(), 8);
    assert_eq!(res["pinned"][0]["title"], "React Documentation");
    assert_eq!(res["pinned"][0]["favIconUrl"], "https://react.dev/favicon.ico");
    assert_eq!(res["rows"][0]["kind"], "tab");
    assert_eq!(res["rows"][1]["kind"], "groupHeader");
    assert_eq!(res["rows"][1]["group_id"], 1);
}

#[tokio::test]
async fn test_search_filters_and_clears() {
    let (app, _tmp) = setup().await;

    let res = handle_method(&app, "sidebar.search", &json!({"query": "react"})).await.unwrap();
    assert_eq!(res["query"], "react");
    assert_eq!(res["pinned"].as_array().unwrap().len(), 1);
    assert!(res["rows"].as_array().unwrap().is_empty());

    let res = handle_method(&app, "sidebar.search", &json!({})).await.unwrap();
    assert_eq!(res["query"], "");
    assert_eq!(res["pinned"].as_array().unwrap().len(), 2);
    assert_eq!(app.engine.search_query(), "");
}

#[tokio::test]
async fn test_refresh_returns_new_generation() {
    let (app, _tmp) = setup().await;
    let before = app.engine.snapshot().generation;
    let res = handle_method(&app, "sidebar.refresh", &json!({})).await.unwrap();
    assert!(res["generation"].as_u64().unwrap() > before);
}

// ─── Tabs ───

#[tokio::test]
async fn test_tab_activate() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "tab.activate", &json!({"tab_id": 7})).await.unwrap();
    assert_eq!(res, json!({"outcome": "applied"}));

    app.engine.refresh().await.unwrap();
    assert_eq!(app.engine.snapshot().active_tab().map(|t| t.id), Some(TabId(7)));
}

#[tokio::test]
async fn test_tab_methods_require_tab_id() {
    let (app, _tmp) = setup().await;
    for method in ["tab.activate", "tab.close", "tab.drop", "tab.togglePin", "tab.toggleMute"] {
        let res = handle_method(&app, method, &json!({})).await;
        assert_eq!(res.unwrap_err(), "missing tab_id", "{}", method);
    }
}

#[tokio::test]
async fn test_tab_close_of_vanished_tab_is_stale() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "tab.close", &json!({"tab_id": 404})).await.unwrap();
    assert_eq!(res, json!({"outcome": "stale"}));
}

#[tokio::test]
async fn test_tab_create_returns_id() {
    let (app, _tmp) = setup().await;
    let res = handle_method(&app, "tab.create", &json!({"url": "https://docs.rs"})).await.unwrap();
    assert_eq!(res, json!({"tab_id": 9}));
}

#[tokio::test]
async fn test_tab_drop() {
    let (app, _tmp) = setup().await;

    let res = handle_method(&app, "tab.drop", &json!({"tab_id": 1, "target_index": 0})).await.unwrap();
    assert_eq!(res, json!({"outcome": "unchanged"}));

    let res = handle_method(&app, "tab.drop", &json!({"tab_id": 1})).await;
    assert_eq!(res.unwrap_err(), "missing target_index");

    let res = handle_method(&app, "tab.drop", &json!({"tab_id": 1, "target_index": 3})).await.unwrap();
    assert_eq!(res, json!({"outcome": "applied"}));
    app.engine.refresh().await.unwrap();
    let moved = app.engine.snapshot().find_tab(TabId(1)).map(|t| t.index);
    assert_eq!(moved, Some(3));
}

#[tokio::test]
async fn test_tab_toggle_pin_and_mute() {
    let (app, _tmp) = setup().await;

    let res = handle_method(&app, "tab.togglePin", &json!({"tab_id": 6})).await.unwrap();
    assert_eq!(res, json!({"outcome": "applied"}));
    let res = handle_method(&app, "tab.toggleMute", &json!({"tab_id": 1})).await.unwrap();
    assert_eq!(res, json!({"outcome": "applied"}));

    app.engine.refresh().await.unwrap();
    let snapshot = app.engine.snapshot();
    assert!(snapshot.find_tab(TabId(6)).unwrap().pinned);
    assert!(snapshot.find_tab(TabId(1)).unwrap().muted);
}

// ─── Groups ───

#[tokio::test]
async fn test_group_toggle_collapsed() {
    let (app, _tmp) = setup().await;

    let res = handle_method(&app, "group.toggleCollapsed", &json!({"group_id": 1})).await.unwrap();
    assert_eq!(res, json!({"outcome": "applied"}));
    app.engine.refresh().await.unwrap();
    assert!(app.engine.snapshot().groups[&GroupId(1)].collapsed);

    let res = handle_method(&app, "group.toggleCollapsed", &json!({})).await;
    assert_eq!(res.unwrap_err(), "missing group_id");

    let res = handle_method(&app, "group.toggleCollapsed", &json!({"group_id": 42})).await.unwrap();
    assert_eq!(res, json!({"outcome": "stale"}));
}

// ─── Sessions ───

#[tokio::test]
async fn test_recently_closed() {
    let (app, _tmp) = setup().await;
    handle_method(&app, "tab.close", &json!({"tab_id": 6})).await.unwrap();

    let res = handle_method(&app, "sessions.recentlyClosed", &json!({})).await.unwrap();
    let entries = res.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["title"], "GitHub - Repository");
}
