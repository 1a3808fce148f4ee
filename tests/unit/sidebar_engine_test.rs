use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tabsidebar::backend::{Backend, LiveBackend, SimulatedBackend};
use tabsidebar::bus::{ChangeBus, Notifier};
use tabsidebar::engine::{MutationOutcome, RefreshOutcome, SidebarEngine};
use tabsidebar::host::transport::HostTransport;
use tabsidebar::types::errors::{HostError, SidebarError};
use tabsidebar::types::group::GroupId;
use tabsidebar::types::snapshot::{SidebarRow, Snapshot};
use tabsidebar::types::tab::{Tab, TabId};
use tokio::sync::oneshot;

fn tab(id: i64, index: usize, title: &str, pinned: bool) -> Tab {
    let mut t = Tab::new(TabId(id), index, title, &format!("https://tab{}.example", id));
    t.pinned = pinned;
    t
}

fn simulated(tabs: Vec<Tab>) -> Arc<SidebarEngine> {
    SidebarEngine::new(Backend::Simulated(SimulatedBackend::new(tabs, Vec::new(), Notifier::detached())))
}

fn demo_engine(notifier: Notifier) -> Arc<SidebarEngine> {
    SidebarEngine::new(Backend::Simulated(SimulatedBackend::with_demo_data(notifier, 10)))
}

fn visible_ids(snapshot: &Snapshot) -> Vec<i64> {
    snapshot.visible_tabs().map(|t| t.id.0).collect()
}

fn applied(outcome: RefreshOutcome) -> Arc<Snapshot> {
    match outcome {
        RefreshOutcome::Applied(snapshot) => snapshot,
        RefreshOutcome::Superseded => panic!("refresh unexpectedly superseded"),
    }
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_keeps_order() {
    let engine = simulated(vec![
        tab(1, 0, "React Documentation", false),
        tab(2, 1, "Tailwind CSS", false),
    ]);

    let snapshot = applied(engine.set_search_query("react").await.unwrap());

    assert_eq!(visible_ids(&snapshot), vec![1]);
    assert_eq!(snapshot.query, "react");
    assert_eq!(snapshot.tabs.len(), 2, "raw data is not filtered");
}

#[tokio::test]
async fn test_search_matches_url_and_empty_query_matches_all() {
    let engine = demo_engine(Notifier::detached());

    let snapshot = applied(engine.set_search_query("ATLASSIAN").await.unwrap());
    assert_eq!(visible_ids(&snapshot), vec![5]);

    let snapshot = applied(engine.set_search_query("").await.unwrap());
    assert_eq!(visible_ids(&snapshot), vec![3, 4, 1, 2, 5, 6, 7, 8]);
}

#[tokio::test]
async fn test_search_keeps_group_header_for_matching_members() {
    let engine = demo_engine(Notifier::detached());
    let snapshot = applied(engine.set_search_query("best").await.unwrap());
    assert_eq!(
        snapshot.rows.iter().map(|r| matches!(r, SidebarRow::GroupHeader { .. })).collect::<Vec<_>>(),
        vec![true, false]
    );
    assert_eq!(snapshot.headers(), vec![GroupId(2)]);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let engine = demo_engine(Notifier::detached());
    let first = applied(engine.refresh().await.unwrap());
    let second = applied(engine.refresh().await.unwrap());

    assert_eq!(first.tabs, second.tabs);
    assert_eq!(first.groups, second.groups);
    assert_eq!(first.pinned, second.pinned);
    assert_eq!(first.rows, second.rows);
    assert!(second.generation > first.generation);
}

#[tokio::test]
async fn test_collapsed_group_hides_members_but_keeps_data() {
    let engine = demo_engine(Notifier::detached());
    engine.refresh().await.unwrap();

    assert_eq!(engine.toggle_group_collapsed(GroupId(1)).await.unwrap(), MutationOutcome::Applied);
    let snapshot = applied(engine.refresh().await.unwrap());

    assert!(snapshot.groups[&GroupId(1)].collapsed);
    let visible = visible_ids(&snapshot);
    assert!(!visible.contains(&2));
    assert!(!visible.contains(&5));
    assert_eq!(snapshot.group_members(GroupId(1)).len(), 2);
    assert!(snapshot.headers().contains(&GroupId(1)));
}

#[tokio::test]
async fn test_pinned_and_unpinned_have_independent_index_spaces() {
    let engine = simulated(vec![
        tab(1, 0, "A", true),
        tab(2, 1, "B", false),
        tab(3, 2, "C", true),
        tab(4, 3, "D", false),
    ]);
    let snapshot = applied(engine.refresh().await.unwrap());

    let pinned: Vec<(i64, usize)> = snapshot.pinned.iter().map(|t| (t.id.0, t.index)).collect();
    assert_eq!(pinned, vec![(1, 0), (3, 1)]);
    let unpinned: Vec<(i64, usize)> = snapshot
        .rows
        .iter()
        .filter_map(|r| match r {
            SidebarRow::Tab { tab } => Some((tab.id.0, tab.index)),
            SidebarRow::GroupHeader { .. } => None,
        })
        .collect();
    assert_eq!(unpinned, vec![(2, 0), (4, 1)]);
}

#[tokio::test]
async fn test_drag_first_tab_to_end() {
    let engine = simulated(vec![tab(1, 0, "T1", false), tab(2, 1, "T2", false), tab(3, 2, "T3", false)]);
    engine.refresh().await.unwrap();

    assert_eq!(engine.drop_tab(TabId(1), 2).await.unwrap(), MutationOutcome::Applied);

    let snapshot = applied(engine.refresh().await.unwrap());
    let order: Vec<(i64, usize)> = snapshot.tabs.iter().map(|t| (t.id.0, t.index)).collect();
    assert_eq!(order, vec![(2, 0), (3, 1), (1, 2)]);
}

#[tokio::test]
async fn test_drop_edge_cases_do_not_reach_backend() {
    let engine = demo_engine(Notifier::detached());
    engine.refresh().await.unwrap();

    // Google is unpinned index 0.
    assert_eq!(engine.drop_tab(TabId(1), 0).await.unwrap(), MutationOutcome::Unchanged);
    // Pinned tabs are not draggable.
    assert_eq!(engine.drop_tab(TabId(3), 4).await.unwrap(), MutationOutcome::Unchanged);
    // Unknown tab: stale request, dropped quietly.
    assert_eq!(engine.drop_tab(TabId(77), 1).await.unwrap(), MutationOutcome::Stale);

    let snapshot = applied(engine.refresh().await.unwrap());
    assert_eq!(snapshot.tabs[2].id, TabId(1));
}

#[tokio::test(start_paused = true)]
async fn test_same_index_drop_fires_no_notification() {
    let bus = ChangeBus::new(Duration::from_millis(50));
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let _sub = bus.subscribe(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });
    let engine = demo_engine(bus.notifier());
    engine.refresh().await.unwrap();

    engine.drop_tab(TabId(5), 2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stale_ids_are_dropped_quietly() {
    let engine = demo_engine(Notifier::detached());
    engine.refresh().await.unwrap();

    assert_eq!(engine.activate(TabId(404)).await.unwrap(), MutationOutcome::Stale);
    assert_eq!(engine.close(TabId(404)).await.unwrap(), MutationOutcome::Stale);
    assert_eq!(engine.toggle_pin(TabId(404)).await.unwrap(), MutationOutcome::Stale);
    assert_eq!(engine.toggle_mute(TabId(404)).await.unwrap(), MutationOutcome::Stale);
    assert_eq!(engine.toggle_group_collapsed(GroupId(404)).await.unwrap(), MutationOutcome::Stale);
    assert_eq!(engine.set_group_collapsed(GroupId(404), true).await.unwrap(), MutationOutcome::Stale);
}

#[tokio::test(start_paused = true)]
async fn test_mutations_flow_through_bus_into_new_snapshot() {
    let bus = ChangeBus::new(Duration::from_millis(50));
    let engine = demo_engine(bus.notifier());
    engine.attach(&bus);
    engine.refresh().await.unwrap();
    let mut updates = engine.watch();
    updates.borrow_and_update();

    let id = engine.create(Some("https://rust-lang.org")).await.unwrap();
    assert_eq!(engine.toggle_mute(TabId(1)).await.unwrap(), MutationOutcome::Applied);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(updates.has_changed().unwrap());
    let snapshot = engine.snapshot();
    let created = snapshot.find_tab(id).unwrap();
    assert_eq!(created.url, "https://rust-lang.org");
    assert_eq!(snapshot.active_tab().map(|t| t.id), Some(id));
    assert!(snapshot.find_tab(TabId(1)).unwrap().muted);

    engine.detach();
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test]
async fn test_recently_closed_from_engine() {
    let engine = demo_engine(Notifier::detached());
    engine.refresh().await.unwrap();
    engine.close(TabId(8)).await.unwrap();

    let recent = engine.recently_closed().await.unwrap();
    assert_eq!(recent[0].title, "Best Buy");
    assert_eq!(recent.len(), 4);
}

/// Host double: serves a fixed window, can fail on demand and can hold the
/// first `tabs.query` until released.
struct ScriptedHost {
    fail: AtomicBool,
    title: Mutex<String>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedHost {
    fn new(title: &str) -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            title: Mutex::new(title.to_string()),
            gate: Mutex::new(None),
        })
    }
}

#[async_trait]
impl HostTransport for ScriptedHost {
    async fn call(&self, method: &str, _params: Value) -> Result<Value, HostError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Failed("host busy".to_string()));
        }
        match method {
            "tabs.query" => {
                let title = self.title.lock().unwrap().clone();
                let gate = self.gate.lock().unwrap().take();
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(json!([{"id": 1, "index": 0, "title": title, "url": "https://a.example"}]))
            }
            "tabGroups.query" => Ok(json!([])),
            _ => Ok(Value::Null),
        }
    }
}

fn live_engine(host: Arc<ScriptedHost>) -> Arc<SidebarEngine> {
    SidebarEngine::new(Backend::Live(LiveBackend::new(host, 10)))
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_snapshot() {
    let host = ScriptedHost::new("first");
    let engine = live_engine(host.clone());
    let before = applied(engine.refresh().await.unwrap());

    host.fail.store(true, Ordering::SeqCst);
    let result = engine.refresh().await;

    assert!(matches!(result, Err(SidebarError::FetchFailure(_))));
    let after = engine.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.tabs[0].title, "first");
}

#[tokio::test]
async fn test_late_completion_of_older_refresh_is_discarded() {
    let host = ScriptedHost::new("old");
    let (release, gate) = oneshot::channel();
    *host.gate.lock().unwrap() = Some(gate);
    let engine = live_engine(host.clone());

    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.refresh().await }
    });
    // Let the first refresh claim its generation and park on the gate.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    *host.title.lock().unwrap() = "new".to_string();
    let fast = applied(engine.refresh().await.unwrap());
    assert_eq!(fast.tabs[0].title, "new");

    release.send(()).unwrap();
    let late = slow.await.unwrap().unwrap();

    assert!(matches!(late, RefreshOutcome::Superseded));
    assert_eq!(engine.snapshot().tabs[0].title, "new");
    assert_eq!(engine.snapshot().generation, fast.generation);
}
