//! Reconciliation/Query Engine and the view-facing entry points.
//!
//! Each refresh re-fetches tabs and groups, filters and orders them into a
//! fresh [`Snapshot`], and publishes it if no newer refresh was started in the
//! meantime. Snapshots are replaced wholesale and shared through a
//! `tokio::sync::watch` channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use crate::backend::{Backend, TabBackend};
use crate::bus::{ChangeBus, Subscription};
use crate::reorder::{self, DropPlan};
use crate::types::errors::{BackendError, SidebarError};
use crate::types::group::GroupId;
use crate::types::recent::ClosedTab;
use crate::types::snapshot::Snapshot;
use crate::types::tab::{Tab, TabId};

/// Completion signal of a mutation entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOutcome {
    /// The backend accepted the change; a new snapshot follows via the bus.
    Applied,
    /// The referenced tab or group vanished first; the request was dropped.
    Stale,
    /// Nothing to do, no backend call was made.
    Unchanged,
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Applied(Arc<Snapshot>),
    /// A newer refresh was initiated while this one was in flight.
    Superseded,
}

pub struct SidebarEngine {
    backend: Backend,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    query: Mutex<String>,
    initiated: AtomicU64,
    applied: Mutex<u64>,
    subscription: Mutex<Option<Subscription>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SidebarEngine {
    pub fn new(backend: Backend) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));
        Arc::new(Self {
            backend,
            snapshot_tx,
            query: Mutex::new(String::new()),
            initiated: AtomicU64::new(0),
            applied: Mutex::new(0),
            subscription: Mutex::new(None),
        })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Refreshes on every debounced bus signal until [`detach`](Self::detach).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach(self: &Arc<Self>, bus: &ChangeBus) {
        let engine = Arc::downgrade(self);
        let runtime = tokio::runtime::Handle::current();
        let subscription = bus.subscribe(move || {
            let Some(engine) = engine.upgrade() else {
                return;
            };
            runtime.spawn(async move {
                if let Err(e) = engine.refresh().await {
                    log::warn!("{}", e);
                }
            });
        });
        *lock(&self.subscription) = Some(subscription);
    }

    pub fn detach(&self) {
        lock(&self.subscription).take();
    }

    /// Latest applied snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that observes every applied snapshot.
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn search_query(&self) -> String {
        lock(&self.query).clone()
    }

    /// Replaces the search filter and reconciles with it.
    pub async fn set_search_query(&self, query: &str) -> Result<RefreshOutcome, SidebarError> {
        *lock(&self.query) = query.to_string();
        self.refresh().await
    }

    /// Fetches, filters and orders current state. Read-only towards the backend.
    ///
    /// On fetch failure the previous snapshot stays in place. A result is
    /// published only if no later refresh was initiated meanwhile.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SidebarError> {
        let generation = self.initiated.fetch_add(1, Ordering::SeqCst) + 1;
        let query = self.search_query();

        let (tabs, groups) =
            tokio::try_join!(self.backend.list_tabs(), self.backend.list_groups()).map_err(|e| {
                log::warn!("refresh {} failed, keeping last snapshot: {}", generation, e);
                match e {
                    BackendError::FetchFailure(msg) => SidebarError::FetchFailure(msg),
                    other => SidebarError::FetchFailure(other.to_string()),
                }
            })?;

        let snapshot = Arc::new(Snapshot::build(tabs, groups, &query, generation));

        let mut applied = lock(&self.applied);
        if generation != self.initiated.load(Ordering::SeqCst) || generation <= *applied {
            log::debug!("discarding superseded refresh {}", generation);
            return Ok(RefreshOutcome::Superseded);
        }
        *applied = generation;
        self.snapshot_tx.send_replace(snapshot.clone());
        log::trace!(
            "applied snapshot {} ({} tabs, {} rows)",
            generation,
            snapshot.tabs.len(),
            snapshot.rows.len()
        );
        Ok(RefreshOutcome::Applied(snapshot))
    }

    pub async fn activate(&self, tab_id: TabId) -> Result<MutationOutcome, SidebarError> {
        settle("activate", self.backend.activate(tab_id).await)
    }

    pub async fn close(&self, tab_id: TabId) -> Result<MutationOutcome, SidebarError> {
        settle("close", self.backend.close(tab_id).await)
    }

    pub async fn create(&self, url: Option<&str>) -> Result<TabId, SidebarError> {
        self.backend.create(url).await.map_err(|e| {
            log::warn!("create failed: {}", e);
            SidebarError::from(e)
        })
    }

    /// Applies a drag-and-drop of `tab_id` onto unpinned position `target`.
    pub async fn drop_tab(&self, tab_id: TabId, target: usize) -> Result<MutationOutcome, SidebarError> {
        let snapshot = self.snapshot();
        match reorder::plan_drop(&snapshot.tabs, tab_id, target) {
            Ok(DropPlan::NoOp) => Ok(MutationOutcome::Unchanged),
            Ok(DropPlan::Move { tab_id, target }) => {
                settle("move", self.backend.move_tab(tab_id, target).await)
            }
            Err(e) => settle("move", Err(e)),
        }
    }

    pub async fn toggle_pin(&self, tab_id: TabId) -> Result<MutationOutcome, SidebarError> {
        match self.known_tab(tab_id) {
            Some(tab) => settle("toggle pin", self.backend.toggle_pin(&tab).await),
            None => settle("toggle pin", Err(BackendError::TabNotFound(tab_id))),
        }
    }

    pub async fn toggle_mute(&self, tab_id: TabId) -> Result<MutationOutcome, SidebarError> {
        match self.known_tab(tab_id) {
            Some(tab) => settle("toggle mute", self.backend.toggle_mute(&tab).await),
            None => settle("toggle mute", Err(BackendError::TabNotFound(tab_id))),
        }
    }

    pub async fn set_group_collapsed(
        &self,
        group_id: GroupId,
        collapsed: bool,
    ) -> Result<MutationOutcome, SidebarError> {
        settle(
            "set group collapsed",
            self.backend.set_group_collapsed(group_id, collapsed).await,
        )
    }

    /// Flips the collapse state the current snapshot shows for a group.
    pub async fn toggle_group_collapsed(&self, group_id: GroupId) -> Result<MutationOutcome, SidebarError> {
        let collapsed = self.snapshot().groups.get(&group_id).map(|g| g.collapsed);
        match collapsed {
            Some(collapsed) => self.set_group_collapsed(group_id, !collapsed).await,
            None => settle("toggle group", Err(BackendError::GroupNotFound(group_id))),
        }
    }

    pub async fn recently_closed(&self) -> Result<Vec<ClosedTab>, SidebarError> {
        self.backend.recently_closed().await.map_err(SidebarError::from)
    }

    fn known_tab(&self, tab_id: TabId) -> Option<Tab> {
        self.snapshot().find_tab(tab_id).cloned()
    }
}

/// Maps a backend result to the completion signal; stale ids are dropped quietly.
fn settle(op: &str, result: Result<(), BackendError>) -> Result<MutationOutcome, SidebarError> {
    match result {
        Ok(()) => Ok(MutationOutcome::Applied),
        Err(e) if e.is_not_found() => {
            log::debug!("{} dropped: {}", op, e);
            Ok(MutationOutcome::Stale)
        }
        Err(e) => {
            log::warn!("{} failed: {}", op, e);
            Err(SidebarError::from(e))
        }
    }
}
