//! App Core for the tab sidebar.
//!
//! Owns the settings, the change bus and the engine, and picks the backend
//! variant once at startup.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{Backend, LiveBackend, SimulatedBackend};
use crate::bus::{ChangeBus, Notifier};
use crate::engine::SidebarEngine;
use crate::host::transport::JsonLineTransport;
use crate::settings::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::BackendError;
use crate::types::settings::{BackendMode, SidebarSettings};

/// Environment variable that overrides `backend.host_addr`.
pub const HOST_ADDR_ENV: &str = "TABSIDEBAR_HOST_ADDR";

/// Central application struct holding the bus and the engine.
///
/// Settings edits are persisted immediately but take effect on the next start;
/// the bus window and backend are fixed for the lifetime of the `App`.
pub struct App {
    pub settings: Mutex<SettingsEngine>,
    pub bus: ChangeBus,
    pub engine: Arc<SidebarEngine>,
}

impl App {
    /// Loads settings (falling back to defaults), selects the backend and wires
    /// the engine to the bus. Must be called from within a Tokio runtime.
    pub async fn new(mut settings: SettingsEngine) -> Self {
        if let Err(e) = settings.load() {
            log::warn!("using default settings: {}", e);
        }
        let config = settings.get_settings().clone();
        let bus = ChangeBus::new(Duration::from_millis(config.notifications.debounce_ms));
        let host_addr = std::env::var(HOST_ADDR_ENV).ok().or(config.backend.host_addr.clone());
        let backend = select_backend(&config, host_addr.as_deref(), bus.notifier()).await;
        Self::assemble(settings, bus, backend)
    }

    /// Wires an already-built backend. Must be called from within a Tokio runtime.
    pub fn assemble(settings: SettingsEngine, bus: ChangeBus, backend: Backend) -> Self {
        log::info!("tab sidebar running with {} backend", backend.kind());
        let engine = SidebarEngine::new(backend);
        engine.attach(&bus);
        Self {
            settings: Mutex::new(settings),
            bus,
            engine,
        }
    }

    /// Startup sequence: produce the first snapshot.
    pub async fn startup(&self) {
        if let Err(e) = self.engine.refresh().await {
            log::warn!("initial refresh failed: {}", e);
        }
    }

    /// Shutdown sequence: stop listening and drop every subscriber.
    pub fn shutdown(&self) {
        self.engine.detach();
        self.bus.shutdown();
    }
}

/// Chooses the backend variant. An unreachable host is resolved here, once,
/// by falling back to the simulated store.
pub async fn select_backend(
    settings: &SidebarSettings,
    host_addr: Option<&str>,
    notifier: Notifier,
) -> Backend {
    let recent_limit = settings.history.recently_closed_limit;
    let simulated = |notifier: Notifier| Backend::Simulated(SimulatedBackend::with_demo_data(notifier, recent_limit));

    if settings.backend.mode == BackendMode::Simulated {
        return simulated(notifier);
    }

    match connect_live(settings, host_addr, notifier.clone()).await {
        Ok(live) => Backend::Live(live),
        Err(e) => {
            if settings.backend.mode == BackendMode::Live {
                log::warn!("{}; falling back to simulated backend", e);
            } else {
                log::info!("{}; using simulated backend", e);
            }
            simulated(notifier)
        }
    }
}

async fn connect_live(
    settings: &SidebarSettings,
    host_addr: Option<&str>,
    notifier: Notifier,
) -> Result<LiveBackend, BackendError> {
    let addr = host_addr
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| BackendError::Unavailable("no host address configured".to_string()))?;
    let timeout = Duration::from_millis(settings.backend.request_timeout_ms);
    let transport = JsonLineTransport::connect(addr, notifier, timeout)
        .await
        .map_err(|e| BackendError::Unavailable(e.to_string()))?;
    Ok(LiveBackend::new(
        Arc::new(transport),
        settings.history.recently_closed_limit,
    ))
}
