//! Change Notification Bus.
//!
//! Collapses bursts of "something changed" signals into one callback per
//! subscriber using a trailing-edge debounce. Every `notify()` re-arms the
//! timer; subscribers run once the window elapses after the last call.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

/// Subscriber callback. Invoked from the bus task, never concurrently with itself.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

type SubscriberList = Mutex<Vec<(Uuid, Callback)>>;

/// Cheap handle used by backends and host event hooks to signal a change.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<()>,
}

impl Notifier {
    /// Signals that some tab or group state changed. Never blocks.
    pub fn notify(&self) {
        // A closed channel means the bus was shut down; nothing to wake.
        let _ = self.tx.send(());
    }

    /// A notifier that is not attached to any bus.
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

/// Owned debounce bus with an explicit subscriber set.
pub struct ChangeBus {
    subscribers: Arc<SubscriberList>,
    notifier: Notifier,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeBus {
    /// Creates the bus and spawns its debounce task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscribers: Arc<SubscriberList> = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(run_debounce(rx, window, Arc::downgrade(&subscribers)));

        Self {
            subscribers,
            notifier: Notifier { tx },
            task: Mutex::new(Some(task)),
        }
    }

    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    pub fn notify(&self) {
        self.notifier.notify();
    }

    /// Registers `callback`; it stays registered until the returned
    /// `Subscription` is unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        lock(&self.subscribers).push((id, Arc::new(callback)));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Drops every subscriber and stops the debounce task. Pending bursts are discarded.
    pub fn shutdown(&self) {
        lock(&self.subscribers).clear();
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
        log::debug!("change bus shut down");
    }
}

impl Drop for ChangeBus {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

/// Registration handle returned by [`ChangeBus::subscribe`].
pub struct Subscription {
    id: Uuid,
    subscribers: Weak<SubscriberList>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            lock(&subscribers).retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_debounce(
    mut rx: mpsc::UnboundedReceiver<()>,
    window: Duration,
    subscribers: Weak<SubscriberList>,
) {
    while rx.recv().await.is_some() {
        let deadline = sleep(window);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                signal = rx.recv() => match signal {
                    Some(()) => deadline.as_mut().reset(Instant::now() + window),
                    None => return,
                },
            }
        }

        let Some(subscribers) = subscribers.upgrade() else {
            return;
        };
        dispatch(&subscribers);
    }
}

/// Runs the callbacks registered at fire time, outside the lock so a
/// callback may subscribe or unsubscribe.
fn dispatch(subscribers: &SubscriberList) {
    let callbacks: Vec<(Uuid, Callback)> = lock(subscribers).clone();
    log::trace!("change bus firing for {} subscribers", callbacks.len());

    for (id, callback) in callbacks {
        if panic::catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
            log::error!("change subscriber {} panicked; continuing", id);
        }
    }
}
