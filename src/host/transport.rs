//! Request/response channel to the tab host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::protocol::{is_change_event, HostMessage, HostRequest};
use crate::bus::Notifier;
use crate::types::errors::HostError;

/// Trait defining one asynchronous round-trip to the tab host.
#[async_trait]
pub trait HostTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, HostError>;
}

type Pending = Mutex<HashMap<u64, oneshot::Sender<Result<Value, HostError>>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Newline-delimited JSON transport over any byte stream.
///
/// A reader task routes responses to their callers by id and forwards host
/// change events to the change bus.
pub struct JsonLineTransport {
    writer: tokio::sync::Mutex<Writer>,
    pending: Arc<Pending>,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl JsonLineTransport {
    /// Must be called from within a Tokio runtime.
    pub fn new<R, W>(reader: R, writer: W, notifier: Notifier, timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: Arc<Pending> = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_loop(
            reader,
            pending.clone(),
            closed.clone(),
            notifier,
        ));

        Self {
            writer: tokio::sync::Mutex::new(Box::new(writer)),
            pending,
            closed,
            next_id: AtomicU64::new(1),
            timeout,
            reader,
        }
    }

    /// Connects to a host bridge listening on `addr` (`host:port`).
    pub async fn connect(addr: &str, notifier: Notifier, timeout: Duration) -> Result<Self, HostError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| HostError::Timeout(format!("connect {}", addr)))?
            .map_err(|e| HostError::Failed(format!("connect {}: {}", addr, e)))?;
        let (read_half, write_half) = stream.into_split();
        log::info!("connected to tab host at {}", addr);
        Ok(Self::new(read_half, write_half, notifier, timeout))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn send_line(&self, line: String) -> Result<(), HostError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|_| HostError::Disconnected)?;
        writer.write_all(b"\n").await.map_err(|_| HostError::Disconnected)?;
        writer.flush().await.map_err(|_| HostError::Disconnected)
    }
}

impl Drop for JsonLineTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl HostTransport for JsonLineTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, HostError> {
        if self.is_closed() {
            return Err(HostError::Disconnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = serde_json::to_string(&HostRequest { id, method, params })
            .map_err(|e| HostError::Protocol(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        if let Err(e) = self.send_line(line).await {
            lock(&self.pending).remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(HostError::Disconnected),
            Err(_) => {
                lock(&self.pending).remove(&id);
                log::warn!("host request {} ({}) timed out", id, method);
                Err(HostError::Timeout(method.to_string()))
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn read_loop<R>(reader: R, pending: Arc<Pending>, closed: Arc<AtomicBool>, notifier: Notifier)
where
    R: AsyncRead + Send + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("tab host read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match HostMessage::parse(&line) {
            Ok(HostMessage::Response { id, result, error }) => {
                let outcome = match error {
                    Some(body) => Err(body.into()),
                    None => Ok(result.unwrap_or(Value::Null)),
                };
                match lock(&pending).remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(outcome);
                    }
                    None => log::debug!("dropping response for unknown request {}", id),
                }
            }
            Ok(HostMessage::Event { event }) => {
                if is_change_event(&event) {
                    log::trace!("host event {}", event);
                    notifier.notify();
                } else {
                    log::debug!("ignoring host event {}", event);
                }
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    closed.store(true, Ordering::SeqCst);
    log::warn!("tab host connection closed");
    for (_, tx) in lock(&pending).drain() {
        let _ = tx.send(Err(HostError::Disconnected));
    }
}
