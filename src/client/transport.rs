use super::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// The connection capability the mediator consumes: a persistent, event-based
/// channel where every emitted request is answered by exactly one
/// acknowledgment value, and where the remote side may additionally push
/// unsolicited events.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Establishes the persistent connection. No-op when already connected.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tears the connection down and fails anything still pending.
    async fn disconnect(&self);

    /// Emits one named event and awaits its single acknowledgment.
    async fn emit(&self, event: &str, payload: Value) -> Result<Value, TransportError>;

    /// Registers a listener for an unsolicited push event. The listener stays
    /// registered until the returned guard is dropped.
    fn subscribe(&self, event: &str) -> PushListener;

    fn is_connected(&self) -> bool;

    /// A watch over the connected flag; flips to `false` whenever the
    /// underlying connection drops.
    fn state_changes(&self) -> watch::Receiver<bool>;
}

/// Registry of push-event listeners shared between a transport's reader task
/// and its subscribers.
#[derive(Default)]
pub struct PushRegistry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<(u64, mpsc::UnboundedSender<Value>)>>>,
}

impl PushRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, event: &str) -> PushListener {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = self.listeners.lock().expect("push registry lock");
        listeners
            .entry(event.to_string())
            .or_default()
            .push((id, tx));
        PushListener {
            rx,
            event: event.to_string(),
            id,
            registry: Arc::clone(self),
        }
    }

    /// Delivers a push event to every currently registered listener.
    pub fn dispatch(&self, event: &str, payload: &Value) {
        let listeners = self.listeners.lock().expect("push registry lock");
        if let Some(entries) = listeners.get(event) {
            for (_, tx) in entries {
                let _ = tx.send(payload.clone());
            }
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        let listeners = self.listeners.lock().expect("push registry lock");
        listeners.get(event).map(Vec::len).unwrap_or(0)
    }

    fn remove(&self, event: &str, id: u64) {
        let mut listeners = self.listeners.lock().expect("push registry lock");
        if let Some(entries) = listeners.get_mut(event) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                listeners.remove(event);
            }
        }
    }
}

/// A registered push-event listener. Deregisters itself exactly once, on
/// drop, so every exit path of the awaiting code cleans up the same way.
pub struct PushListener {
    rx: mpsc::UnboundedReceiver<Value>,
    event: String,
    id: u64,
    registry: Arc<PushRegistry>,
}

impl PushListener {
    /// Awaits the next push of this event. `None` means the transport side of
    /// the channel is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

impl Drop for PushListener {
    fn drop(&mut self) {
        debug!(event = %self.event, "deregistering push listener");
        self.registry.remove(&self.event, self.id);
    }
}
