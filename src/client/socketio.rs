use super::error::TransportError;
use super::transport::{EventTransport, PushListener, PushRegistry};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, oneshot, watch};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Wire policy fixed at connection-open time. Not tunable per call.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Bound on every acknowledgment wait, so a lost ack cannot hang a call.
    pub ack_timeout: Duration,
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(30),
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Socket.io-style client over a websocket: engine.io v4 handshake, `2`/`3`
/// ping-pong, and `42<id>[event,payload]` emits correlated with `43<id>[...]`
/// acknowledgments through a pending map of oneshot senders.
#[derive(Clone)]
pub struct SocketIoTransport {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    options: TransportOptions,
    sink: AsyncMutex<Option<WsSink>>,
    pending: AsyncMutex<HashMap<u64, oneshot::Sender<Value>>>,
    ack_counter: AtomicU64,
    registry: Arc<PushRegistry>,
    connected: watch::Sender<bool>,
    closing: AtomicBool,
}

/// Rewrites an http(s) base URL into the websocket endpoint of the remote
/// service's event API.
fn endpoint_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    let with_scheme = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        trimmed.to_string()
    } else {
        format!("wss://{trimmed}")
    };
    format!("{with_scheme}/socket.io/?EIO=4&transport=websocket")
}

impl SocketIoTransport {
    pub fn new(base_url: &str, options: TransportOptions) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                url: endpoint_url(base_url),
                options,
                sink: AsyncMutex::new(None),
                pending: AsyncMutex::new(HashMap::new()),
                ack_counter: AtomicU64::new(0),
                registry: PushRegistry::new(),
                connected,
                closing: AtomicBool::new(false),
            }),
        }
    }
}

#[async_trait]
impl EventTransport for SocketIoTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            return Ok(());
        }
        self.inner.closing.store(false, Ordering::SeqCst);
        self.inner.establish().await
    }

    async fn disconnect(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        if let Some(mut sink) = self.inner.sink.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
        }
        self.inner.connected.send_replace(false);
        self.inner.fail_all_pending().await;
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<Value, TransportError> {
        let inner = &self.inner;
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }

        let id = inner.ack_counter.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        inner.pending.lock().await.insert(id, tx);

        let args = if payload.is_null() {
            json!([event])
        } else {
            json!([event, payload])
        };
        let body = serde_json::to_string(&args).map_err(|source| TransportError::Encode {
            event: event.to_string(),
            source,
        })?;
        debug!(event, ack_id = id, "emitting request");

        if let Err(err) = inner.send_raw(format!("42{id}{body}")).await {
            inner.pending.lock().await.remove(&id);
            return Err(err);
        }

        match timeout(inner.options.ack_timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                inner.pending.lock().await.remove(&id);
                Err(TransportError::AckTimeout {
                    event: event.to_string(),
                })
            }
        }
    }

    fn subscribe(&self, event: &str) -> PushListener {
        self.inner.registry.subscribe(event)
    }

    fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    fn state_changes(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }
}

impl Inner {
    // Boxed rather than `async fn`: reconnection makes this future
    // self-referential (establish -> read_loop -> handle_drop -> establish),
    // so the recursion must go through a type-erased future.
    fn establish(
        self: &Arc<Self>,
    ) -> futures_util::future::BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            let (stream, _) =
                connect_async(self.url.as_str())
                    .await
                    .map_err(|err| TransportError::Connect {
                        url: self.url.clone(),
                        message: err.to_string(),
                    })?;
            let (mut sink, mut source) = stream.split();

            // engine.io open frame, then socket.io namespace connect.
            let open = next_text(&mut source).await?;
            if !open.starts_with('0') {
                return Err(TransportError::Handshake {
                    message: format!("unexpected opening frame: {open}"),
                });
            }
            send_text(&mut sink, "40".to_string()).await?;
            loop {
                let frame = next_text(&mut source).await?;
                if frame.starts_with("40") {
                    break;
                }
                if let Some(detail) = frame.strip_prefix("44") {
                    return Err(TransportError::Handshake {
                        message: detail.to_string(),
                    });
                }
                if frame == "2" {
                    send_text(&mut sink, "3".to_string()).await?;
                }
            }

            *self.sink.lock().await = Some(sink);
            self.connected.send_replace(true);
            info!(url = %self.url, "connected to remote service");

            let reader = Arc::clone(self);
            tokio::spawn(async move {
                reader.read_loop(source).await;
            });
            Ok(())
        })
    }

    async fn read_loop(self: Arc<Self>, mut source: WsSource) {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if !self.handle_frame(text.as_str()).await {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "websocket receive error");
                    break;
                }
            }
        }
        self.handle_drop().await;
    }

    /// Processes one inbound frame. Returns `false` when the remote side ended
    /// the conversation.
    async fn handle_frame(&self, frame: &str) -> bool {
        if frame == "2" {
            if let Err(err) = self.send_raw("3".to_string()).await {
                warn!(%err, "failed to answer ping");
                return false;
            }
            return true;
        }
        if frame == "41" {
            return false;
        }
        if let Some(rest) = frame.strip_prefix("43") {
            self.resolve_ack(rest).await;
            return true;
        }
        if let Some(rest) = frame.strip_prefix("42") {
            self.dispatch_event(rest);
            return true;
        }
        debug!(frame, "ignoring unhandled frame");
        true
    }

    async fn resolve_ack(&self, rest: &str) {
        let split = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let id = match rest[..split].parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                debug!(frame = rest, "acknowledgment frame without an id");
                return;
            }
        };
        let value = serde_json::from_str::<Value>(&rest[split..])
            .ok()
            .and_then(|args| args.as_array().and_then(|a| a.first().cloned()))
            .unwrap_or(Value::Null);

        let sender = self.pending.lock().await.remove(&id);
        match sender {
            Some(tx) => {
                let _ = tx.send(value);
            }
            None => debug!(ack_id = id, "acknowledgment for unknown request"),
        }
    }

    fn dispatch_event(&self, rest: &str) {
        // A server-initiated event may carry its own ack id; skip it.
        let body = rest.trim_start_matches(|c: char| c.is_ascii_digit());
        let parsed = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, frame = body, "received invalid event frame");
                return;
            }
        };
        if let Some(args) = parsed.as_array() {
            if let Some(event) = args.first().and_then(Value::as_str) {
                let payload = args.get(1).cloned().unwrap_or(Value::Null);
                debug!(event, "dispatching push event");
                self.registry.dispatch(event, &payload);
            }
        }
    }

    async fn send_raw(&self, frame: String) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        let sink = sink.as_mut().ok_or(TransportError::Closed)?;
        sink.send(Message::Text(frame.into()))
            .await
            .map_err(|err| TransportError::WebSocket {
                message: err.to_string(),
            })
    }

    async fn handle_drop(self: &Arc<Self>) {
        self.sink.lock().await.take();
        self.connected.send_replace(false);
        self.fail_all_pending().await;

        if self.closing.load(Ordering::SeqCst) {
            return;
        }

        warn!("connection lost, attempting to reconnect");
        for attempt in 1..=self.options.reconnect_attempts {
            sleep(self.options.reconnect_delay).await;
            match self.establish().await {
                Ok(()) => {
                    info!(attempt, "reconnected");
                    return;
                }
                Err(err) => warn!(attempt, %err, "reconnect attempt failed"),
            }
        }
        warn!("exhausted reconnect attempts");
    }

    async fn fail_all_pending(&self) {
        // Dropping the senders resolves every waiter with a closed error.
        self.pending.lock().await.clear();
    }
}

async fn next_text(source: &mut WsSource) -> Result<String, TransportError> {
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => return Ok(text.to_string()),
            Ok(Message::Close(_)) => return Err(TransportError::Closed),
            Ok(_) => continue,
            Err(err) => {
                return Err(TransportError::WebSocket {
                    message: err.to_string(),
                });
            }
        }
    }
    Err(TransportError::Closed)
}

async fn send_text(sink: &mut WsSink, frame: String) -> Result<(), TransportError> {
    sink.send(Message::Text(frame.into()))
        .await
        .map_err(|err| TransportError::WebSocket {
            message: err.to_string(),
        })
}
