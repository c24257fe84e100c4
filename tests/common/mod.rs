use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value, json};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use vigil_mcp::client::{
    Credentials, EventTransport, MonitorClient, PushListener, PushRegistry, TransportError,
};

/// In-memory stand-in for the remote monitoring service: answers request
/// events against a mutable monitor table and pushes the collection when a
/// list request is accepted. Knobs make it misbehave on demand.
#[derive(Clone)]
pub struct FakeService {
    inner: Arc<Inner>,
}

struct Inner {
    monitors: Mutex<Vec<(i64, Value)>>,
    next_id: AtomicI64,
    login_count: AtomicU64,
    events: Mutex<Vec<String>>,
    registry: Arc<PushRegistry>,
    connected: watch::Sender<bool>,

    fail_login: AtomicBool,
    fail_list: AtomicBool,
    suppress_push: AtomicBool,
    omit_monitor_id: AtomicBool,
    fail_get: AtomicBool,
    arm_fail_refetch: AtomicBool,
}

impl FakeService {
    pub fn new() -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                monitors: Mutex::new(Vec::new()),
                next_id: AtomicI64::new(1),
                login_count: AtomicU64::new(0),
                events: Mutex::new(Vec::new()),
                registry: PushRegistry::new(),
                connected,
                fail_login: AtomicBool::new(false),
                fail_list: AtomicBool::new(false),
                suppress_push: AtomicBool::new(false),
                omit_monitor_id: AtomicBool::new(false),
                fail_get: AtomicBool::new(false),
                arm_fail_refetch: AtomicBool::new(false),
            }),
        }
    }

    pub fn client(&self) -> MonitorClient<FakeService> {
        self.client_with(Credentials {
            token: None,
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
        })
    }

    pub fn client_with(&self, credentials: Credentials) -> MonitorClient<FakeService> {
        MonitorClient::new(self.clone(), credentials)
    }

    pub fn login_count(&self) -> u64 {
        self.inner.login_count.load(Ordering::SeqCst)
    }

    pub fn emitted_events(&self) -> Vec<String> {
        self.inner.events.lock().unwrap().clone()
    }

    pub fn list_listener_count(&self) -> usize {
        self.inner.registry.listener_count("monitorList")
    }

    pub fn stored(&self, id: i64) -> Option<Value> {
        let monitors = self.inner.monitors.lock().unwrap();
        monitors
            .iter()
            .find(|(monitor_id, _)| *monitor_id == id)
            .map(|(_, record)| record.clone())
    }

    pub fn fail_login(&self) {
        self.inner.fail_login.store(true, Ordering::SeqCst);
    }

    pub fn fail_list(&self) {
        self.inner.fail_list.store(true, Ordering::SeqCst);
    }

    pub fn suppress_push(&self) {
        self.inner.suppress_push.store(true, Ordering::SeqCst);
    }

    pub fn omit_monitor_id(&self) {
        self.inner.omit_monitor_id.store(true, Ordering::SeqCst);
    }

    /// After the next successful edit, every fetch fails.
    pub fn fail_refetch_after_edit(&self) {
        self.inner.arm_fail_refetch.store(true, Ordering::SeqCst);
    }

    /// Simulates a transport-level disconnect.
    pub fn drop_connection(&self) {
        self.inner.connected.send_replace(false);
    }
}

impl Inner {
    fn ack(&self, event: &str, payload: Value) -> Value {
        match event {
            "login" | "loginByToken" => {
                if self.fail_login.load(Ordering::SeqCst) {
                    json!({"ok": false, "msg": "Incorrect username or password."})
                } else {
                    self.login_count.fetch_add(1, Ordering::SeqCst);
                    json!({"ok": true})
                }
            }
            "add" => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let mut record = payload.as_object().cloned().unwrap_or_default();
                record.insert("id".to_string(), json!(id));
                record.entry("active".to_string()).or_insert(json!(true));
                self.monitors
                    .lock()
                    .unwrap()
                    .push((id, Value::Object(record)));
                if self.omit_monitor_id.load(Ordering::SeqCst) {
                    json!({"ok": true})
                } else {
                    json!({"ok": true, "monitorID": id})
                }
            }
            "getMonitor" => {
                if self.fail_get.load(Ordering::SeqCst) {
                    return json!({"ok": false, "msg": "Monitor not found."});
                }
                let id = payload.as_i64().unwrap_or(0);
                let monitors = self.monitors.lock().unwrap();
                match monitors.iter().find(|(monitor_id, _)| *monitor_id == id) {
                    Some((_, record)) => json!({"ok": true, "monitor": record}),
                    None => json!({"ok": false, "msg": "Monitor not found."}),
                }
            }
            "editMonitor" => {
                let id = payload.get("id").and_then(Value::as_i64).unwrap_or(0);
                let mut monitors = self.monitors.lock().unwrap();
                match monitors
                    .iter_mut()
                    .find(|(monitor_id, _)| *monitor_id == id)
                {
                    Some((_, record)) => {
                        *record = payload.clone();
                        if self.arm_fail_refetch.load(Ordering::SeqCst) {
                            self.fail_get.store(true, Ordering::SeqCst);
                        }
                        json!({"ok": true, "monitorID": id})
                    }
                    None => json!({"ok": false, "msg": "Monitor not found."}),
                }
            }
            "deleteMonitor" => {
                let id = payload.as_i64().unwrap_or(0);
                let mut monitors = self.monitors.lock().unwrap();
                let before = monitors.len();
                monitors.retain(|(monitor_id, _)| *monitor_id != id);
                if monitors.len() < before {
                    json!({"ok": true})
                } else {
                    json!({"ok": false, "msg": "Monitor not found."})
                }
            }
            "pauseMonitor" | "resumeMonitor" => {
                let active = event == "resumeMonitor";
                let id = payload.as_i64().unwrap_or(0);
                let mut monitors = self.monitors.lock().unwrap();
                match monitors
                    .iter_mut()
                    .find(|(monitor_id, _)| *monitor_id == id)
                {
                    Some((_, record)) => {
                        if let Some(map) = record.as_object_mut() {
                            map.insert("active".to_string(), json!(active));
                        }
                        json!({"ok": true})
                    }
                    None => json!({"ok": false, "msg": "Monitor not found."}),
                }
            }
            "getMonitorList" => {
                if self.fail_list.load(Ordering::SeqCst) {
                    return json!({"ok": false, "msg": "You are not logged in."});
                }
                if !self.suppress_push.load(Ordering::SeqCst) {
                    let monitors = self.monitors.lock().unwrap();
                    let map: JsonMap<String, Value> = monitors
                        .iter()
                        .map(|(id, record)| (id.to_string(), record.clone()))
                        .collect();
                    self.registry.dispatch("monitorList", &Value::Object(map));
                }
                json!({"ok": true})
            }
            other => json!({"ok": false, "msg": format!("Unknown event '{other}'")}),
        }
    }
}

#[async_trait]
impl EventTransport for FakeService {
    async fn connect(&self) -> Result<(), TransportError> {
        self.inner.connected.send_replace(true);
        Ok(())
    }

    async fn disconnect(&self) {
        self.inner.connected.send_replace(false);
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<Value, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        self.inner.events.lock().unwrap().push(event.to_string());
        Ok(self.inner.ack(event, payload))
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

/// Parses tool-call arguments written as a JSON object literal.
#[allow(dead_code)]
pub fn args(value: Value) -> JsonMap<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}
