use super::error::{ClientError, TransportError};
use super::transport::EventTransport;
use crate::domain::{
    Monitor, MonitorConfig, MonitorSummary, apply_create_defaults, project, validate,
};
use regex::RegexBuilder;
use serde_json::{Map as JsonMap, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The push event carrying the full monitor collection.
const LIST_EVENT: &str = "monitorList";

/// Bound on the wait for the collection push after a list request was
/// accepted.
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Either a bearer token or a username+password pair.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn is_empty(&self) -> bool {
        self.token.is_none() && (self.username.is_none() || self.password.is_none())
    }
}

/// One logical session against the remote monitoring service: a persistent
/// connection plus a single authenticated flag, with lazy re-authentication
/// on the next operation after a drop.
pub struct MonitorClient<T: EventTransport> {
    transport: T,
    credentials: Credentials,
    authenticated: Arc<AtomicBool>,
}

impl<T: EventTransport + 'static> MonitorClient<T> {
    pub fn new(transport: T, credentials: Credentials) -> Self {
        let authenticated = Arc::new(AtomicBool::new(false));

        // A transport-level disconnect invalidates the session regardless of
        // what phase any operation is in.
        let mut state = transport.state_changes();
        let flag = Arc::clone(&authenticated);
        tokio::spawn(async move {
            while state.changed().await.is_ok() {
                if !*state.borrow() {
                    debug!("connection dropped, clearing authenticated flag");
                    flag.store(false, Ordering::SeqCst);
                }
            }
        });

        Self {
            transport,
            credentials,
            authenticated,
        }
    }

    pub async fn connect(&self) -> Result<(), ClientError> {
        self.transport.connect().await?;
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.transport.disconnect().await;
        self.authenticated.store(false, Ordering::SeqCst);
    }

    /// Logs in with whichever credential mode is configured. Idempotent once
    /// successful; connects first when necessary; fails without any remote
    /// call when no credentials are configured.
    pub async fn authenticate(&self) -> Result<(), ClientError> {
        if self.authenticated.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.credentials.is_empty() {
            return Err(ClientError::NoCredentials);
        }
        self.transport.connect().await?;

        let ack = match &self.credentials.token {
            Some(token) => self.transport.emit("loginByToken", json!(token)).await?,
            None => {
                let payload = json!({
                    "username": self.credentials.username,
                    "password": self.credentials.password,
                    "token": "",
                });
                self.transport.emit("login", payload).await?
            }
        };

        if ack_ok(&ack) {
            self.authenticated.store(true, Ordering::SeqCst);
            info!("authenticated with remote service");
            Ok(())
        } else {
            Err(ClientError::Authentication {
                message: ack_message(&ack),
            })
        }
    }

    /// One authenticated request/acknowledgment round trip. A not-ok
    /// acknowledgment becomes a typed operation failure carrying the remote
    /// message; there is no automatic retry.
    async fn call(&self, op: &str, payload: Value) -> Result<Value, ClientError> {
        self.authenticate().await?;
        let ack = self.transport.emit(op, payload).await?;
        if ack_ok(&ack) {
            Ok(ack)
        } else {
            Err(ClientError::Operation {
                op: op.to_string(),
                message: ack_message(&ack),
            })
        }
    }

    /// Validates, projects, and submits a new monitor, then fetches the
    /// authoritative record under its assigned identifier.
    pub async fn add_monitor(&self, config: MonitorConfig) -> Result<Monitor, ClientError> {
        let map = config.into_map();
        validate(&map)?;
        let mut payload = project(map);
        apply_create_defaults(&mut payload);

        let ack = self.call("add", Value::Object(payload)).await?;
        let id = ack
            .get("monitorID")
            .and_then(Value::as_i64)
            .ok_or_else(|| ClientError::Operation {
                op: "add".to_string(),
                message: "acknowledgment did not carry a monitor id".to_string(),
            })?;
        info!(id, "monitor created");
        self.get_monitor(id).await
    }

    pub async fn get_monitor(&self, id: i64) -> Result<Monitor, ClientError> {
        let ack = self.call("getMonitor", json!(id)).await?;
        let record = ack
            .get("monitor")
            .cloned()
            .ok_or_else(|| ClientError::Operation {
                op: "getMonitor".to_string(),
                message: format!("no monitor record in acknowledgment for id {id}"),
            })?;
        Ok(Monitor(record))
    }

    /// Read-modify-write update: fetch the current record, shallow-merge the
    /// projected partial over it, submit, then re-fetch. The re-fetched state
    /// is the only thing ever reported as success; if that final fetch fails,
    /// the whole update fails.
    pub async fn update_monitor(
        &self,
        id: i64,
        partial: MonitorConfig,
    ) -> Result<Monitor, ClientError> {
        let map = partial.into_map();
        validate(&map)?;
        let patch = project(map);

        let current = self.get_monitor(id).await?;
        let mut merged = match current.0 {
            Value::Object(map) => map,
            other => {
                let mut map = JsonMap::new();
                warn!(id, "current record is not an object: {other}");
                map
            }
        };
        for (key, value) in patch {
            merged.insert(key, value);
        }
        merged.insert("id".to_string(), json!(id));

        self.call("editMonitor", Value::Object(merged)).await?;
        self.get_monitor(id).await
    }

    pub async fn remove_monitor(&self, id: i64) -> Result<(), ClientError> {
        self.call("deleteMonitor", json!(id)).await?;
        info!(id, "monitor removed");
        Ok(())
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<(), ClientError> {
        let op = if active {
            "resumeMonitor"
        } else {
            "pauseMonitor"
        };
        self.call(op, json!(id)).await?;
        info!(id, active, "monitor active state changed");
        Ok(())
    }

    /// Fetches the full collection. The list request's acknowledgment only
    /// confirms acceptance; the collection itself arrives as a separate push
    /// event, reconciled here against a bounded deadline. The push listener
    /// is deregistered by guard drop on whichever exit path fires.
    pub async fn list_monitors(&self) -> Result<Vec<Monitor>, ClientError> {
        self.authenticate().await?;

        let mut listener = self.transport.subscribe(LIST_EVENT);
        let emit = self.transport.emit("getMonitorList", Value::Null);
        tokio::pin!(emit);
        let deadline = tokio::time::sleep(LIST_TIMEOUT);
        tokio::pin!(deadline);
        let mut accepted = false;

        loop {
            tokio::select! {
                ack = &mut emit, if !accepted => {
                    let ack = ack?;
                    if !ack_ok(&ack) {
                        return Err(ClientError::Operation {
                            op: "getMonitorList".to_string(),
                            message: ack_message(&ack),
                        });
                    }
                    accepted = true;
                }
                push = listener.recv() => {
                    let payload = push.ok_or(ClientError::Connection(TransportError::Closed))?;
                    return Ok(collect_monitors(payload));
                }
                _ = &mut deadline => {
                    return Err(ClientError::Timeout {
                        event: LIST_EVENT.to_string(),
                    });
                }
            }
        }
    }

    /// Name search over the fetched collection: case-insensitive substring in
    /// plain mode, case-insensitive pattern in regex mode. A malformed
    /// pattern fails the whole operation.
    pub async fn find_monitors(
        &self,
        term: &str,
        use_regex: bool,
    ) -> Result<Vec<MonitorSummary>, ClientError> {
        let monitors = self.list_monitors().await?;

        let matches: Vec<MonitorSummary> = if use_regex {
            let pattern = RegexBuilder::new(term).case_insensitive(true).build()?;
            monitors
                .iter()
                .filter(|m| m.name().is_some_and(|name| pattern.is_match(name)))
                .map(Monitor::summary)
                .collect()
        } else {
            let needle = term.to_lowercase();
            monitors
                .iter()
                .filter(|m| {
                    m.name()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
                })
                .map(Monitor::summary)
                .collect()
        };

        debug!(term, use_regex, count = matches.len(), "search finished");
        Ok(matches)
    }
}

fn ack_ok(ack: &Value) -> bool {
    ack.get("ok").and_then(Value::as_bool).unwrap_or(false)
}

fn ack_message(ack: &Value) -> String {
    ack.get("msg")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string()
}

/// Flattens the pushed id-to-record mapping, keeping arrival order.
fn collect_monitors(payload: Value) -> Vec<Monitor> {
    match payload {
        Value::Object(map) => map.into_iter().map(|(_, record)| Monitor(record)).collect(),
        Value::Array(items) => items.into_iter().map(Monitor).collect(),
        _ => Vec::new(),
    }
}
