use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Kinds of monitored resources understood by the remote service.
///
/// The wire value discriminates which other configuration attributes are
/// meaningful; see [`crate::domain::validate`] and [`crate::domain::project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorType {
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "port")]
    Port,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "keyword")]
    Keyword,
    #[serde(rename = "json-query")]
    JsonQuery,
    #[serde(rename = "grpc-keyword")]
    GrpcKeyword,
    #[serde(rename = "dns")]
    Dns,
    #[serde(rename = "docker")]
    Docker,
    #[serde(rename = "real-browser")]
    RealBrowser,
    #[serde(rename = "tailscale-ping")]
    TailscalePing,
    #[serde(rename = "push")]
    Push,
    #[serde(rename = "group")]
    Group,
}

impl MonitorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorType::Http => "http",
            MonitorType::Port => "port",
            MonitorType::Ping => "ping",
            MonitorType::Keyword => "keyword",
            MonitorType::JsonQuery => "json-query",
            MonitorType::GrpcKeyword => "grpc-keyword",
            MonitorType::Dns => "dns",
            MonitorType::Docker => "docker",
            MonitorType::RealBrowser => "real-browser",
            MonitorType::TailscalePing => "tailscale-ping",
            MonitorType::Push => "push",
            MonitorType::Group => "group",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(Value::String(value.to_string())).ok()
    }
}

impl std::fmt::Display for MonitorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One monitored resource's configuration, as accepted from tool-call
/// arguments. Everything except `name` and `type` is optional; which optional
/// attributes actually matter depends on `type`.
///
/// `None` is the unset marker throughout: unset attributes are never
/// serialized, never validated, and never transmitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MonitorType>,

    // Connection target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_url: Option<String>,

    // Scheduling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resend_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxretries: Option<u32>,

    // HTTP semantics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert_keyword: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_status_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redirects: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth_pass: Option<String>,

    // DNS / Docker probes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_resolve_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_resolve_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_host: Option<i64>,

    // Network probe semantics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_packets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_ping_timeout: Option<u32>,

    // Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upside_down: Option<bool>,
    #[serde(rename = "notificationIDList", skip_serializing_if = "Option::is_none")]
    pub notification_id_list: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
}

impl MonitorConfig {
    /// Serializes to a JSON object with every unset attribute already absent.
    pub fn into_map(self) -> JsonMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => JsonMap::new(),
        }
    }
}

/// A monitor as the remote service reports it: the configuration plus the
/// remote-assigned identifier and whatever defaults the service filled in.
/// Kept as raw JSON since the service is the system of record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor(pub Value);

impl Monitor {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn summary(&self) -> MonitorSummary {
        let field = |key: &str| self.0.get(key).cloned().unwrap_or(Value::Null);
        MonitorSummary {
            id: self.id(),
            name: self.name().map(ToOwned::to_owned),
            url: field("url"),
            description: field("description"),
            kind: field("type"),
            path_name: field("pathName"),
            hostname: field("hostname"),
            port: field("port"),
            active: field("active"),
        }
    }
}

/// Reduced projection of a [`Monitor`], used only as name-search output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSummary {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub url: Value,
    pub description: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    pub path_name: Value,
    pub hostname: Value,
    pub port: Value,
    pub active: Value,
}
