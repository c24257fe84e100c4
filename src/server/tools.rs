use crate::client::{ClientError, EventTransport, MonitorClient};
use crate::domain::{MonitorConfig, ValidationError};
use serde::Serialize;
use serde_json::{Map as JsonMap, Value, json};
use tracing::{debug, warn};

/// Result envelope for one tool call: text content plus an error flag. The
/// external protocol never sees a raw error beyond this.
#[derive(Debug, Serialize)]
pub struct CallToolResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl CallToolResult {
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent { kind: "text", text }],
            is_error: false,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: message,
            }],
            is_error: true,
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn text_content(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }
}

fn id_property() -> Value {
    json!({"type": "integer", "description": "Monitor id assigned by the remote service"})
}

/// JSON-schema properties shared by `add_monitor` and `update_monitor_by_id`.
fn config_properties() -> Value {
    json!({
        "name": {"type": "string", "description": "Display name of the monitor"},
        "type": {
            "type": "string",
            "description": "Monitor type; decides which other fields apply",
            "enum": [
                "http", "port", "ping", "keyword", "json-query", "grpc-keyword",
                "dns", "docker", "real-browser", "tailscale-ping", "push", "group"
            ]
        },
        "url": {"type": "string", "description": "Target URL (http family)"},
        "hostname": {"type": "string", "description": "Target host (port/ping/dns family)"},
        "port": {"type": "integer", "description": "Target port"},
        "grpcUrl": {"type": "string", "description": "gRPC endpoint"},
        "interval": {"type": "integer", "description": "Check interval in seconds"},
        "retryInterval": {"type": "integer", "description": "Retry interval in seconds"},
        "resendInterval": {"type": "integer", "description": "Notification resend interval"},
        "maxretries": {"type": "integer", "description": "Retries before marking down"},
        "method": {"type": "string", "description": "HTTP method"},
        "headers": {"type": "string", "description": "HTTP request headers as a JSON string"},
        "body": {"type": "string", "description": "HTTP request body"},
        "keyword": {"type": "string", "description": "Keyword to look for in the response"},
        "invertKeyword": {"type": "boolean", "description": "Invert the keyword match"},
        "jsonPath": {"type": "string", "description": "JSON path to evaluate against the response"},
        "expectedValue": {"type": "string", "description": "Expected value at jsonPath"},
        "acceptedStatusCodes": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Accepted HTTP status code ranges"
        },
        "maxRedirects": {"type": "integer", "description": "Maximum redirects to follow"},
        "ignoreTls": {"type": "boolean", "description": "Skip TLS certificate verification"},
        "timeout": {"type": "integer", "description": "Request timeout in seconds"},
        "expiryNotification": {"type": "boolean", "description": "Notify on certificate expiry"},
        "authMethod": {"type": "string", "description": "HTTP authentication method"},
        "basicAuthUser": {"type": "string", "description": "Basic auth username"},
        "basicAuthPass": {"type": "string", "description": "Basic auth password"},
        "dnsResolveServer": {"type": "string", "description": "Resolver to query"},
        "dnsResolveType": {"type": "string", "description": "DNS record type"},
        "dockerContainer": {"type": "string", "description": "Container name or id"},
        "dockerHost": {"type": "integer", "description": "Configured docker host id"},
        "packetSize": {"type": "integer", "description": "Ping packet size in bytes"},
        "maxPackets": {"type": "integer", "description": "Packets per ping check"},
        "perPingTimeout": {"type": "integer", "description": "Timeout per ping packet"},
        "description": {"type": "string", "description": "Free-form description"},
        "parent": {"type": "integer", "description": "Parent group monitor id"},
        "active": {"type": "boolean", "description": "Whether the monitor starts active"},
        "upsideDown": {"type": "boolean", "description": "Treat down as up and vice versa"},
        "notificationIDList": {"type": "object", "description": "Notification ids to attach"},
        "conditions": {"type": "array", "description": "Extra match conditions"}
    })
}

fn id_only_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"id": id_property()},
        "required": ["id"]
    })
}

/// The catalog served by `tools/list`; each tool maps 1:1 to a mediator
/// operation.
pub fn catalog() -> Vec<Value> {
    let mut update_properties = config_properties();
    if let Some(map) = update_properties.as_object_mut() {
        map.insert("id".to_string(), id_property());
    }

    vec![
        json!({
            "name": "add_monitor",
            "description": "Create a new monitor. Fields irrelevant to the chosen type are dropped.",
            "inputSchema": {
                "type": "object",
                "properties": config_properties(),
                "required": ["name", "type"]
            }
        }),
        json!({
            "name": "update_monitor_by_id",
            "description": "Update fields of an existing monitor and return its post-update state.",
            "inputSchema": {
                "type": "object",
                "properties": update_properties,
                "required": ["id"]
            }
        }),
        json!({
            "name": "remove_monitor_by_id",
            "description": "Delete a monitor.",
            "inputSchema": id_only_schema()
        }),
        json!({
            "name": "pause_monitor_by_id",
            "description": "Pause a monitor.",
            "inputSchema": id_only_schema()
        }),
        json!({
            "name": "resume_monitor_by_id",
            "description": "Resume a paused monitor.",
            "inputSchema": id_only_schema()
        }),
        json!({
            "name": "get_monitor_by_id",
            "description": "Fetch a single monitor.",
            "inputSchema": id_only_schema()
        }),
        json!({
            "name": "find_monitors_by_name",
            "description": "Search monitors by name, as a substring or a regular expression.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "searchTerm": {"type": "string", "description": "Text or pattern to match against names"},
                    "useRegex": {"type": "boolean", "description": "Interpret searchTerm as a case-insensitive regex", "default": false}
                },
                "required": ["searchTerm"]
            }
        }),
        json!({
            "name": "list_monitors",
            "description": "List every monitor known to the remote service.",
            "inputSchema": {"type": "object", "properties": {}}
        }),
    ]
}

/// Runs one tool call and funnels every failure into the `Error: <message>`
/// envelope.
pub async fn dispatch<T: EventTransport + 'static>(
    client: Option<&MonitorClient<T>>,
    name: &str,
    arguments: &JsonMap<String, Value>,
) -> CallToolResult {
    debug!(tool = name, "dispatching tool call");
    let outcome = match client {
        None => Err(ClientError::NotInitialized),
        Some(client) => run_tool(client, name, arguments).await,
    };

    match outcome {
        Ok(text) => CallToolResult::text(text),
        Err(err) => {
            warn!(tool = name, %err, "tool call failed");
            CallToolResult::error(format!("Error: {err}"))
        }
    }
}

async fn run_tool<T: EventTransport + 'static>(
    client: &MonitorClient<T>,
    name: &str,
    arguments: &JsonMap<String, Value>,
) -> Result<String, ClientError> {
    match name {
        "add_monitor" => {
            let config = parse_config(arguments.clone())?;
            let mut problems = Vec::new();
            if config.name.is_none() {
                problems.push("missing required argument 'name'".to_string());
            }
            if config.kind.is_none() {
                problems.push("missing required argument 'type'".to_string());
            }
            if !problems.is_empty() {
                return Err(ValidationError { problems }.into());
            }
            let monitor = client.add_monitor(config).await?;
            Ok(pretty(&monitor.0))
        }
        "update_monitor_by_id" => {
            let id = require_id(arguments)?;
            let mut fields = arguments.clone();
            fields.remove("id");
            let partial = parse_config(fields)?;
            let monitor = client.update_monitor(id, partial).await?;
            Ok(pretty(&monitor.0))
        }
        "remove_monitor_by_id" => {
            let id = require_id(arguments)?;
            client.remove_monitor(id).await?;
            Ok(format!("Monitor {id} removed."))
        }
        "pause_monitor_by_id" => {
            let id = require_id(arguments)?;
            client.set_active(id, false).await?;
            Ok(format!("Monitor {id} paused."))
        }
        "resume_monitor_by_id" => {
            let id = require_id(arguments)?;
            client.set_active(id, true).await?;
            Ok(format!("Monitor {id} resumed."))
        }
        "get_monitor_by_id" => {
            let id = require_id(arguments)?;
            let monitor = client.get_monitor(id).await?;
            Ok(pretty(&monitor.0))
        }
        "find_monitors_by_name" => {
            let term = arguments
                .get("searchTerm")
                .and_then(Value::as_str)
                .ok_or_else(|| missing_argument("searchTerm"))?;
            let use_regex = arguments
                .get("useRegex")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let summaries = client.find_monitors(term, use_regex).await?;
            Ok(pretty(
                &serde_json::to_value(summaries).unwrap_or(Value::Null),
            ))
        }
        "list_monitors" => {
            let monitors = client.list_monitors().await?;
            Ok(pretty(
                &serde_json::to_value(monitors).unwrap_or(Value::Null),
            ))
        }
        other => Err(ClientError::Operation {
            op: other.to_string(),
            message: "unknown tool".to_string(),
        }),
    }
}

fn parse_config(fields: JsonMap<String, Value>) -> Result<MonitorConfig, ClientError> {
    serde_json::from_value(Value::Object(fields)).map_err(|err| {
        ClientError::Validation(ValidationError {
            problems: vec![err.to_string()],
        })
    })
}

fn require_id(arguments: &JsonMap<String, Value>) -> Result<i64, ClientError> {
    arguments
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| missing_argument("id"))
}

fn missing_argument(name: &str) -> ClientError {
    ClientError::Validation(ValidationError {
        problems: vec![format!("missing required argument '{name}'")],
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
