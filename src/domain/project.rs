use super::monitor::MonitorType;
use serde_json::{Map as JsonMap, Value, json};

/// Attributes accepted for every monitor type.
const COMMON_FIELDS: &[&str] = &[
    "id",
    "name",
    "type",
    "description",
    "parent",
    "interval",
    "retryInterval",
    "resendInterval",
    "maxretries",
    "active",
    "upsideDown",
    "notificationIDList",
    "conditions",
];

const HTTP_FIELDS: &[&str] = &[
    "url",
    "method",
    "headers",
    "body",
    "acceptedStatusCodes",
    "maxRedirects",
    "ignoreTls",
    "timeout",
    "expiryNotification",
    "authMethod",
    "basicAuthUser",
    "basicAuthPass",
];

/// Attributes accepted for the given type beyond [`COMMON_FIELDS`]. The remote
/// service rejects or misbehaves on attributes irrelevant to a type, so
/// anything outside this set is stripped before transmission.
fn extra_fields(kind: MonitorType) -> Vec<&'static str> {
    match kind {
        MonitorType::Http => HTTP_FIELDS.to_vec(),
        MonitorType::Keyword => {
            let mut fields = HTTP_FIELDS.to_vec();
            fields.extend_from_slice(&["keyword", "invertKeyword"]);
            fields
        }
        MonitorType::JsonQuery => {
            let mut fields = HTTP_FIELDS.to_vec();
            fields.extend_from_slice(&["jsonPath", "expectedValue"]);
            fields
        }
        MonitorType::RealBrowser => vec!["url", "timeout"],
        MonitorType::GrpcKeyword => vec!["grpcUrl", "keyword", "invertKeyword"],
        MonitorType::Port => vec!["hostname", "port", "timeout"],
        MonitorType::Ping => vec!["hostname", "packetSize", "maxPackets", "perPingTimeout"],
        MonitorType::TailscalePing => vec!["hostname", "perPingTimeout"],
        MonitorType::Dns => vec!["hostname", "port", "dnsResolveServer", "dnsResolveType"],
        MonitorType::Docker => vec!["dockerContainer", "dockerHost"],
        MonitorType::Push | MonitorType::Group => Vec::new(),
    }
}

/// Narrows a payload to the attribute set allowed for its declared type.
///
/// `id` is always preserved when present (it identifies which resource to
/// mutate) and unset (null) attributes are always dropped. A payload without a
/// `type` attribute is an untyped partial update: relevance cannot be judged,
/// so every defined attribute passes through unchanged.
pub fn project(payload: JsonMap<String, Value>) -> JsonMap<String, Value> {
    let kind = payload
        .get("type")
        .and_then(Value::as_str)
        .and_then(MonitorType::parse);

    let allowed = kind.map(extra_fields);

    payload
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .filter(|(key, _)| match &allowed {
            None => true,
            Some(extra) => {
                key == "id"
                    || COMMON_FIELDS.contains(&key.as_str())
                    || extra.contains(&key.as_str())
            }
        })
        .collect()
}

/// Fills in the attributes the remote service requires to be present on
/// create even when the caller did not specify them. Only meaningful for
/// payloads without an `id` (the create path).
pub fn apply_create_defaults(payload: &mut JsonMap<String, Value>) {
    if !payload.contains_key("notificationIDList") {
        payload.insert("notificationIDList".to_string(), json!({}));
    }
    if !payload.contains_key("acceptedStatusCodes") {
        payload.insert("acceptedStatusCodes".to_string(), json!(["200-299"]));
    }
    if !payload.contains_key("conditions") {
        payload.insert("conditions".to_string(), json!([]));
    }
}
