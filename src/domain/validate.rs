use super::monitor::MonitorType;
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

/// Input failed the schema or a type-specific required-field rule.
///
/// Validation is all-or-nothing per record: every problem is collected before
/// failing, so the caller sees the full list at once.
#[derive(Debug, Error)]
#[error("{}", problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

/// Attributes that must be present, beyond `name` and `type`, before a
/// configuration of the given type may be sent to the remote service.
pub fn required_fields(kind: MonitorType) -> &'static [&'static str] {
    match kind {
        MonitorType::Http | MonitorType::RealBrowser => &["url"],
        MonitorType::Keyword => &["url", "keyword"],
        MonitorType::JsonQuery => &["url", "jsonPath", "expectedValue"],
        MonitorType::GrpcKeyword => &["grpcUrl", "keyword"],
        MonitorType::Port => &["hostname", "port"],
        MonitorType::Ping | MonitorType::TailscalePing | MonitorType::Dns => &["hostname"],
        MonitorType::Docker => &["dockerContainer", "dockerHost"],
        MonitorType::Push | MonitorType::Group => &[],
    }
}

fn is_unset(payload: &JsonMap<String, Value>, field: &str) -> bool {
    matches!(payload.get(field), None | Some(Value::Null))
}

/// Checks a candidate configuration against the required-field table for its
/// declared type.
///
/// A payload without a `type` attribute is a partial update; type-specific
/// requirements cannot be resolved for it and are skipped entirely.
pub fn validate(payload: &JsonMap<String, Value>) -> Result<(), ValidationError> {
    let declared = match payload.get("type") {
        None | Some(Value::Null) => return Ok(()),
        Some(value) => value,
    };

    let kind = match declared.as_str().and_then(MonitorType::parse) {
        Some(kind) => kind,
        None => {
            return Err(ValidationError {
                problems: vec![format!("unknown monitor type {declared}")],
            });
        }
    };

    let mut problems = Vec::new();
    for field in required_fields(kind) {
        if is_unset(payload, field) {
            problems.push(format!(
                "missing required field '{field}' for type '{kind}'"
            ));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { problems })
    }
}
