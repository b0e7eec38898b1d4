use std::sync::Arc;
use serde_json::Value;

use super::model::{EventNotification, LogLine, Params};
use super::EVENT_MARKER;

/// Lift an event notification out of a decomposed line.
///
/// Returns `None` when the marker is absent or the line carries no `msg`
/// parameter; both are ordinary skips. A missing or non-object `details`
/// parameter yields an empty payload.
pub fn extract_event(line: &LogLine) -> Option<EventNotification> {
    if !line.message.contains(EVENT_MARKER) {
        return None;
    }

    let message = match line.params.get("msg")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let details = match line.params.get("details") {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            tracing::debug!(
                line = line.line_index,
                event = %message,
                kind = json_kind(other),
                "event details are not an object, using empty payload"
            );
            Params::new()
        }
        None => Params::new(),
    };

    Some(EventNotification {
        timestamp: Arc::clone(&line.timestamp),
        level: Arc::clone(&line.level),
        message,
        details,
        line_index: line.line_index,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
