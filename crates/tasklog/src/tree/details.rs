//! Event kinds and typed access to event payloads.
//!
//! Payloads stay opaque JSON; only the fields the tree builder reads are
//! decoded here, everything else passes through to the output untouched.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::parser::model::{EventNotification, Params};
use super::model::NextItem;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    Task,
    NextList,
    Recognition,
    RecognitionNode,
    PipelineNode,
    Action,
    ActionNode,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Starting,
    Succeeded,
    Failed,
    Other,
}

/// Decoded event name. `Tasker.Task.Starting` → (`Task`, `Starting`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKind {
    pub scope: EventScope,
    pub phase: EventPhase,
}

impl EventKind {
    /// Decode from the last two dot-separated segments of the event name.
    pub fn parse(name: &str) -> Self {
        let mut parts = name.rsplit('.');
        let phase = match parts.next() {
            Some("Starting") => EventPhase::Starting,
            Some("Succeeded") => EventPhase::Succeeded,
            Some("Failed") => EventPhase::Failed,
            _ => EventPhase::Other,
        };
        let scope = match parts.next() {
            Some("Task") => EventScope::Task,
            Some("NextList") => EventScope::NextList,
            Some("Recognition") => EventScope::Recognition,
            Some("RecognitionNode") => EventScope::RecognitionNode,
            Some("PipelineNode") => EventScope::PipelineNode,
            Some("Action") => EventScope::Action,
            Some("ActionNode") => EventScope::ActionNode,
            _ => EventScope::Other,
        };
        Self { scope, phase }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, EventPhase::Succeeded | EventPhase::Failed)
    }
}

impl EventNotification {
    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.message)
    }

    pub fn fields(&self) -> Details<'_> {
        Details::new(&self.details)
    }
}

/// Read-only typed view over an event payload.
#[derive(Debug, Clone, Copy)]
pub struct Details<'a> {
    map: &'a Params,
}

impl<'a> Details<'a> {
    pub fn new(map: &'a Params) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub fn task_id(&self) -> Option<i64> {
        self.get("task_id").and_then(as_id)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.str_field("name")
    }

    pub fn entry(&self) -> Option<&'a str> {
        self.str_field("entry")
    }

    pub fn hash(&self) -> Option<&'a str> {
        self.str_field("hash")
    }

    pub fn uuid(&self) -> Option<&'a str> {
        self.str_field("uuid")
    }

    /// Top-level `node_id`, falling back to `node_details.node_id`
    pub fn node_id(&self) -> Option<i64> {
        self.get("node_id")
            .and_then(as_id)
            .or_else(|| self.nested("node_details", "node_id").and_then(as_id))
    }

    /// Top-level `reco_id`, falling back to `reco_details.reco_id`
    pub fn reco_id(&self) -> Option<i64> {
        self.get("reco_id")
            .and_then(as_id)
            .or_else(|| self.nested("reco_details", "reco_id").and_then(as_id))
    }

    /// `node_details.name` preferred over the event's own `name`
    pub fn node_name(&self) -> Option<&'a str> {
        self.nested("node_details", "name")
            .and_then(Value::as_str)
            .or_else(|| self.name())
    }

    pub fn focus(&self) -> Option<&'a Value> {
        self.get("focus").filter(|v| !v.is_null())
    }

    pub fn reco_details(&self) -> Option<&'a Value> {
        self.get("reco_details").filter(|v| !v.is_null())
    }

    pub fn action_details(&self) -> Option<&'a Value> {
        self.get("action_details").filter(|v| !v.is_null())
    }

    /// `reco_details.algorithm`
    pub fn algorithm(&self) -> Option<&'a str> {
        self.nested("reco_details", "algorithm").and_then(Value::as_str)
    }

    /// `reco_details.box` as `[x, y, w, h]`
    pub fn hit_box(&self) -> Option<[i64; 4]> {
        let items = self.nested("reco_details", "box")?.as_array()?;
        if items.len() != 4 {
            return None;
        }
        let mut out = [0i64; 4];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_i64()?;
        }
        Some(out)
    }

    /// Candidate successors from `list`. Entries are bare names or
    /// `{name, anchor, jump_back}` objects; anything else is dropped.
    pub fn next_list(&self) -> Vec<NextItem> {
        let Some(items) = self.get("list").and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(NextItem::named(name)),
                Value::Object(obj) => {
                    let name = obj.get("name")?.as_str()?;
                    let flag = |key: &str| obj.get(key).and_then(Value::as_bool).unwrap_or(false);
                    Some(NextItem {
                        name: name.to_string(),
                        anchor: flag("anchor"),
                        jump_back: flag("jump_back"),
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    fn nested(&self, outer: &str, inner: &str) -> Option<&'a Value> {
        self.get(outer)?.as_object()?.get(inner)
    }
}

/// Ids arrive as numbers, occasionally as numeric strings.
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a log timestamp (local, no offset) or an RFC 3339 timestamp.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
}

/// Milliseconds from `start` to `end` when both parse.
pub fn duration_ms(start: &str, end: &str) -> Option<i64> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    Some((end - start).num_milliseconds())
}
