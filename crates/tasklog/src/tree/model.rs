use std::sync::Arc;
use serde::Serialize;
use serde_json::Value;

use crate::parser::model::EventNotification;
use super::details::duration_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed,
}

/// Outcome of a node or a recognition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Success,
    Failed,
}

/// One candidate successor considered after a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextItem {
    pub name: String,
    pub anchor: bool,
    pub jump_back: bool,
}

impl NextItem {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            anchor: false,
            jump_back: false,
        }
    }
}

/// One recognition try. Nested sub-recognitions share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionAttempt {
    pub reco_id: Option<i64>,
    pub name: String,
    pub timestamp: Arc<str>,
    pub status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_box: Option<[i64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reco_details: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_nodes: Vec<RecognitionAttempt>,
}

/// One committed pipeline step. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub node_id: Option<i64>,
    pub name: String,
    pub timestamp: Arc<str>,
    pub status: NodeStatus,
    pub task_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reco_details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Value>,
    pub next_list: Vec<NextItem>,
    pub recognition_attempts: Vec<RecognitionAttempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    pub task_id: i64,
    pub entry: String,
    pub hash: String,
    pub uuid: String,
    pub start_time: Arc<str>,
    pub end_time: Option<Arc<str>>,
    pub status: TaskStatus,
    /// Milliseconds, present once both timestamps parse
    pub duration: Option<i64>,
    pub nodes: Vec<NodeInfo>,
    /// Start and terminal events that shaped this task
    pub events: Vec<EventNotification>,
}

impl TaskInfo {
    /// Build a running task from its `Task.Starting` event.
    pub fn starting(task_id: i64, event: &EventNotification) -> Self {
        let fields = event.fields();
        Self {
            task_id,
            entry: fields.entry().unwrap_or_default().to_string(),
            hash: fields.hash().unwrap_or_default().to_string(),
            uuid: fields.uuid().unwrap_or_default().to_string(),
            start_time: Arc::clone(&event.timestamp),
            end_time: None,
            status: TaskStatus::Running,
            duration: None,
            nodes: Vec::new(),
            events: vec![event.clone()],
        }
    }

    /// Apply a terminal event.
    pub fn finish(&mut self, event: &EventNotification, status: TaskStatus) {
        self.status = status;
        self.end_time = Some(Arc::clone(&event.timestamp));
        self.duration = duration_ms(&self.start_time, &event.timestamp);
        self.events.push(event.clone());
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }
}
