//! Per-task reducer for the node reconstruction state machine.
//!
//! Node boundaries come from `PipelineNode` completion events. Recognition and
//! next-list events are loose until a `PipelineNode` event for the same task
//! claims them:
//!
//! ```text
//! Recognition* (each may carry buffered RecognitionNode*) -> NextList -> PipelineNode
//! ```

use std::mem;
use std::sync::Arc;

use crate::parser::model::EventNotification;
use super::details::{EventKind, EventPhase, EventScope};
use super::model::{NextItem, NodeInfo, NodeStatus, RecognitionAttempt};

/// State carried while reducing the events of one task.
#[derive(Debug, Clone, Default)]
pub struct TaskReducer {
    task_id: i64,
    current_next_list: Vec<NextItem>,
    pending_attempts: Vec<RecognitionAttempt>,
    pending_nested: Vec<RecognitionAttempt>,
    nodes: Vec<NodeInfo>,
}

impl TaskReducer {
    pub fn new(task_id: i64) -> Self {
        Self {
            task_id,
            ..Default::default()
        }
    }

    /// Advance the state machine by one event.
    pub fn step(&mut self, event: &EventNotification) {
        let kind = event.kind();
        let event_task = event.fields().task_id();
        let owned = event_task == Some(self.task_id);

        match kind.scope {
            EventScope::NextList => {
                if owned && matches!(kind.phase, EventPhase::Starting | EventPhase::Succeeded) {
                    self.current_next_list = event.fields().next_list();
                }
            }
            EventScope::RecognitionNode => {
                // Nested records without a task id are assumed to belong to the reduced task
                if kind.is_terminal() && event_task.map_or(true, |id| id == self.task_id) {
                    self.pending_nested.push(attempt_from(event, kind));
                }
            }
            EventScope::Recognition => {
                if !owned {
                    if !self.pending_nested.is_empty() {
                        tracing::trace!(
                            task_id = self.task_id,
                            other = ?event_task,
                            dropped = self.pending_nested.len(),
                            "recognition from another task, dropping buffered nested records"
                        );
                    }
                    self.pending_nested.clear();
                } else if kind.is_terminal() {
                    let mut attempt = attempt_from(event, kind);
                    attempt.nested_nodes = mem::take(&mut self.pending_nested);
                    self.pending_attempts.push(attempt);
                }
            }
            EventScope::PipelineNode => {
                if owned && kind.is_terminal() {
                    self.close_node(event, kind);
                }
            }
            _ => {}
        }
    }

    fn close_node(&mut self, event: &EventNotification, kind: EventKind) {
        let fields = event.fields();
        let node = NodeInfo {
            node_id: fields.node_id(),
            name: fields.node_name().unwrap_or_default().to_string(),
            timestamp: Arc::clone(&event.timestamp),
            status: status_of(kind),
            task_id: self.task_id,
            reco_details: fields.reco_details().cloned(),
            action_details: fields.action_details().cloned(),
            focus: fields.focus().cloned(),
            next_list: self.current_next_list.clone(),
            recognition_attempts: mem::take(&mut self.pending_attempts),
        };
        self.nodes.push(node);
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub fn current_next_list(&self) -> &[NextItem] {
        &self.current_next_list
    }

    pub fn pending_attempts(&self) -> &[RecognitionAttempt] {
        &self.pending_attempts
    }

    pub fn pending_nested(&self) -> &[RecognitionAttempt] {
        &self.pending_nested
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<NodeInfo> {
        self.nodes
    }
}

fn status_of(kind: EventKind) -> NodeStatus {
    match kind.phase {
        EventPhase::Failed => NodeStatus::Failed,
        _ => NodeStatus::Success,
    }
}

fn attempt_from(event: &EventNotification, kind: EventKind) -> RecognitionAttempt {
    let fields = event.fields();
    RecognitionAttempt {
        reco_id: fields.reco_id(),
        name: fields.name().unwrap_or_default().to_string(),
        timestamp: Arc::clone(&event.timestamp),
        status: status_of(kind),
        algorithm: fields.algorithm().map(str::to_string),
        hit_box: fields.hit_box(),
        reco_details: fields.reco_details().cloned(),
        nested_nodes: Vec::new(),
    }
}
