use std::collections::HashMap;

use crate::parser::model::EventNotification;
use super::details::{EventPhase, EventScope};
use super::model::{TaskInfo, TaskStatus};
use super::reducer::TaskReducer;

/// Reconstruct the task → node tree from an ordered event stream.
///
/// Tasks are returned in start order. Each task's nodes come from reducing
/// the events between its `Task.Starting` and its terminal event (or the end
/// of the stream for tasks that never finish).
pub fn build_tasks(events: &[EventNotification]) -> Vec<TaskInfo> {
    let mut tasks: Vec<TaskInfo> = Vec::new();
    let mut spans: Vec<(usize, Option<usize>)> = Vec::new();
    let mut live: HashMap<i64, usize> = HashMap::new();

    for (pos, event) in events.iter().enumerate() {
        let kind = event.kind();
        if kind.scope != EventScope::Task {
            continue;
        }
        let Some(task_id) = event.fields().task_id() else {
            tracing::trace!(line = event.line_index, event = %event.message, "task event without task_id ignored");
            continue;
        };

        match kind.phase {
            EventPhase::Starting => {
                if let Some(prev) = live.insert(task_id, tasks.len()) {
                    tracing::warn!(task_id, line = event.line_index, "task id restarted, later events go to the new task");
                    // The abandoned run keeps only what came before the restart
                    spans[prev].1 = Some(pos - 1);
                }
                tasks.push(TaskInfo::starting(task_id, event));
                spans.push((pos, None));
            }
            EventPhase::Succeeded | EventPhase::Failed => {
                let status = if kind.phase == EventPhase::Failed {
                    TaskStatus::Failed
                } else {
                    TaskStatus::Succeeded
                };
                match live.remove(&task_id) {
                    Some(slot) => {
                        tasks[slot].finish(event, status);
                        spans[slot].1 = Some(pos);
                    }
                    None => {
                        tracing::trace!(task_id, line = event.line_index, "terminal event for unknown task ignored");
                    }
                }
            }
            EventPhase::Other => {}
        }
    }

    for (task, (start, end)) in tasks.iter_mut().zip(spans) {
        let end = end.unwrap_or(events.len().saturating_sub(1));
        let mut reducer = TaskReducer::new(task.task_id);
        for event in &events[start..=end] {
            reducer.step(event);
        }
        task.nodes = reducer.into_nodes();
    }

    tracing::debug!(
        tasks = tasks.len(),
        events = events.len(),
        "task tree rebuilt"
    );

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::model::NodeStatus;
    use crate::tree::reducer::tests::event;
    use serde_json::json;

    #[test]
    fn test_single_task_single_node() {
        let events = vec![
            event("Tasker.Task.Starting", "2024-05-01 10:00:00.000", json!({"task_id": 1, "entry": "Main", "hash": "h", "uuid": "u"})),
            event("Node.PipelineNode.Succeeded", "2024-05-01 10:00:00.500", json!({"task_id": 1, "node_details": {"name": "A"}})),
            event("Tasker.Task.Succeeded", "2024-05-01 10:00:01.000", json!({"task_id": 1})),
        ];
        let tasks = build_tasks(&events);

        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.entry, "Main");
        assert_eq!(task.nodes.len(), 1);
        assert_eq!(task.nodes[0].name, "A");
        assert_eq!(task.nodes[0].task_id, task.task_id);
        assert_eq!(task.duration, Some(1000));
        assert!(task.duration.unwrap() >= 0);
        assert_eq!(task.events.len(), 2);
        assert_eq!(task.end_time.as_deref(), Some("2024-05-01 10:00:01.000"));
    }

    #[test]
    fn test_failed_task() {
        let events = vec![
            event("Tasker.Task.Starting", "2024-05-01 10:00:00.000", json!({"task_id": 4})),
            event("Node.PipelineNode.Failed", "2024-05-01 10:00:00.100", json!({"task_id": 4, "name": "X"})),
            event("Tasker.Task.Failed", "2024-05-01 10:00:00.200", json!({"task_id": 4})),
        ];
        let tasks = build_tasks(&events);
        assert_eq!(tasks[0].status, TaskStatus::Failed);
        assert_eq!(tasks[0].nodes[0].status, NodeStatus::Failed);
        assert_eq!(tasks[0].duration, Some(200));
    }

    #[test]
    fn test_unterminated_task_stays_running() {
        let events = vec![
            event("Tasker.Task.Starting", "t0", json!({"task_id": 1})),
            event("Node.PipelineNode.Succeeded", "t1", json!({"task_id": 1, "name": "A"})),
            event("Node.Recognition.Succeeded", "t2", json!({"task_id": 1, "name": "dangling"})),
        ];
        let tasks = build_tasks(&events);
        assert!(tasks[0].is_running());
        assert_eq!(tasks[0].end_time, None);
        assert_eq!(tasks[0].duration, None);
        assert_eq!(tasks[0].nodes.len(), 1);
    }

    #[test]
    fn test_events_for_unknown_tasks_are_ignored() {
        let events = vec![
            event("Tasker.Task.Succeeded", "t0", json!({"task_id": 9})),
            event("Node.PipelineNode.Succeeded", "t1", json!({"task_id": 9, "name": "Orphan"})),
            event("Tasker.Task.Starting", "t2", json!({})),
        ];
        assert!(build_tasks(&events).is_empty());
    }

    #[test]
    fn test_events_outside_task_window_are_excluded() {
        let events = vec![
            event("Node.PipelineNode.Succeeded", "t0", json!({"task_id": 1, "name": "Before"})),
            event("Tasker.Task.Starting", "t1", json!({"task_id": 1})),
            event("Node.PipelineNode.Succeeded", "t2", json!({"task_id": 1, "name": "Inside"})),
            event("Tasker.Task.Succeeded", "t3", json!({"task_id": 1})),
            event("Node.PipelineNode.Succeeded", "t4", json!({"task_id": 1, "name": "After"})),
        ];
        let tasks = build_tasks(&events);
        let names: Vec<_> = tasks[0].nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Inside"]);
    }

    #[test]
    fn test_interleaved_tasks_stay_isolated() {
        let events = vec![
            event("Tasker.Task.Starting", "t0", json!({"task_id": 1})),
            event("Tasker.Task.Starting", "t1", json!({"task_id": 2})),
            event("Node.RecognitionNode.Succeeded", "t2", json!({"task_id": 2, "name": "NestedOf2"})),
            event("Node.Recognition.Succeeded", "t3", json!({"task_id": 2, "name": "RecoOf2"})),
            event("Node.Recognition.Succeeded", "t4", json!({"task_id": 1, "name": "RecoOf1"})),
            event("Node.PipelineNode.Succeeded", "t5", json!({"task_id": 1, "name": "NodeOf1"})),
            event("Node.PipelineNode.Succeeded", "t6", json!({"task_id": 2, "name": "NodeOf2"})),
            event("Tasker.Task.Succeeded", "t7", json!({"task_id": 1})),
            event("Tasker.Task.Succeeded", "t8", json!({"task_id": 2})),
        ];
        let tasks = build_tasks(&events);
        assert_eq!(tasks.len(), 2);

        let node1 = &tasks[0].nodes[0];
        assert_eq!(node1.name, "NodeOf1");
        let names1: Vec<_> = node1.recognition_attempts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names1, vec!["RecoOf1"]);
        assert!(node1.recognition_attempts[0].nested_nodes.is_empty());

        let node2 = &tasks[1].nodes[0];
        assert_eq!(node2.name, "NodeOf2");
        assert_eq!(node2.recognition_attempts.len(), 1);
        assert_eq!(node2.recognition_attempts[0].name, "RecoOf2");
        assert_eq!(node2.recognition_attempts[0].nested_nodes[0].name, "NestedOf2");

        for task in &tasks {
            for node in &task.nodes {
                assert_eq!(node.task_id, task.task_id);
            }
        }
    }

    #[test]
    fn test_restarted_task_id_keeps_both_tasks() {
        let events = vec![
            event("Tasker.Task.Starting", "t0", json!({"task_id": 1, "entry": "First"})),
            event("Node.PipelineNode.Succeeded", "t1", json!({"task_id": 1, "name": "OnlyOfFirst"})),
            event("Tasker.Task.Starting", "t2", json!({"task_id": 1, "entry": "Second"})),
            event("Node.PipelineNode.Succeeded", "t3", json!({"task_id": 1, "name": "OnlyOfSecond"})),
            event("Tasker.Task.Succeeded", "t4", json!({"task_id": 1})),
        ];
        let tasks = build_tasks(&events);
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].is_running());
        assert_eq!(tasks[1].entry, "Second");
        assert_eq!(tasks[1].status, TaskStatus::Succeeded);

        let first: Vec<_> = tasks[0].nodes.iter().map(|n| n.name.as_str()).collect();
        let second: Vec<_> = tasks[1].nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(first, vec!["OnlyOfFirst"]);
        assert_eq!(second, vec!["OnlyOfSecond"]);
    }

    #[test]
    fn test_restart_right_after_start_leaves_first_empty() {
        let events = vec![
            event("Tasker.Task.Starting", "t0", json!({"task_id": 1, "entry": "First"})),
            event("Tasker.Task.Starting", "t1", json!({"task_id": 1, "entry": "Second"})),
            event("Node.PipelineNode.Succeeded", "t2", json!({"task_id": 1, "name": "OnlyOfSecond"})),
            event("Tasker.Task.Succeeded", "t3", json!({"task_id": 1})),
        ];
        let tasks = build_tasks(&events);
        assert!(tasks[0].nodes.is_empty());
        assert_eq!(tasks[1].nodes.len(), 1);
    }

    #[test]
    fn test_id_reused_after_finish() {
        let events = vec![
            event("Tasker.Task.Starting", "t0", json!({"task_id": 5})),
            event("Node.PipelineNode.Succeeded", "t1", json!({"task_id": 5, "name": "A"})),
            event("Tasker.Task.Succeeded", "t2", json!({"task_id": 5})),
            event("Tasker.Task.Starting", "t3", json!({"task_id": 5})),
            event("Node.PipelineNode.Failed", "t4", json!({"task_id": 5, "name": "B"})),
            event("Tasker.Task.Failed", "t5", json!({"task_id": 5})),
            event("Tasker.Task.Succeeded", "t6", json!({"task_id": 5})),
        ];
        let tasks = build_tasks(&events);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].status, TaskStatus::Succeeded);
        assert_eq!(tasks[0].end_time.as_deref(), Some("t2"));
        assert_eq!(tasks[0].nodes.len(), 1);
        assert_eq!(tasks[0].nodes[0].name, "A");
        assert_eq!(tasks[1].status, TaskStatus::Failed);
        assert_eq!(tasks[1].end_time.as_deref(), Some("t5"));
        assert_eq!(tasks[1].nodes.len(), 1);
        assert_eq!(tasks[1].nodes[0].name, "B");
    }

    #[test]
    fn test_empty_stream() {
        assert!(build_tasks(&[]).is_empty());
    }
}
