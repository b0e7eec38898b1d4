//! Tree module: task/node reconstruction from event notifications.

pub mod details;
pub mod model;
pub mod reducer;
pub mod builder;

pub use builder::build_tasks;
pub use details::{Details, EventKind, EventPhase, EventScope};
pub use model::{NextItem, NodeInfo, NodeStatus, RecognitionAttempt, TaskInfo, TaskStatus};
pub use reducer::TaskReducer;
