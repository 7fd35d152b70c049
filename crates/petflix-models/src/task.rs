//! Generation task state machine.

use serde::{Deserialize, Serialize};

use crate::clip::ClipResult;

/// Remote generation task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task accepted by the API but not yet scheduled
    #[default]
    Created,
    /// Waiting for upstream capacity
    Queued,
    /// Generation in progress
    Processing,
    /// Finished with a downloadable clip
    Succeeded,
    /// Finished without output
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Created => "created",
            TaskState::Queued => "queued",
            TaskState::Processing => "processing",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a remote generation task.
///
/// Created per scene per run and discarded once its clip result is
/// extracted or it fails terminally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Task id assigned by the generation API
    pub id: String,
    pub state: TaskState,
    /// Present once the task has succeeded
    pub result: Option<ClipResult>,
    /// Upstream error code/message when the task failed
    pub error: Option<String>,
}

impl GenerationTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: TaskState::Created,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipDuration;

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Created.is_terminal());
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
        assert!(TaskState::Succeeded.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn test_new_task_has_no_result() {
        let task = GenerationTask::new("task-1");
        assert_eq!(task.state, TaskState::Created);
        assert!(task.result.is_none());
        assert!(!task.is_terminal());

        let done = GenerationTask {
            state: TaskState::Succeeded,
            result: Some(ClipResult::new("https://cdn/a.mp4", ClipDuration::Estimated(4.0))),
            ..task
        };
        assert!(done.is_terminal());
    }
}
