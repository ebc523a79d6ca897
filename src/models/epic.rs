use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::task::{Status, TaskId};

/// A container of subtasks.
///
/// Only `title` and `description` belong to the epic itself. `status`,
/// `start_time`, `duration_minutes` and `end_time` are recomputed from the
/// subtasks every time one of them is added, changed or removed, so any value
/// written into them directly is overwritten on the next pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: Status,
    /// Earliest subtask start time.
    pub start_time: Option<NaiveDateTime>,
    /// Sum of subtask durations, absent while the epic has no subtasks.
    pub duration_minutes: Option<i64>,
    /// Latest subtask end time.
    pub end_time: Option<NaiveDateTime>,
    /// Subtask ids in the order they were attached.
    pub subtask_ids: Vec<TaskId>,
}

/// Input for creating an epic, or for renaming an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl EpicInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub(crate) fn into_epic(self, id: TaskId) -> Epic {
        Epic {
            id,
            title: self.title,
            description: self.description,
            status: Status::New,
            start_time: None,
            duration_minutes: None,
            end_time: None,
            subtask_ids: Vec::new(),
        }
    }

    pub(crate) fn matches(&self, epic: &Epic) -> bool {
        self.title == epic.title && self.description == epic.description
    }
}
