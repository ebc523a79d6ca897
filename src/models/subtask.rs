use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::task::{end_time, Status, TaskId};

/// A unit of work that belongs to exactly one [`Epic`](super::Epic).
///
/// The `epic_id` must name a live epic whenever the subtask is stored, and a
/// subtask can never point at its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: TaskId,
    pub epic_id: TaskId,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub start_time: Option<NaiveDateTime>,
    /// Length of the work in whole minutes.
    pub duration_minutes: Option<i64>,
}

impl Subtask {
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration_minutes)
    }
}

/// Input for creating a subtask, or for replacing an existing one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskInput {
    pub epic_id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

impl SubtaskInput {
    pub fn new(epic_id: TaskId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            epic_id,
            title: title.into(),
            description: description.into(),
            status: Status::New,
            start_time: None,
            duration_minutes: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn scheduled(mut self, start_time: NaiveDateTime, duration_minutes: i64) -> Self {
        self.start_time = Some(start_time);
        self.duration_minutes = Some(duration_minutes);
        self
    }

    pub(crate) fn into_subtask(self, id: TaskId) -> Subtask {
        Subtask {
            id,
            epic_id: self.epic_id,
            title: self.title,
            description: self.description,
            status: self.status,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
        }
    }

    pub(crate) fn matches(&self, subtask: &Subtask) -> bool {
        self.epic_id == subtask.epic_id
            && self.title == subtask.title
            && self.description == subtask.description
            && self.start_time == subtask.start_time
            && self.duration_minutes == subtask.duration_minutes
    }
}
