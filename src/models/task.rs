use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identifier shared by tasks, epics and subtasks.
///
/// Issued by the manager's allocator, starting at 1. `0` is never a valid id.
pub type TaskId = u64;

/// A standalone unit of work.
///
/// A task is placed on the schedule when it carries a `start_time`. Its time
/// window is `[start_time, start_time + duration)`, and only tasks with both
/// fields set take part in conflict checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub start_time: Option<NaiveDateTime>,
    /// Length of the work in whole minutes.
    pub duration_minutes: Option<i64>,
}

impl Task {
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration_minutes)
    }
}

/// The progress status shared by every entity kind.
///
/// - `New`: Not started
/// - `InProgress`: Started, or a mix of finished and unfinished subtasks
/// - `Done`: Finished
///
/// Tasks and subtasks may move between any two statuses. An epic's status is
/// always derived from its subtasks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "IN_PROGRESS" => Some(Self::InProgress),
            "DONE" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Input for creating a task, or for replacing an existing one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
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

impl TaskInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
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

    pub(crate) fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
        }
    }

    /// Whether `task` already holds the same content as this input.
    pub(crate) fn matches(&self, task: &Task) -> bool {
        self.title == task.title
            && self.description == task.description
            && self.start_time == task.start_time
            && self.duration_minutes == task.duration_minutes
    }
}

/// End of a time window, present only when both start and duration are set
/// and the end is representable.
pub(crate) fn end_time(
    start_time: Option<NaiveDateTime>,
    duration_minutes: Option<i64>,
) -> Option<NaiveDateTime> {
    let start = start_time?;
    let duration = Duration::try_minutes(duration_minutes?)?;
    start.checked_add_signed(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn end_time_adds_duration_to_start() {
        let task = TaskInput::new("Write report", "Quarterly").scheduled(at(9, 0), 90).into_task(1);
        assert_eq!(task.end_time(), Some(at(10, 30)));
    }

    #[test]
    fn end_time_is_absent_without_duration() {
        let mut task = TaskInput::new("Write report", "Quarterly").into_task(1);
        task.start_time = Some(at(9, 0));
        assert_eq!(task.end_time(), None);
    }

    #[test]
    fn end_time_is_absent_when_out_of_range() {
        assert_eq!(end_time(Some(at(9, 0)), Some(i64::MAX)), None);
        assert_eq!(end_time(Some(at(9, 0)), Some(i64::MIN)), None);
    }

    #[test]
    fn status_strings_are_screaming_snake_case() {
        for status in [Status::New, Status::InProgress, Status::Done] {
            assert_eq!(Status::from_str(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(Status::from_str("in_progress"), None);
    }
}
