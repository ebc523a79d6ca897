use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::epic::Epic;
use super::subtask::Subtask;
use super::task::{Task, TaskId};

/// The three kinds of tracked work item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Task,
    Epic,
    Subtask,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Epic => "EPIC",
            Self::Subtask => "SUBTASK",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TASK" => Some(Self::Task),
            "EPIC" => Some(Self::Epic),
            "SUBTASK" => Some(Self::Subtask),
            _ => None,
        }
    }
}

/// Any stored work item, tagged by kind.
///
/// Used wherever kinds are mixed: the view history and the prioritized
/// schedule. Serializes with a `kind` field next to the record's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Entity {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl Entity {
    pub fn id(&self) -> TaskId {
        match self {
            Self::Task(t) => t.id,
            Self::Epic(e) => e.id,
            Self::Subtask(s) => s.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Task(_) => EntityKind::Task,
            Self::Epic(_) => EntityKind::Epic,
            Self::Subtask(_) => EntityKind::Subtask,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Task(t) => &t.title,
            Self::Epic(e) => &e.title,
            Self::Subtask(s) => &s.title,
        }
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Task(t) => t.start_time,
            Self::Epic(e) => e.start_time,
            Self::Subtask(s) => s.start_time,
        }
    }
}

impl From<Task> for Entity {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<Epic> for Entity {
    fn from(epic: Epic) -> Self {
        Self::Epic(epic)
    }
}

impl From<Subtask> for Entity {
    fn from(subtask: Subtask) -> Self {
        Self::Subtask(subtask)
    }
}
