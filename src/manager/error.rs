use thiserror::Error;

use crate::models::TaskId;

/// Why the manager rejected an operation.
///
/// A rejected operation leaves the store, schedule and history untouched.
/// Unknown ids are not errors: lookups return `None` and updates of absent ids
/// are no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    #[error("epic {epic_id} not found")]
    EpicNotFound { epic_id: TaskId },

    #[error("subtask {id} cannot belong to itself")]
    SelfReference { id: TaskId },

    #[error("id {id} is already in use")]
    DuplicateId { id: TaskId },

    #[error("id {id} is not a valid identifier")]
    InvalidId { id: TaskId },

    #[error("duration of {minutes} minutes is negative or out of range")]
    InvalidDuration { minutes: i64 },

    #[error("time window overlaps scheduled item {conflicting_id}")]
    SchedulingConflict { conflicting_id: TaskId },

    #[error("subtask {subtask_id} belongs to epic {epic_id}, which no longer exists")]
    DetachedSubtask { subtask_id: TaskId, epic_id: TaskId },
}

/// Coarse classification used by callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is invalid.
    Validation,
    /// The request is valid but its time window collides with the schedule.
    SchedulingConflict,
    /// The stored state no longer allows the request.
    IllegalState,
}

impl ManagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EpicNotFound { .. }
            | Self::SelfReference { .. }
            | Self::DuplicateId { .. }
            | Self::InvalidId { .. }
            | Self::InvalidDuration { .. } => ErrorKind::Validation,
            Self::SchedulingConflict { .. } => ErrorKind::SchedulingConflict,
            Self::DetachedSubtask { .. } => ErrorKind::IllegalState,
        }
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
