//! Domain models for taskboard.
//!
//! # Core Concepts
//!
//! - [`Task`]: A standalone unit of work, optionally placed on the schedule
//!   with a start time and duration.
//! - [`Epic`]: A container of subtasks. Its status and time fields are derived
//!   from the subtasks and never set directly.
//! - [`Subtask`]: A unit of work bound to exactly one epic.
//! - [`Entity`]: Any of the three, tagged by [`EntityKind`]. Returned by the
//!   view history and the prioritized schedule.
//!
//! All three kinds draw their ids from one shared sequence, so an id alone
//! identifies an item regardless of kind.

mod entity;
mod epic;
mod subtask;
mod task;

pub use entity::*;
pub use epic::*;
pub use subtask::*;
pub use task::*;

pub(crate) use task::end_time;
