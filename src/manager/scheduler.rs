use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::models::{end_time, EntityKind, Subtask, Task, TaskId};

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// The window for a start time and duration, or `None` if either is absent.
    pub fn from_parts(
        start_time: Option<NaiveDateTime>,
        duration_minutes: Option<i64>,
    ) -> Option<Self> {
        let start = start_time?;
        let end = end_time(start_time, duration_minutes)?;
        Some(Self { start, end })
    }

    /// Windows that only touch at a boundary still overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.end >= other.start && other.end >= self.start
    }
}

/// An entry in the schedule: a task or subtask that has a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledItem {
    pub id: TaskId,
    pub kind: EntityKind,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl ScheduledItem {
    pub fn for_task(task: &Task) -> Option<Self> {
        Some(Self {
            id: task.id,
            kind: EntityKind::Task,
            start: task.start_time?,
            end: task.end_time(),
        })
    }

    pub fn for_subtask(subtask: &Subtask) -> Option<Self> {
        Some(Self {
            id: subtask.id,
            kind: EntityKind::Subtask,
            start: subtask.start_time?,
            end: subtask.end_time(),
        })
    }

    fn window(&self) -> Option<TimeWindow> {
        Some(TimeWindow {
            start: self.start,
            end: self.end?,
        })
    }
}

/// Time-ordered index of every scheduled task and subtask.
///
/// Ordered by start time, then id, so the order is total. Each id appears at
/// most once. Epics are never scheduled; their windows are derived from
/// subtasks that are already in the index.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    slots: BTreeMap<(NaiveDateTime, TaskId), ScheduledItem>,
    starts: HashMap<TaskId, NaiveDateTime>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first scheduled item, in schedule order, whose window overlaps
    /// `candidate`. The item with id `exclude` is skipped, so an update is
    /// never checked against its own previous version. Items without a
    /// duration have no window and never conflict.
    pub fn conflicts_with(
        &self,
        candidate: &TimeWindow,
        exclude: Option<TaskId>,
    ) -> Option<&ScheduledItem> {
        // Anything starting after the candidate's end cannot overlap it.
        self.slots
            .range(..=(candidate.end, TaskId::MAX))
            .map(|(_, item)| item)
            .filter(|item| Some(item.id) != exclude)
            .find(|item| item.window().is_some_and(|w| w.overlaps(candidate)))
    }

    /// Inserts `item`, replacing any earlier entry with the same id.
    pub fn register(&mut self, item: ScheduledItem) {
        debug_assert!(item.kind != EntityKind::Epic, "epics are never scheduled");
        self.unregister(item.id);
        self.starts.insert(item.id, item.start);
        self.slots.insert((item.start, item.id), item);
    }

    pub fn unregister(&mut self, id: TaskId) -> bool {
        match self.starts.remove(&id) {
            Some(start) => self.slots.remove(&(start, id)).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.starts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Scheduled items in start-time order.
    pub fn snapshot(&self) -> Vec<ScheduledItem> {
        self.slots.values().copied().collect()
    }
}
