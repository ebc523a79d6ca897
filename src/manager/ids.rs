use crate::models::TaskId;

/// Hands out ids shared by tasks, epics and subtasks.
///
/// Every id returned is strictly greater than all ids returned or observed
/// before it. Ids are never reused, even after deletion.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: TaskId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> TaskId {
        self.last += 1;
        self.last
    }

    /// Moves the counter past an id assigned elsewhere, e.g. one replayed from
    /// a saved file.
    pub fn observe(&mut self, id: TaskId) {
        self.last = self.last.max(id);
    }

    pub fn last_issued(&self) -> TaskId {
        self.last
    }
}
