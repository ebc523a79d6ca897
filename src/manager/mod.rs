//! The in-memory task manager.
//!
//! [`TaskManager`] owns the entity store and keeps three derived views in step
//! with it:
//!
//! - epic status and time fields, recomputed on every subtask change
//!   ([`derive_epic_status`]);
//! - the recently viewed list ([`HistoryTracker`]), fed by `get_*` lookups and
//!   pruned on every delete;
//! - the time-ordered schedule ([`Scheduler`]), which rejects tasks and
//!   subtasks whose windows overlap an existing one.
//!
//! Every operation is synchronous and completes its side effects before it
//! returns. Hosts that share a manager between threads wrap it in a single
//! lock (see [`crate::db::Database`]).

mod error;
mod history;
mod ids;
mod scheduler;
mod status;

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use crate::models::{end_time, *};

pub use error::{ErrorKind, ManagerError, Result};
pub use history::HistoryTracker;
pub use ids::IdAllocator;
pub use scheduler::{ScheduledItem, Scheduler, TimeWindow};
pub use status::derive_epic_status;

#[derive(Debug, Clone, Default)]
pub struct TaskManager {
    ids: IdAllocator,
    tasks: BTreeMap<TaskId, Task>,
    epics: BTreeMap<TaskId, Epic>,
    subtasks: BTreeMap<TaskId, Subtask>,
    history: HistoryTracker,
    scheduler: Scheduler,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a manager around existing history and schedule instances.
    ///
    /// Both should be empty: they are expected to mirror this manager's store.
    pub fn with_parts(history: HistoryTracker, scheduler: Scheduler) -> Self {
        Self {
            history,
            scheduler,
            ..Self::default()
        }
    }

    // ============================================================
    // Tasks
    // ============================================================

    /// Stores a new task, or returns the existing task with identical title,
    /// description and time fields.
    pub fn create_task(&mut self, input: TaskInput) -> Result<Task> {
        if let Some(existing) = self.tasks.values().find(|t| input.matches(t)) {
            tracing::debug!(id = existing.id, "task already exists, returning it");
            return Ok(existing.clone());
        }

        self.check_schedule(input.start_time, input.duration_minutes, None)?;

        let task = input.into_task(self.ids.next_id());
        self.insert_task(task.clone());
        tracing::debug!(id = task.id, "created task");
        Ok(task)
    }

    /// Looks up a task and records the view in the history.
    pub fn get_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.tasks.get(&id)?.clone();
        self.history.record_view(id);
        Some(task)
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    /// Replaces the task stored at `id`. Returns `Ok(None)` without storing
    /// anything when `id` is not a task.
    pub fn update_task(&mut self, id: TaskId, input: TaskInput) -> Result<Option<Task>> {
        if !self.tasks.contains_key(&id) {
            return Ok(None);
        }

        self.check_schedule(input.start_time, input.duration_minutes, Some(id))?;

        let task = input.into_task(id);
        self.insert_task(task.clone());
        tracing::debug!(id, "updated task");
        Ok(Some(task))
    }

    pub fn delete_task(&mut self, id: TaskId) -> bool {
        if self.tasks.remove(&id).is_none() {
            return false;
        }
        self.scheduler.unregister(id);
        self.history.remove(id);
        tracing::debug!(id, "deleted task");
        true
    }

    pub fn delete_all_tasks(&mut self) {
        for id in self.tasks.keys() {
            self.scheduler.unregister(*id);
            self.history.remove(*id);
        }
        self.tasks.clear();
        tracing::debug!("deleted all tasks");
    }

    // ============================================================
    // Epics
    // ============================================================

    /// Stores a new epic, or returns the existing epic with identical title
    /// and description.
    pub fn create_epic(&mut self, input: EpicInput) -> Epic {
        if let Some(existing) = self.epics.values().find(|e| input.matches(e)) {
            tracing::debug!(id = existing.id, "epic already exists, returning it");
            return existing.clone();
        }

        let epic = input.into_epic(self.ids.next_id());
        self.epics.insert(epic.id, epic.clone());
        tracing::debug!(id = epic.id, "created epic");
        epic
    }

    /// Looks up an epic and records the view in the history.
    pub fn get_epic(&mut self, id: TaskId) -> Option<Epic> {
        let epic = self.epics.get(&id)?.clone();
        self.history.record_view(id);
        Some(epic)
    }

    pub fn list_epics(&self) -> Vec<Epic> {
        self.epics.values().cloned().collect()
    }

    /// Renames the epic stored at `id`. Its subtasks stay attached and its
    /// derived fields are recomputed. Returns `None` when `id` is not an epic.
    pub fn update_epic(&mut self, id: TaskId, input: EpicInput) -> Option<Epic> {
        let epic = self.epics.get_mut(&id)?;
        epic.title = input.title;
        epic.description = input.description;
        self.refresh_epic(id);
        tracing::debug!(id, "updated epic");
        self.epics.get(&id).cloned()
    }

    /// Deletes an epic together with all of its subtasks.
    pub fn delete_epic(&mut self, id: TaskId) -> bool {
        let Some(epic) = self.epics.remove(&id) else {
            return false;
        };
        for subtask_id in &epic.subtask_ids {
            self.subtasks.remove(subtask_id);
            self.scheduler.unregister(*subtask_id);
            self.history.remove(*subtask_id);
        }
        self.history.remove(id);
        tracing::debug!(id, subtasks = epic.subtask_ids.len(), "deleted epic");
        true
    }

    /// Deletes every epic, and with them every subtask.
    pub fn delete_all_epics(&mut self) {
        for id in self.epics.keys() {
            self.history.remove(*id);
        }
        for id in self.subtasks.keys() {
            self.scheduler.unregister(*id);
            self.history.remove(*id);
        }
        self.epics.clear();
        self.subtasks.clear();
        tracing::debug!("deleted all epics and subtasks");
    }

    /// The subtasks of an epic in the order they were attached, or `None` when
    /// `epic_id` is not an epic.
    pub fn subtasks_of_epic(&self, epic_id: TaskId) -> Option<Vec<Subtask>> {
        let epic = self.epics.get(&epic_id)?;
        Some(
            epic.subtask_ids
                .iter()
                .filter_map(|id| self.subtasks.get(id))
                .cloned()
                .collect(),
        )
    }

    // ============================================================
    // Subtasks
    // ============================================================

    /// Stores a new subtask and attaches it to its epic, or returns the
    /// existing subtask with identical epic, title, description and time
    /// fields.
    pub fn create_subtask(&mut self, input: SubtaskInput) -> Result<Subtask> {
        if let Some(existing) = self.subtasks.values().find(|s| input.matches(s)) {
            tracing::debug!(id = existing.id, "subtask already exists, returning it");
            return Ok(existing.clone());
        }

        if !self.epics.contains_key(&input.epic_id) {
            tracing::warn!(epic_id = input.epic_id, "rejected subtask for unknown epic");
            return Err(ManagerError::EpicNotFound {
                epic_id: input.epic_id,
            });
        }
        self.check_schedule(input.start_time, input.duration_minutes, None)?;

        let subtask = input.into_subtask(self.ids.next_id());
        self.insert_subtask(subtask.clone());
        tracing::debug!(id = subtask.id, epic_id = subtask.epic_id, "created subtask");
        Ok(subtask)
    }

    /// Looks up a subtask and records the view in the history.
    pub fn get_subtask(&mut self, id: TaskId) -> Option<Subtask> {
        let subtask = self.subtasks.get(&id)?.clone();
        self.history.record_view(id);
        Some(subtask)
    }

    pub fn list_subtasks(&self) -> Vec<Subtask> {
        self.subtasks.values().cloned().collect()
    }

    /// Replaces the subtask stored at `id`, moving it to another epic if
    /// `input.epic_id` changed. Returns `Ok(None)` without storing anything
    /// when `id` is not a subtask.
    pub fn update_subtask(&mut self, id: TaskId, input: SubtaskInput) -> Result<Option<Subtask>> {
        let Some(current_epic_id) = self.subtasks.get(&id).map(|s| s.epic_id) else {
            return Ok(None);
        };

        if input.epic_id == id {
            return Err(ManagerError::SelfReference { id });
        }
        if !self.epics.contains_key(&input.epic_id) {
            tracing::warn!(id, epic_id = input.epic_id, "rejected subtask update");
            return Err(if input.epic_id == current_epic_id {
                ManagerError::DetachedSubtask {
                    subtask_id: id,
                    epic_id: input.epic_id,
                }
            } else {
                ManagerError::EpicNotFound {
                    epic_id: input.epic_id,
                }
            });
        }
        self.check_schedule(input.start_time, input.duration_minutes, Some(id))?;

        if current_epic_id != input.epic_id {
            self.detach_subtask(current_epic_id, id);
        }
        let subtask = input.into_subtask(id);
        self.insert_subtask(subtask.clone());
        tracing::debug!(id, epic_id = subtask.epic_id, "updated subtask");
        Ok(Some(subtask))
    }

    /// Deletes a subtask and recomputes its epic.
    pub fn delete_subtask(&mut self, id: TaskId) -> bool {
        let Some(subtask) = self.subtasks.remove(&id) else {
            return false;
        };
        self.scheduler.unregister(id);
        self.history.remove(id);
        self.detach_subtask(subtask.epic_id, id);
        tracing::debug!(id, epic_id = subtask.epic_id, "deleted subtask");
        true
    }

    /// Deletes every subtask. Epics stay, with their derived fields reset.
    pub fn delete_all_subtasks(&mut self) {
        for id in self.subtasks.keys() {
            self.scheduler.unregister(*id);
            self.history.remove(*id);
        }
        self.subtasks.clear();

        let epic_ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for epic_id in epic_ids {
            if let Some(epic) = self.epics.get_mut(&epic_id) {
                epic.subtask_ids.clear();
            }
            self.refresh_epic(epic_id);
        }
        tracing::debug!("deleted all subtasks");
    }

    // ============================================================
    // Derived views
    // ============================================================

    /// Viewed items, least recently viewed first.
    pub fn history(&self) -> Vec<Entity> {
        self.history
            .snapshot()
            .into_iter()
            .filter_map(|id| self.entity(id))
            .collect()
    }

    /// Scheduled tasks and subtasks, earliest start first.
    pub fn prioritized(&self) -> Vec<Entity> {
        self.scheduler
            .snapshot()
            .into_iter()
            .filter_map(|item| self.entity(item.id))
            .collect()
    }

    /// Looks up any item by id without touching the history.
    pub fn entity(&self, id: TaskId) -> Option<Entity> {
        if let Some(task) = self.tasks.get(&id) {
            return Some(task.clone().into());
        }
        if let Some(epic) = self.epics.get(&id) {
            return Some(epic.clone().into());
        }
        self.subtasks.get(&id).map(|s| s.clone().into())
    }

    /// Ids in the history, least recently viewed first.
    pub fn history_ids(&self) -> Vec<TaskId> {
        self.history.snapshot()
    }

    // ============================================================
    // Replay
    // ============================================================

    /// Stores a task under its own id, e.g. while loading a saved file.
    pub fn restore_task(&mut self, task: Task) -> Result<Task> {
        self.check_restored_id(task.id)?;
        self.check_schedule(task.start_time, task.duration_minutes, None)?;

        self.ids.observe(task.id);
        self.insert_task(task.clone());
        Ok(task)
    }

    /// Stores an epic under its own id. Only the title and description are
    /// kept; subtasks attach themselves as they are restored.
    pub fn restore_epic(&mut self, epic: Epic) -> Result<Epic> {
        self.check_restored_id(epic.id)?;

        self.ids.observe(epic.id);
        let epic = EpicInput::new(epic.title, epic.description).into_epic(epic.id);
        self.epics.insert(epic.id, epic.clone());
        Ok(epic)
    }

    /// Stores a subtask under its own id and attaches it to its epic, which
    /// must already be restored.
    pub fn restore_subtask(&mut self, subtask: Subtask) -> Result<Subtask> {
        self.check_restored_id(subtask.id)?;
        if subtask.epic_id == subtask.id {
            return Err(ManagerError::SelfReference { id: subtask.id });
        }
        if !self.epics.contains_key(&subtask.epic_id) {
            return Err(ManagerError::EpicNotFound {
                epic_id: subtask.epic_id,
            });
        }
        self.check_schedule(subtask.start_time, subtask.duration_minutes, None)?;

        self.ids.observe(subtask.id);
        self.insert_subtask(subtask.clone());
        Ok(subtask)
    }

    /// Replays history views in order. Unknown ids are skipped.
    pub fn restore_history(&mut self, ids: &[TaskId]) {
        for &id in ids {
            if self.entity(id).is_some() {
                self.history.record_view(id);
            }
        }
    }

    // ============================================================
    // Internals
    // ============================================================

    /// Rejects a negative or unrepresentable duration, then any overlap with
    /// the schedule. Runs before every mutation that stores time fields.
    fn check_schedule(
        &self,
        start_time: Option<NaiveDateTime>,
        duration_minutes: Option<i64>,
        exclude: Option<TaskId>,
    ) -> Result<()> {
        if let Some(minutes) = duration_minutes {
            let in_range = match start_time {
                Some(_) => end_time(start_time, duration_minutes).is_some(),
                None => Duration::try_minutes(minutes).is_some(),
            };
            if minutes < 0 || !in_range {
                tracing::warn!(minutes, "rejected invalid duration");
                return Err(ManagerError::InvalidDuration { minutes });
            }
        }

        let Some(window) = TimeWindow::from_parts(start_time, duration_minutes) else {
            return Ok(());
        };
        match self.scheduler.conflicts_with(&window, exclude) {
            Some(hit) => {
                tracing::warn!(
                    conflicting_id = hit.id,
                    start = %window.start,
                    end = %window.end,
                    "rejected overlapping time window"
                );
                Err(ManagerError::SchedulingConflict {
                    conflicting_id: hit.id,
                })
            }
            None => Ok(()),
        }
    }

    fn check_restored_id(&self, id: TaskId) -> Result<()> {
        if id == 0 {
            return Err(ManagerError::InvalidId { id });
        }
        if self.entity(id).is_some() {
            return Err(ManagerError::DuplicateId { id });
        }
        Ok(())
    }

    fn insert_task(&mut self, task: Task) {
        match ScheduledItem::for_task(&task) {
            Some(item) => self.scheduler.register(item),
            None => {
                self.scheduler.unregister(task.id);
            }
        }
        self.tasks.insert(task.id, task);
    }

    /// Stores a subtask whose epic is known to exist, attaches it and
    /// recomputes the epic.
    fn insert_subtask(&mut self, subtask: Subtask) {
        match ScheduledItem::for_subtask(&subtask) {
            Some(item) => self.scheduler.register(item),
            None => {
                self.scheduler.unregister(subtask.id);
            }
        }

        let (id, epic_id) = (subtask.id, subtask.epic_id);
        self.subtasks.insert(id, subtask);
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            if !epic.subtask_ids.contains(&id) {
                epic.subtask_ids.push(id);
            }
        }
        self.refresh_epic(epic_id);
    }

    fn detach_subtask(&mut self, epic_id: TaskId, subtask_id: TaskId) {
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.subtask_ids.retain(|id| *id != subtask_id);
        }
        self.refresh_epic(epic_id);
    }

    fn refresh_epic(&mut self, epic_id: TaskId) {
        let Some(epic) = self.epics.get_mut(&epic_id) else {
            return;
        };
        let subtask_ids = epic.subtask_ids.clone();
        let subtasks = &self.subtasks;
        status::refresh_epic(epic, subtask_ids.iter().filter_map(|id| subtasks.get(id)));
    }
}
