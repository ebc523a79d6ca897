pub mod csv;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use crate::manager::TaskManager;
use crate::models::*;

/// Shared handle to a [`TaskManager`], optionally backed by a file.
///
/// Every operation runs under one lock, so a store change and its schedule,
/// history and epic side effects are applied together. With a file attached,
/// each successful operation re-saves the whole state before the lock is
/// released. That includes `get_*` lookups, since they change the history.
///
/// Rejections from the manager come back as [`ManagerError`](crate::manager::ManagerError)
/// inside the `anyhow::Error`; nothing is saved for a rejected operation.
pub struct Database {
    manager: Arc<Mutex<TaskManager>>,
    file: Option<Arc<PathBuf>>,
}

impl Database {
    /// Opens a file-backed store, loading the file if it exists.
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Data file path has no parent directory"))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut manager = TaskManager::new();
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            csv::parse(&content)
                .and_then(|snapshot| snapshot.restore_into(&mut manager))
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                tasks = manager.list_tasks().len(),
                epics = manager.list_epics().len(),
                subtasks = manager.list_subtasks().len(),
                "Loaded task file"
            );
        }

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
            file: Some(Arc::new(path)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_data_file()?)
    }

    pub fn open_memory() -> Self {
        Self::from_manager(TaskManager::new())
    }

    /// Wraps an existing manager without a backing file.
    pub fn from_manager(manager: TaskManager) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            file: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref().map(PathBuf::as_path)
    }

    /// Runs a read-only closure against the manager.
    pub fn read<T>(&self, f: impl FnOnce(&TaskManager) -> T) -> T {
        let manager = self.manager.lock().expect("task manager lock poisoned");
        f(&manager)
    }

    /// Runs a mutating closure against the manager, saving afterwards if it
    /// succeeded. If the save fails the manager is rolled back, so memory
    /// never runs ahead of the file.
    pub fn write<T>(&self, f: impl FnOnce(&mut TaskManager) -> Result<T>) -> Result<T> {
        let mut manager = self.manager.lock().expect("task manager lock poisoned");
        let backup = self.file.is_some().then(|| manager.clone());
        let value = f(&mut manager)?;
        if let Err(e) = self.save_locked(&manager) {
            if let Some(backup) = backup {
                *manager = backup;
            }
            tracing::error!("Save failed, change rolled back: {:#}", e);
            return Err(e);
        }
        Ok(value)
    }

    pub fn save(&self) -> Result<()> {
        let manager = self.manager.lock().expect("task manager lock poisoned");
        self.save_locked(&manager)
    }

    fn save_locked(&self, manager: &TaskManager) -> Result<()> {
        let Some(path) = self.file.as_deref() else {
            return Ok(());
        };

        let content = csv::render(&csv::Snapshot::capture(manager));
        let tmp = path.with_extension("csv.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.read(TaskManager::list_tasks)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.write(|m| Ok(m.get_task(id)))
    }

    pub fn create_task(&self, input: TaskInput) -> Result<Task> {
        self.write(|m| Ok(m.create_task(input)?))
    }

    pub fn update_task(&self, id: TaskId, input: TaskInput) -> Result<Option<Task>> {
        self.write(|m| Ok(m.update_task(id, input)?))
    }

    pub fn delete_task(&self, id: TaskId) -> Result<bool> {
        self.write(|m| Ok(m.delete_task(id)))
    }

    pub fn delete_all_tasks(&self) -> Result<()> {
        self.write(|m| {
            m.delete_all_tasks();
            Ok(())
        })
    }

    // ============================================================
    // Epic operations
    // ============================================================

    pub fn get_all_epics(&self) -> Vec<Epic> {
        self.read(TaskManager::list_epics)
    }

    pub fn get_epic(&self, id: TaskId) -> Result<Option<Epic>> {
        self.write(|m| Ok(m.get_epic(id)))
    }

    pub fn create_epic(&self, input: EpicInput) -> Result<Epic> {
        self.write(|m| Ok(m.create_epic(input)))
    }

    pub fn update_epic(&self, id: TaskId, input: EpicInput) -> Result<Option<Epic>> {
        self.write(|m| Ok(m.update_epic(id, input)))
    }

    pub fn delete_epic(&self, id: TaskId) -> Result<bool> {
        self.write(|m| Ok(m.delete_epic(id)))
    }

    pub fn delete_all_epics(&self) -> Result<()> {
        self.write(|m| {
            m.delete_all_epics();
            Ok(())
        })
    }

    pub fn get_epic_subtasks(&self, epic_id: TaskId) -> Option<Vec<Subtask>> {
        self.read(|m| m.subtasks_of_epic(epic_id))
    }

    // ============================================================
    // Subtask operations
    // ============================================================

    pub fn get_all_subtasks(&self) -> Vec<Subtask> {
        self.read(TaskManager::list_subtasks)
    }

    pub fn get_subtask(&self, id: TaskId) -> Result<Option<Subtask>> {
        self.write(|m| Ok(m.get_subtask(id)))
    }

    pub fn create_subtask(&self, input: SubtaskInput) -> Result<Subtask> {
        self.write(|m| Ok(m.create_subtask(input)?))
    }

    pub fn update_subtask(&self, id: TaskId, input: SubtaskInput) -> Result<Option<Subtask>> {
        self.write(|m| Ok(m.update_subtask(id, input)?))
    }

    pub fn delete_subtask(&self, id: TaskId) -> Result<bool> {
        self.write(|m| Ok(m.delete_subtask(id)))
    }

    pub fn delete_all_subtasks(&self) -> Result<()> {
        self.write(|m| {
            m.delete_all_subtasks();
            Ok(())
        })
    }

    // ============================================================
    // Views
    // ============================================================

    pub fn get_history(&self) -> Vec<Entity> {
        self.read(TaskManager::history)
    }

    pub fn get_prioritized(&self) -> Vec<Entity> {
        self.read(TaskManager::prioritized)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            file: self.file.clone(),
        }
    }
}

/// `<platform data dir>/tasks.csv`.
pub fn default_data_file() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "taskboard")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("tasks.csv"))
}
