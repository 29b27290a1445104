//! Persistence and query layer for users and tasks.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::storage::KeyValueStorage;

pub const USERS_KEY: &str = "users";
pub const TASKS_KEY: &str = "tasks";
pub const CORRUPT_SUFFIX: &str = "corrupt";

pub const DEFAULT_USERS: [&str; 3] = ["alice", "bob", "charlie"];

pub fn default_users() -> Vec<String> {
    DEFAULT_USERS.iter().map(|u| u.to_string()).collect()
}

/// Owns the canonical user and task collections.
///
/// Every operation reads the slot it touches, applies its change and writes
/// the slot back, so callers only ever hold copies.
pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Seeds the default users unless a user collection already exists.
    pub fn initialize_users(&self) -> Result<()> {
        if self.storage.get(USERS_KEY)?.is_none() {
            info!(users = ?DEFAULT_USERS, "seeding default users");
            self.save_users(&default_users())?;
        }
        Ok(())
    }

    pub fn get_users(&self) -> Result<Vec<String>> {
        self.read_or_default(USERS_KEY, default_users)
    }

    pub fn save_users(&self, users: &[String]) -> Result<()> {
        self.write_slot(USERS_KEY, users)
    }

    pub fn get_tasks(&self) -> Result<Vec<Task>> {
        self.read_or_default(TASKS_KEY, Vec::new)
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write_slot(TASKS_KEY, tasks)
    }

    pub fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.get_tasks()?.into_iter().find(|t| &t.id == id))
    }

    /// Appends a new `Pending` task and returns the full collection.
    pub fn add_task(&self, draft: NewTask) -> Result<Vec<Task>> {
        let mut tasks = self.get_tasks()?;
        let mut task = Task::new(draft);
        while tasks.iter().any(|t| t.id == task.id) {
            task.id = TaskId::generate();
        }
        debug!(id = %task.id, title = %task.title, "adding task");
        tasks.push(task);
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }

    /// Merges `patch` into the task with `id`. An unknown id leaves storage untouched.
    pub fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Vec<Task>> {
        let mut tasks = self.get_tasks()?;
        match tasks.iter_mut().find(|t| &t.id == id) {
            Some(task) => {
                task.apply(patch);
                debug!(id = %id, "updated task");
                self.save_tasks(&tasks)?;
            }
            None => debug!(id = %id, "update skipped, no such task"),
        }
        Ok(tasks)
    }

    pub fn delete_task(&self, id: &TaskId) -> Result<Vec<Task>> {
        let mut tasks = self.get_tasks()?;
        let initial_len = tasks.len();
        tasks.retain(|t| &t.id != id);
        if tasks.len() == initial_len {
            debug!(id = %id, "delete found no such task");
        }
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }

    /// Drops both collections and re-seeds the default users. Irreversible.
    pub fn reset_data(&self) -> Result<()> {
        self.storage.remove(TASKS_KEY)?;
        self.storage.remove(USERS_KEY)?;
        info!("reset all data");
        self.initialize_users()
    }

    pub fn overdue_tasks_at(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let tasks = self.get_tasks()?;
        Ok(tasks.into_iter().filter(|t| t.is_overdue_at(now)).collect())
    }

    pub fn overdue_tasks(&self) -> Result<Vec<Task>> {
        self.overdue_tasks_at(Utc::now())
    }

    pub fn has_overdue_tasks(&self) -> Result<bool> {
        let now = Utc::now();
        Ok(self.get_tasks()?.iter().any(|t| t.is_overdue_at(now)))
    }

    fn read_or_default<T, F>(&self, key: &str, default: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let Some(raw) = self.storage.get(key)? else {
            return Ok(default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(source) => {
                let err = Error::Corrupt { key: key.to_string(), source };
                let backup = self.back_up_slot(key, &raw)?;
                warn!(key, backup = %backup, error = %err, "unreadable slot, using default");
                Ok(default())
            }
        }
    }

    /// Copies unreadable slot content aside so the next write cannot destroy it.
    /// Returns the backup slot name.
    fn back_up_slot(&self, key: &str, raw: &str) -> Result<String> {
        // Older, different backups are kept: try `tasks.corrupt`, `tasks.corrupt-1`, ...
        let mut n = 0usize;
        loop {
            let backup = match n {
                0 => format!("{}.{}", key, CORRUPT_SUFFIX),
                _ => format!("{}.{}-{}", key, CORRUPT_SUFFIX, n),
            };
            match self.storage.get(&backup)? {
                Some(existing) if existing == raw => return Ok(backup),
                Some(_) => n += 1,
                None => {
                    self.storage.set(&backup, raw)?;
                    return Ok(backup);
                }
            }
        }
    }

    fn write_slot<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string_pretty(value)?;
        self.storage.set(key, &raw)
    }
}

/// Point-in-time overdue check against the current clock.
pub fn is_task_overdue(task: &Task) -> bool {
    task.is_overdue_at(Utc::now())
}
