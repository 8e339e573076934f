use crate::model::Task;
use crate::storage::Preferences;
use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, error};

pub const TASKS_NAMESPACE: &str = "tasks_prefs";
pub const TASKS_KEY: &str = "tasks";

/// The durable task list. The whole list is stored as one JSON array and
/// every change rewrites it.
pub struct TaskStore {
    prefs: Preferences,
    cached: Vec<Task>,
}

impl TaskStore {
    pub fn open(db: Connection) -> TaskStore {
        TaskStore {
            prefs: Preferences::new(db, TASKS_NAMESPACE),
            cached: Vec::new(),
        }
    }

    /// Read the stored list. If it cannot be read or decoded, the last good
    /// list is returned instead.
    pub fn load(&mut self) -> Vec<Task> {
        match self.read() {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                self.cached = tasks.clone();
                tasks
            }
            Err(e) => {
                error!("failed to load tasks, keeping {} cached: {:#}", self.cached.len(), e);
                self.cached.clone()
            }
        }
    }

    /// Overwrite the stored list. Failures are logged, not returned.
    pub fn save(&mut self, tasks: &[Task]) {
        match self.write(tasks) {
            Ok(()) => self.cached = tasks.to_vec(),
            Err(e) => error!("failed to save {} tasks: {:#}", tasks.len(), e),
        }
    }

    fn read(&self) -> Result<Vec<Task>> {
        let json = self
            .prefs
            .get_string(TASKS_KEY)?
            .unwrap_or_else(|| "[]".to_string());
        let tasks = serde_json::from_str(&json).context("Failed to decode stored tasks.")?;
        Ok(tasks)
    }

    fn write(&mut self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks).context("Failed to encode tasks.")?;
        self.prefs.put_string(TASKS_KEY, &json)
    }

    #[cfg(test)]
    pub fn prefs_mut(&mut self) -> &mut Preferences {
        &mut self.prefs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task;
    use crate::storage::memory_database;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_store_loads_nothing() {
        let mut store = TaskStore::open(memory_database());
        assert!(store.load().is_empty());
    }

    #[test]
    fn saved_tasks_load_back() {
        let mut store = TaskStore::open(memory_database());
        let tasks = vec![task("a", "2024-01-01", "10:00"), task("b", "2024-01-02", "11:00")];
        store.save(&tasks);
        assert_eq!(store.load(), tasks);
    }

    #[test]
    fn resaving_loaded_tasks_keeps_the_encoding() {
        let mut store = TaskStore::open(memory_database());
        let mut with_start = task("b", "2024-01-02", "11:00");
        with_start.start_time = Some("10:00".to_string());
        store.save(&[task("a", "2024-01-01", "10:00"), with_start]);
        let before = store.prefs_mut().get_string(TASKS_KEY).unwrap();

        let loaded = store.load();
        store.save(&loaded);
        let after = store.prefs_mut().get_string(TASKS_KEY).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn corrupt_blob_falls_back_to_last_good_list() {
        let mut store = TaskStore::open(memory_database());
        let tasks = vec![task("a", "2024-01-01", "10:00")];
        store.save(&tasks);
        store.prefs_mut().put_string(TASKS_KEY, "{not json").unwrap();
        assert_eq!(store.load(), tasks);
    }

    #[test]
    fn corrupt_blob_on_first_load_is_empty() {
        let mut store = TaskStore::open(memory_database());
        store.prefs_mut().put_string(TASKS_KEY, "[{\"title\":").unwrap();
        assert!(store.load().is_empty());
    }
}
