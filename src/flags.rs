use crate::storage::Preferences;
use anyhow::Result;
use rusqlite::Connection;

pub const FLAGS_NAMESPACE: &str = "listify_prefs";
pub const KEY_FIRST_TIME_SWIPE: &str = "first_time_swipe";

/// One-off UI flags, kept apart from tasks and notification history.
pub struct AppFlags {
    prefs: Preferences,
}

impl AppFlags {
    pub fn open(db: Connection) -> AppFlags {
        AppFlags {
            prefs: Preferences::new(db, FLAGS_NAMESPACE),
        }
    }

    /// True until the completion/deletion hint has been shown once.
    pub fn is_first_time_with_swipe(&self) -> Result<bool> {
        self.prefs.get_bool(KEY_FIRST_TIME_SWIPE, true)
    }

    pub fn set_first_time_with_swipe(&mut self, first_time: bool) -> Result<()> {
        self.prefs.put_bool(KEY_FIRST_TIME_SWIPE, first_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_database;

    #[test]
    fn hint_shows_until_dismissed() {
        let mut flags = AppFlags::open(memory_database());
        assert!(flags.is_first_time_with_swipe().unwrap());
        flags.set_first_time_with_swipe(false).unwrap();
        assert!(!flags.is_first_time_with_swipe().unwrap());
    }
}
