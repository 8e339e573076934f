use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Open the data file, creating its tables if they do not exist yet.
pub fn open_database(path: &Path) -> Result<Connection> {
    let db = Connection::open(path)
        .with_context(|| format!("Failed to open data file {}.", path.display()))?;
    init_database(&db)?;
    Ok(db)
}

/// Create the preference and alarm tables.
pub fn init_database(db: &Connection) -> Result<()> {
    db.execute(
        "CREATE TABLE if not exists preference (
                  namespace       TEXT NOT NULL,
                  key             TEXT NOT NULL,
                  value           TEXT NOT NULL,
                  PRIMARY KEY (namespace, key)
                  )",
        [],
    )
    .context("Failed to create preference table.")?;

    db.execute(
        "CREATE TABLE if not exists alarm (
                  notification_id INTEGER PRIMARY KEY,
                  trigger_at      TEXT NOT NULL,
                  title           TEXT NOT NULL,
                  time            TEXT NOT NULL
                  )",
        [],
    )
    .context("Failed to create alarm table.")?;

    db.execute(
        "CREATE INDEX if not exists alarm_trigger_at ON alarm (trigger_at)",
        [],
    )
    .context("Failed to create index on alarm table.")?;

    Ok(())
}

/// A named group of key-value preferences. Namespaces never see each
/// other's keys, so tasks, notification history and flags can share one
/// data file.
pub struct Preferences {
    db: Connection,
    namespace: String,
}

impl Preferences {
    pub fn new(db: Connection, namespace: &str) -> Preferences {
        Preferences {
            db,
            namespace: namespace.to_string(),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row(
                "SELECT value FROM preference WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("Failed to read {}/{}.", self.namespace, key))?;
        Ok(value)
    }

    /// Overwrite a value. A single statement, so readers see either the old
    /// or the new value.
    pub fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO preference (namespace, key, value) VALUES (?1, ?2, ?3)",
                params![self.namespace, key, value],
            )
            .with_context(|| format!("Failed to write {}/{}.", self.namespace, key))?;
        Ok(())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get_string(key)? {
            Some(value) => Ok(value == "true"),
            None => Ok(default),
        }
    }

    pub fn put_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.put_string(key, if value { "true" } else { "false" })
    }
}

#[cfg(test)]
pub fn memory_database() -> Connection {
    let db = Connection::open_in_memory().unwrap();
    init_database(&db).unwrap();
    db
}
