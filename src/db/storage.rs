/// JSON documents stored under string keys.
use rusqlite::{Connection, OptionalExtension};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Returns the value stored under `key`, or `default` when it is missing or unreadable.
pub fn load<T: DeserializeOwned>(key: &str, default: T, conn: &Connection) -> T {
    let raw = match read_raw(key, conn) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(err) => {
            tracing::warn!("failed to read '{key}', using default: {err}");
            return default;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("corrupt entry under '{key}', using default: {err}");
            default
        }
    }
}

pub fn save<T: Serialize + ?Sized>(key: &str, value: &T, conn: &Connection) -> Result<()> {
    Batch::new().put(key, value)?.commit(conn)
}

/// A set of writes applied in one transaction.
#[derive(Debug, Default)]
pub struct Batch {
    writes: Vec<(String, Option<String>)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `value` under `key`. Encoding happens immediately.
    pub fn put<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Result<Self> {
        let payload = serde_json::to_string(value)?;
        self.writes.push((key.to_string(), Some(payload)));
        Ok(self)
    }

    pub fn delete(mut self, key: &str) -> Self {
        self.writes.push((key.to_string(), None));
        self
    }

    pub fn commit(self, conn: &Connection) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        for (key, payload) in &self.writes {
            match payload {
                Some(payload) => tx.execute(
                    "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
                    (key.as_str(), payload.as_str()),
                )?,
                None => tx.execute("DELETE FROM storage WHERE key = ?1", [key.as_str()])?,
            };
        }
        tx.commit()?;
        Ok(())
    }
}

fn read_raw(key: &str, conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn missing_key_falls_back_to_default() {
        let conn = db::init(":memory:").unwrap();
        let value: Vec<u32> = load("nothing", vec![7], &conn);
        assert_eq!(value, vec![7]);
    }

    #[test]
    fn save_then_load_returns_same_value() {
        let conn = db::init(":memory:").unwrap();
        let value = vec!["a".to_string(), "b".to_string()];
        save("letters", &value, &conn).unwrap();
        let loaded: Vec<String> = load("letters", Vec::new(), &conn);
        assert_eq!(loaded, value);
    }

    #[test]
    fn corrupt_entry_falls_back_to_default() {
        let conn = db::init(":memory:").unwrap();
        conn.execute(
            "INSERT INTO storage (key, value) VALUES ('broken', '{not json')",
            [],
        )
        .unwrap();
        let loaded: Vec<u32> = load("broken", Vec::new(), &conn);
        assert!(loaded.is_empty());
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let conn = db::init(":memory:").unwrap();
        save("number", &42, &conn).unwrap();
        let loaded: String = load("number", "fallback".to_string(), &conn);
        assert_eq!(loaded, "fallback");
    }

    #[test]
    fn save_overwrites_previous_value() {
        let conn = db::init(":memory:").unwrap();
        save("active", "one", &conn).unwrap();
        save("active", "two", &conn).unwrap();
        assert_eq!(load("active", String::new(), &conn), "two");
    }

    #[test]
    fn batch_applies_puts_and_deletes_together() {
        let conn = db::init(":memory:").unwrap();
        save("old", &true, &conn).unwrap();
        Batch::new()
            .put("left", &1)
            .unwrap()
            .put("right", &2)
            .unwrap()
            .delete("old")
            .commit(&conn)
            .unwrap();
        assert_eq!(load("left", 0, &conn), 1);
        assert_eq!(load("right", 0, &conn), 2);
        assert!(!load("old", false, &conn));
    }

    #[test]
    fn failed_batch_rolls_back_earlier_writes() {
        let conn = db::init(":memory:").unwrap();
        save("old", &true, &conn).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_right BEFORE INSERT ON storage
             WHEN NEW.key = 'right'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        let result = Batch::new()
            .put("left", &1)
            .unwrap()
            .delete("old")
            .put("right", &2)
            .unwrap()
            .commit(&conn);
        assert!(result.is_err());
        assert_eq!(load("left", 0, &conn), 0);
        assert!(load("old", false, &conn));
        assert!(conn.is_autocommit());
    }

    #[test]
    fn delete_of_missing_key_is_harmless() {
        let conn = db::init(":memory:").unwrap();
        Batch::new().delete("never-written").commit(&conn).unwrap();
        assert!(!load("never-written", false, &conn));
    }
}
