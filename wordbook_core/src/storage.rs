//! Key-value persistence for the notebook's four collections

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::model::{QuizResult, UserProfile, WordEntry, DEFAULT_THEME};
use crate::progress::calculate_level;

pub const WORDS_KEY: &str = "wordbook_words";
pub const STATS_KEY: &str = "wordbook_stats";
pub const PROFILE_KEY: &str = "wordbook_profile";
pub const THEMES_KEY: &str = "wordbook_themes";

/// Durable, synchronous string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Writes every entry or none of them.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// In-memory store, used in tests and as a scratch notebook.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed store with a single key/value table
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Read a JSON value, falling back to `default` when missing or unreadable.
fn load_json<T, S>(store: &S, key: &str, default: impl FnOnce() -> T) -> Result<T, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(key, error = %err, "stored value is corrupt, using default");
            Ok(default())
        }
    }
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

/// Load words, giving blank themes the default dictionary
pub fn load_words<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<WordEntry>, StoreError> {
    let mut words: Vec<WordEntry> = load_json(store, WORDS_KEY, Vec::new)?;
    for word in &mut words {
        if word.theme.trim().is_empty() {
            word.theme = DEFAULT_THEME.to_string();
        }
    }
    Ok(words)
}

pub fn load_stats<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<QuizResult>, StoreError> {
    load_json(store, STATS_KEY, Vec::new)
}

/// Load the profile; the cached level is recomputed from XP.
pub fn load_profile<S: KeyValueStore + ?Sized>(store: &S) -> Result<UserProfile, StoreError> {
    let mut profile: UserProfile = load_json(store, PROFILE_KEY, UserProfile::default)?;
    profile.level = calculate_level(profile.xp);
    Ok(profile)
}

/// Load the theme list; the default dictionary is always at hand.
pub fn load_themes<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<String>, StoreError> {
    let mut themes: Vec<String> =
        load_json(store, THEMES_KEY, || vec![DEFAULT_THEME.to_string()])?;
    if !themes.iter().any(|t| t == DEFAULT_THEME) {
        themes.insert(0, DEFAULT_THEME.to_string());
    }
    Ok(themes)
}
