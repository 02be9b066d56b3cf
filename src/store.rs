//! Persistent key/value store for composer preferences
//!
//! The composer never reaches for a global: whatever implements
//! [`PersistentStore`] is injected when the composer is built. Two
//! implementations ship here, an in-memory map and a `SQLite` file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::models::EmojiRef;
use crate::paths;

/// String key/value storage
pub trait PersistentStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store, mostly for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `SQLite`-backed store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at the default location
    pub fn open() -> Result<Self> {
        let path = paths::prefs_path()?;
        Self::open_path(&path)
    }

    /// Open or create the store at a specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open preference store")?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// When a key was last written
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("preference store lock poisoned"))
    }
}

impl PersistentStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .context("Failed to read preference")
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r"INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
              ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .context("Failed to write preference")?;
        Ok(())
    }
}

// ==================== Typed preferences ====================

const FREQUENT_EMOJI_KEY: &str = "emoji.frequent";
const THEME_KEY: &str = "theme";
const MAX_FREQUENT_EMOJIS: usize = 32;

/// Usage counter for one emoji
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentEmoji {
    /// The emoji
    pub emoji: EmojiRef,
    /// How many times it was inserted
    pub count: u32,
}

/// Typed view over a [`PersistentStore`]
pub struct Preferences<'a> {
    store: &'a dyn PersistentStore,
}

impl<'a> Preferences<'a> {
    /// Wrap a store
    pub fn new(store: &'a dyn PersistentStore) -> Self {
        Self { store }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to decode preference {key}"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode preference {key}"))?;
        self.store.set(key, &raw)
    }

    /// Frequently used emojis, most used first
    pub fn frequent_emojis(&self) -> Result<Vec<FrequentEmoji>> {
        Ok(self.get_json(FREQUENT_EMOJI_KEY)?.unwrap_or_default())
    }

    /// Bump the usage counter of an emoji
    pub fn record_emoji_use(&self, emoji: &EmojiRef) -> Result<()> {
        let mut frequent = self.frequent_emojis()?;
        if let Some(entry) = frequent
            .iter_mut()
            .find(|f| f.emoji.shortcode == emoji.shortcode)
        {
            entry.count = entry.count.saturating_add(1);
            entry.emoji = emoji.clone();
        } else {
            frequent.push(FrequentEmoji {
                emoji: emoji.clone(),
                count: 1,
            });
        }

        // Stable sort keeps recency order among equal counts
        frequent.sort_by(|a, b| b.count.cmp(&a.count));
        frequent.truncate(MAX_FREQUENT_EMOJIS);
        self.set_json(FREQUENT_EMOJI_KEY, &frequent)
    }

    /// Selected theme name
    pub fn theme(&self) -> Result<Option<String>> {
        self.store.get(THEME_KEY)
    }

    /// Persist the selected theme name
    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.store.set(THEME_KEY, theme)
    }
}
