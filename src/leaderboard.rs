use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;

use crate::app_dirs::AppDirs;

/// Rows shown on the start and end screens.
pub const LEADERBOARD_LIMIT: usize = 10;

/// One persisted score submission. Never mutated after it is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub submitted_at: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("leaderboard database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("failed to prepare leaderboard directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("leaderboard store unavailable")]
    Unavailable,
}

/// The displayed view over the full collection: score descending, ties kept
/// in store order, truncated to `LEADERBOARD_LIMIT`. Sorting happens client
/// side; the store only lists entries.
pub fn top_scores(entries: &[LeaderboardEntry]) -> Vec<LeaderboardEntry> {
    entries
        .iter()
        .cloned()
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .take(LEADERBOARD_LIMIT)
        .collect()
}

pub type Listener = Box<dyn Fn(&[LeaderboardEntry]) + Send>;

type ListenerMap = Mutex<HashMap<u64, Listener>>;

/// Narrow store contract the game consumes: append a score and watch the
/// full entry collection for changes.
pub trait ScoreStore {
    fn append(&self, entry: &LeaderboardEntry) -> Result<(), StoreError>;

    fn fetch_all(&self) -> Result<Vec<LeaderboardEntry>, StoreError>;

    /// Registers `listener`, fires it once with the current entries, and
    /// again after every successful append. The returned handle detaches
    /// the listener when dropped.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// Disposal handle for a store subscription. Dropping it (or calling
/// `unsubscribe`) stops further notifications.
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(map) = self.listeners.upgrade() {
            if let Ok(mut map) = map.lock() {
                map.remove(&self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Listener registry shared by the store implementations.
#[derive(Default)]
struct Listeners {
    map: Arc<ListenerMap>,
    next_id: AtomicU64,
}

impl Listeners {
    fn register(&self, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut map) = self.map.lock() {
            map.insert(id, listener);
        }
        Subscription {
            id,
            listeners: Arc::downgrade(&self.map),
        }
    }

    fn notify(&self, entries: &[LeaderboardEntry]) {
        if let Ok(map) = self.map.lock() {
            for listener in map.values() {
                listener(entries);
            }
        }
    }
}

/// Leaderboard backed by a shared sqlite database. Entries are append-only;
/// subscribers are notified synchronously after each successful write.
pub struct SqliteScoreStore {
    conn: Connection,
    listeners: Listeners,
}

impl SqliteScoreStore {
    pub fn new() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("revadim_scores.db"));
        Self::with_path(db_path)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                score INTEGER NOT NULL,
                submitted_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_leaderboard_score ON leaderboard(score)",
            [],
        )?;

        Ok(SqliteScoreStore {
            conn,
            listeners: Listeners::default(),
        })
    }
}

impl ScoreStore for SqliteScoreStore {
    fn append(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO leaderboard (name, score, submitted_at) VALUES (?1, ?2, ?3)",
            params![entry.name, entry.score, entry.submitted_at.to_rfc3339()],
        )?;

        if let Ok(entries) = self.fetch_all() {
            self.listeners.notify(&entries);
        }
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, score, submitted_at FROM leaderboard ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            let submitted_at: String = row.get(2)?;
            let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "submitted_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(LeaderboardEntry {
                name: row.get(0)?,
                score: row.get(1)?,
                submitted_at,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let entries = self.fetch_all().unwrap_or_default();
        listener(&entries);
        self.listeners.register(listener)
    }
}

/// In-process store for tests and headless runs. `set_reachable(false)`
/// simulates the shared database being unreachable: appends fail and no
/// notification fires.
#[derive(Default)]
pub struct MemoryScoreStore {
    entries: Mutex<Vec<LeaderboardEntry>>,
    unreachable: AtomicBool,
    listeners: Listeners,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::Relaxed);
    }
}

impl ScoreStore for MemoryScoreStore {
    fn append(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable);
        }

        let snapshot = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| StoreError::Unavailable)?;
            entries.push(entry.clone());
            entries.clone()
        };

        self.listeners.notify(&snapshot);
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable);
        }
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| StoreError::Unavailable)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        // A read failure degrades to an empty, displayable leaderboard.
        let entries = self.fetch_all().unwrap_or_default();
        listener(&entries);
        self.listeners.register(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    fn entry(name: &str, score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            score,
            submitted_at: Local::now(),
        }
    }

    #[test]
    fn test_top_scores_sorts_descending() {
        let entries = vec![entry("a", 3), entry("b", 9), entry("c", 5)];
        let top = top_scores(&entries);

        let scores: Vec<u32> = top.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![9, 5, 3]);
    }

    #[test]
    fn test_top_scores_truncates_to_limit() {
        let entries: Vec<LeaderboardEntry> =
            (0..25).map(|i| entry(&format!("p{}", i), i)).collect();

        let top = top_scores(&entries);
        assert_eq!(top.len(), LEADERBOARD_LIMIT);
        assert_eq!(top[0].score, 24);
    }

    #[test]
    fn test_top_scores_keeps_tie_order() {
        let entries = vec![entry("first", 5), entry("second", 5), entry("third", 5)];
        let top = top_scores(&entries);

        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_top_scores_empty_input() {
        assert!(top_scores(&[]).is_empty());
    }

    #[test]
    fn test_memory_store_append_and_fetch() {
        let store = MemoryScoreStore::new();
        store.append(&entry("dana", 5)).unwrap();
        store.append(&entry("yoni", 2)).unwrap();

        let all = store.fetch_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "dana");
    }

    #[test]
    fn test_subscribe_fires_immediately_and_on_append() {
        let store = MemoryScoreStore::new();
        store.append(&entry("dana", 5)).unwrap();

        let (tx, rx) = mpsc::channel();
        let _sub = store.subscribe(Box::new(move |entries| {
            tx.send(entries.len()).unwrap();
        }));

        // Fired once on subscribe with the current collection.
        assert_eq!(rx.try_recv().unwrap(), 1);

        store.append(&entry("yoni", 2)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = MemoryScoreStore::new();
        let (tx, rx) = mpsc::channel();
        let sub = store.subscribe(Box::new(move |entries| {
            tx.send(entries.len()).unwrap();
        }));
        assert_eq!(rx.try_recv().unwrap(), 0);

        sub.unsubscribe();
        store.append(&entry("dana", 5)).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropping_subscription_detaches_listener() {
        let store = MemoryScoreStore::new();
        let (tx, rx) = mpsc::channel();
        {
            let _sub = store.subscribe(Box::new(move |entries| {
                tx.send(entries.len()).unwrap();
            }));
            assert_eq!(rx.try_recv().unwrap(), 0);
        }

        store.append(&entry("dana", 5)).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unreachable_store_fails_append_without_notifying() {
        let store = MemoryScoreStore::new();
        let (tx, rx) = mpsc::channel();
        let _sub = store.subscribe(Box::new(move |entries| {
            tx.send(entries.len()).unwrap();
        }));
        rx.try_recv().unwrap();

        store.set_reachable(false);
        assert_matches!(
            store.append(&entry("dana", 5)),
            Err(StoreError::Unavailable)
        );
        assert!(rx.try_recv().is_err());

        // Back online, the same entry goes through.
        store.set_reachable(true);
        store.append(&entry("dana", 5)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteScoreStore::with_path(dir.path().join("scores.db")).unwrap();

        store.append(&entry("dana", 5)).unwrap();
        store.append(&entry("yoni", 7)).unwrap();

        let all = store.fetch_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "dana");
        assert_eq!(all[1].score, 7);
    }

    #[test]
    fn test_sqlite_store_notifies_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteScoreStore::with_path(dir.path().join("scores.db")).unwrap();

        let (tx, rx) = mpsc::channel();
        let _sub = store.subscribe(Box::new(move |entries| {
            tx.send(entries.to_vec()).unwrap();
        }));
        assert!(rx.try_recv().unwrap().is_empty());

        store.append(&entry("dana", 5)).unwrap();
        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "dana");
    }

    #[test]
    fn test_sqlite_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.db");

        {
            let store = SqliteScoreStore::with_path(&path).unwrap();
            store.append(&entry("dana", 5)).unwrap();
        }

        let store = SqliteScoreStore::with_path(&path).unwrap();
        let all = store.fetch_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].score, 5);
    }
}
