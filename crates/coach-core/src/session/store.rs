//! Session persistence and caching.
//!
//! Keeps [`SessionContext`] values in an in-memory cache backed by small JSON
//! files, plus a single [`RotationLedger`] shared by every session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SessionContext;
use crate::types::CallPurpose;
use crate::utils;

// ─────────────────────────────────────────────
// On-disk records
// ─────────────────────────────────────────────

/// File contents for one session key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    key: String,
    context: SessionContext,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Longer-lived round-robin counters, one per credential pool.
///
/// A fresh session takes `next % pool_size` and bumps the counter, so
/// consecutive sessions fan out across the pool instead of all starting at 0.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RotationLedger {
    pub chat_next: usize,
    pub document_next: usize,
}

impl RotationLedger {
    pub fn next_for(&self, purpose: CallPurpose) -> usize {
        match purpose {
            CallPurpose::Chat => self.chat_next,
            CallPurpose::Document => self.document_next,
        }
    }

    pub fn set_next(&mut self, purpose: CallPurpose, next: usize) {
        match purpose {
            CallPurpose::Chat => self.chat_next = next,
            CallPurpose::Document => self.document_next = next,
        }
    }
}

// ─────────────────────────────────────────────
// SessionStore
// ─────────────────────────────────────────────

/// Loads and saves session contexts under a data directory.
pub struct SessionStore {
    /// Root data directory (`~/.coach` by default).
    root: PathBuf,
    cache: RwLock<HashMap<String, StoredSession>>,
}

impl SessionStore {
    /// Create a store rooted at `root` (defaults to `~/.coach/`).
    ///
    /// The `sessions/` directory is created if it doesn't exist.
    pub fn new(root: Option<PathBuf>) -> std::io::Result<Self> {
        let root = root.unwrap_or_else(utils::get_data_path);
        std::fs::create_dir_all(root.join("sessions"))?;

        Ok(SessionStore {
            root,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// The context for `key`: cache, then disk, then a fresh one.
    pub fn load_context(&self, key: &str) -> SessionContext {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(stored) = cache.get(key) {
                return stored.context.clone();
            }
        }

        match self.load_from_disk(key) {
            Some(stored) => {
                let context = stored.context.clone();
                let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
                cache.insert(key.to_string(), stored);
                context
            }
            None => SessionContext::default(),
        }
    }

    /// Cache and persist the context for `key`.
    pub fn save_context(&self, key: &str, context: &SessionContext) -> std::io::Result<()> {
        let now = Utc::now();
        let stored = {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            let created_at = cache
                .get(key)
                .map(|s| s.created_at)
                .or_else(|| self.load_from_disk(key).map(|s| s.created_at))
                .unwrap_or(now);
            let stored = StoredSession {
                key: key.to_string(),
                context: context.clone(),
                created_at,
                updated_at: now,
            };
            cache.insert(key.to_string(), stored.clone());
            stored
        };

        let path = self.session_path(key);
        write_json(&path, &stored)?;
        debug!(session = key, path = %path.display(), "saved session context");
        Ok(())
    }

    /// Delete a session from cache and disk. Returns `true` if a file was removed.
    pub fn delete(&self, key: &str) -> bool {
        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.remove(key);
        }

        let path = self.session_path(key);
        if !path.exists() {
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to delete session file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Read the rotation ledger, or a zeroed one if missing or unreadable.
    pub fn load_ledger(&self) -> RotationLedger {
        let path = self.ledger_path();
        if !path.exists() {
            return RotationLedger::default();
        }
        match read_json::<RotationLedger>(&path) {
            Some(ledger) => ledger,
            None => {
                warn!("Ignoring unreadable rotation ledger at {}", path.display());
                RotationLedger::default()
            }
        }
    }

    /// Persist the rotation ledger.
    pub fn save_ledger(&self, ledger: &RotationLedger) -> std::io::Result<()> {
        write_json(&self.ledger_path(), ledger)
    }

    fn session_path(&self, key: &str) -> PathBuf {
        let safe_key = utils::safe_filename(&key.replace(':', "_"));
        self.root.join("sessions").join(format!("{safe_key}.json"))
    }

    fn ledger_path(&self) -> PathBuf {
        self.root.join("rotation.json")
    }

    fn load_from_disk(&self, key: &str) -> Option<StoredSession> {
        let path = self.session_path(key);
        if !path.exists() {
            return None;
        }
        let stored = read_json::<StoredSession>(&path);
        if stored.is_none() {
            warn!("Ignoring unreadable session file {}", path.display());
        }
        stored
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_store() -> (SessionStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
        (store, dir)
    }

    #[test]
    fn test_unknown_session_is_fresh() {
        let (store, _dir) = make_store();
        assert_eq!(store.load_context("cli:nobody"), SessionContext::default());
    }

    #[test]
    fn test_save_and_reload_across_instances() {
        let dir = tempdir().unwrap();

        {
            let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
            let mut ctx = SessionContext::new();
            ctx.remember(CallPurpose::Chat, 3);
            store.save_context("cli:default", &ctx).unwrap();
        }

        let store = SessionStore::new(Some(dir.path().to_path_buf())).unwrap();
        let ctx = store.load_context("cli:default");
        assert_eq!(ctx.sticky_index(CallPurpose::Chat), Some(3));
        assert!(dir.path().join("sessions").join("cli_default.json").exists());
    }

    #[test]
    fn test_corrupt_session_file_gives_fresh_context() {
        let (store, dir) = make_store();
        std::fs::write(dir.path().join("sessions").join("cli_x.json"), "{not json").unwrap();
        assert_eq!(store.load_context("cli:x"), SessionContext::default());
    }

    #[test]
    fn test_delete_session() {
        let (store, _dir) = make_store();
        store.save_context("cli:gone", &SessionContext::new()).unwrap();
        assert!(store.delete("cli:gone"));
        assert!(!store.delete("cli:gone"));
    }

    #[test]
    fn test_ledger_round_trip() {
        let (store, _dir) = make_store();
        assert_eq!(store.load_ledger(), RotationLedger::default());

        let mut ledger = RotationLedger::default();
        ledger.set_next(CallPurpose::Document, 7);
        store.save_ledger(&ledger).unwrap();

        let reloaded = store.load_ledger();
        assert_eq!(reloaded.next_for(CallPurpose::Document), 7);
        assert_eq!(reloaded.next_for(CallPurpose::Chat), 0);
    }

    #[test]
    fn test_created_at_preserved_on_update() {
        let (store, dir) = make_store();
        store.save_context("cli:t", &SessionContext::new()).unwrap();
        let first: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("sessions").join("cli_t.json")).unwrap(),
        )
        .unwrap();

        let mut ctx = SessionContext::new();
        ctx.remember(CallPurpose::Chat, 1);
        store.save_context("cli:t", &ctx).unwrap();
        let second: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("sessions").join("cli_t.json")).unwrap(),
        )
        .unwrap();

        assert_eq!(first["createdAt"], second["createdAt"]);
        assert_eq!(second["context"]["chatCredential"], 1);
    }
}
