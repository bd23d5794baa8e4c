//! In-process record store with an optional JSON snapshot file

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::application::errors::StorageError;
use crate::domain::entities::{BotSettings, ChatRecord, StatEntry, UserRecord};
use crate::domain::traits::Store;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct StoreData {
    users: HashMap<String, UserRecord>,
    chats: HashMap<String, ChatRecord>,
    settings: HashMap<String, BotSettings>,
    stats: HashMap<String, StatEntry>,
}

/// Store backed by memory; `flush` writes a JSON snapshot when a path is set
#[derive(Default)]
pub struct MemoryStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a snapshot file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| StorageError::Serialization(e.to_string()))?
        } else {
            StoreData::default()
        };
        tracing::info!("Store opened at {}", path.display());
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot. No-op for purely in-memory stores.
    pub fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = {
            let data = self.lock();
            serde_json::to_string_pretty(&*data).map_err(|e| StorageError::Serialization(e.to_string()))?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!("Store flushed to {}", path.display());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    fn user(&self, id: &str) -> Option<UserRecord> {
        self.lock().users.get(id).cloned()
    }

    fn put_user(&self, id: &str, record: UserRecord) {
        self.lock().users.insert(id.to_string(), record);
    }

    fn ensure_user(&self, id: &str) -> bool {
        let mut data = self.lock();
        if data.users.contains_key(id) {
            return false;
        }
        data.users.insert(id.to_string(), UserRecord::default());
        true
    }

    fn update_user(&self, id: &str, f: &mut dyn FnMut(&mut UserRecord)) -> bool {
        match self.lock().users.get_mut(id) {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        }
    }

    fn chat(&self, id: &str) -> Option<ChatRecord> {
        self.lock().chats.get(id).cloned()
    }

    fn ensure_chat(&self, id: &str) -> ChatRecord {
        self.lock().chats.entry(id.to_string()).or_default().clone()
    }

    fn update_chat(&self, id: &str, f: &mut dyn FnMut(&mut ChatRecord)) -> bool {
        match self.lock().chats.get_mut(id) {
            Some(chat) => {
                f(chat);
                true
            }
            None => false,
        }
    }

    fn settings(&self, bot_id: &str) -> BotSettings {
        self.lock().settings.get(bot_id).cloned().unwrap_or_default()
    }

    fn update_settings(&self, bot_id: &str, f: &mut dyn FnMut(&mut BotSettings)) {
        f(self.lock().settings.entry(bot_id.to_string()).or_default());
    }

    fn stat(&self, plugin: &str) -> Option<StatEntry> {
        self.lock().stats.get(plugin).cloned()
    }

    fn update_stat(&self, plugin: &str, f: &mut dyn FnMut(&mut StatEntry)) {
        f(self.lock().stats.entry(plugin.to_string()).or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_user_is_lazy_and_idempotent() {
        let store = MemoryStore::new();
        assert!(store.user("alice").is_none());
        assert!(store.ensure_user("alice"));
        assert!(!store.ensure_user("alice"));
        assert_eq!(store.user("alice"), Some(UserRecord::default()));
    }

    #[test]
    fn test_update_missing_record() {
        let store = MemoryStore::new();
        let mut touched = false;
        assert!(!store.update_user("nobody", &mut |_| touched = true));
        assert!(!touched);
    }

    #[test]
    fn test_snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = MemoryStore::open(&path).unwrap();
        store.put_user("alice", UserRecord::default().with_level(3));
        assert!(!store.update_chat("group", &mut |c| c.is_banned = true));
        store.ensure_chat("group");
        store.update_chat("group", &mut |c| c.is_banned = true);
        store.update_stat("ping", &mut |s| s.total = 4);
        store.flush().unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.user("alice").unwrap().level, 3);
        assert!(reopened.chat("group").unwrap().is_banned);
        assert_eq!(reopened.stat("ping").unwrap().total, 4);
    }

    #[test]
    fn test_legacy_snapshot_with_bad_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{"stats": {"menu": {"total": 5, "success": "NaN"}}, "users": {"bob": {"exp": 9}}}"#,
        )
        .unwrap();

        let store = MemoryStore::open(&path).unwrap();
        let stat = store.stat("menu").unwrap();
        assert_eq!(stat.total, 5);
        assert_eq!(stat.success, 0);
        let bob = store.user("bob").unwrap();
        assert_eq!(bob.exp, 9);
        assert_eq!(bob.limit, 10);
    }
}
