//! Conversation history persistence.
//!
//! History is a convenience. Reads that fail or find garbage yield an empty
//! conversation, and failed writes are logged and dropped.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AtaBotError, Result};

/// Storage key for the saved conversation.
pub const HISTORY_KEY: &str = "atabot-conversation";

/// Default cap on stored messages.
pub const MAX_STORED_MESSAGES: usize = 50;

/// Who said it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// AtaBot
    Bot,
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent it
    pub role: Role,
    /// Message body, unformatted
    pub text: String,
    /// When it was recorded
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A message stamped with the current time.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What gets written under [`HISTORY_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConversation {
    /// Recency list, oldest first.
    #[serde(default)]
    pub recent_categories: Vec<String>,
    /// Message log, oldest first.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Minimal string key-value store.
pub trait HistoryStore: Send {
    /// `None` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>>;
    /// Stores `value` under `key`, replacing what was there.
    fn write(&self, key: &str, value: &str) -> Result<()>;
    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AtaBotError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AtaBotError::Storage(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AtaBotError::Storage(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// A store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AtaBotError::Storage(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl HistoryStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads the saved conversation. Missing, unreadable or corrupt entries
/// yield an empty conversation.
pub fn load_conversation(store: &dyn HistoryStore) -> StoredConversation {
    let raw = match store.read(HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return StoredConversation::default(),
        Err(e) => {
            warn!("Could not load conversation history: {}", e);
            return StoredConversation::default();
        }
    };
    match serde_json::from_str::<StoredConversation>(&raw) {
        Ok(conversation) => {
            debug!(
                messages = conversation.messages.len(),
                "loaded conversation history"
            );
            conversation
        }
        Err(e) => {
            warn!("Discarding corrupt conversation history: {}", e);
            StoredConversation::default()
        }
    }
}

/// Writes the conversation, keeping only the newest `max_messages` messages.
pub fn try_save_conversation(
    store: &dyn HistoryStore,
    conversation: &StoredConversation,
    max_messages: usize,
) -> Result<()> {
    let skip = conversation.messages.len().saturating_sub(max_messages);
    let trimmed = StoredConversation {
        recent_categories: conversation.recent_categories.clone(),
        messages: conversation.messages[skip..].to_vec(),
    };
    let raw = serde_json::to_string(&trimmed)?;
    store.write(HISTORY_KEY, &raw)
}

/// Like [`try_save_conversation`], but failures are only logged.
pub fn save_conversation(
    store: &dyn HistoryStore,
    conversation: &StoredConversation,
    max_messages: usize,
) {
    if let Err(e) = try_save_conversation(store, conversation, max_messages) {
        warn!("Could not save conversation history: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(n: usize) -> StoredConversation {
        StoredConversation {
            recent_categories: vec!["greetings".to_string(), "jokes".to_string()],
            messages: (0..n)
                .map(|i| {
                    let role = if i % 2 == 0 { Role::User } else { Role::Bot };
                    ChatMessage::new(role, format!("message {i}"))
                })
                .collect(),
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryStore::new();
        let conversation = sample(4);
        try_save_conversation(&store, &conversation, MAX_STORED_MESSAGES).unwrap();
        assert_eq!(load_conversation(&store), conversation);
    }

    #[test]
    fn test_save_keeps_newest_messages() {
        let store = MemoryStore::new();
        try_save_conversation(&store, &sample(70), MAX_STORED_MESSAGES).unwrap();
        let loaded = load_conversation(&store);
        assert_eq!(loaded.messages.len(), MAX_STORED_MESSAGES);
        assert_eq!(loaded.messages[0].text, "message 20");
        assert_eq!(loaded.messages[49].text, "message 69");
    }

    #[test]
    fn test_missing_entry_is_empty() {
        let store = MemoryStore::new();
        assert_eq!(load_conversation(&store), StoredConversation::default());
    }

    #[test]
    fn test_corrupt_entry_is_empty() {
        let store = MemoryStore::new();
        store.write(HISTORY_KEY, "{not json").unwrap();
        assert_eq!(load_conversation(&store), StoredConversation::default());

        store.write(HISTORY_KEY, r#"{"messages": 12}"#).unwrap();
        assert_eq!(load_conversation(&store), StoredConversation::default());
    }

    #[test]
    fn test_partial_entry_uses_defaults() {
        let store = MemoryStore::new();
        store
            .write(HISTORY_KEY, r#"{"recentCategories": ["jokes"]}"#)
            .unwrap();
        let loaded = load_conversation(&store);
        assert_eq!(loaded.recent_categories, vec!["jokes".to_string()]);
        assert!(loaded.messages.is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.read(HISTORY_KEY).unwrap(), None);

        let conversation = sample(3);
        try_save_conversation(&store, &conversation, MAX_STORED_MESSAGES).unwrap();
        assert!(dir.path().join("nested/atabot-conversation.json").exists());
        assert_eq!(load_conversation(&store), conversation);

        store.remove(HISTORY_KEY).unwrap();
        store.remove(HISTORY_KEY).unwrap();
        assert_eq!(load_conversation(&store), StoredConversation::default());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.write("../escape", "x").is_err());
        assert!(store.read("").is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::new(Role::Bot, "hi")).unwrap();
        assert!(json.contains(r#""role":"bot""#));
    }
}
