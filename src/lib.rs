//! # AtaBot Plugin
//!
//! AtaBot is a scripted chat assistant. It answers free-form text with canned
//! replies: the input is routed through an ordered list of keyword rules to a
//! response category, and a reply is drawn at random from that category while
//! avoiding immediate repeats.
//!
//! ## Features
//!
//! - Keyword, substring and regex routing with a single explicit priority order
//! - Easter eggs that take precedence over every category
//! - Per-session recency tracking to avoid repeating the last reply
//! - Time-of-day aware greetings
//! - Quick actions and conversation history with optional file persistence
//!
//! ## Example
//!
//! ```rust
//! use elizaos_plugin_atabot::AtaBotPlugin;
//!
//! let atabot = AtaBotPlugin::new();
//! println!("{}", atabot.get_greeting());
//! let response = atabot.generate_response("Can you help me write some code?");
//! println!("{}", response);
//! ```

#![warn(missing_docs)]

pub mod actions;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod history;
pub mod interop;
pub mod patterns;
pub mod providers;
pub mod script;
pub mod selector;
pub mod session;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

pub use config::AtaBotConfig;
pub use context::ConversationContext;
pub use error::{AtaBotError, Result, ScriptError};
pub use format::{format_message, speakable_text};
pub use history::{ChatMessage, FileStore, HistoryStore, MemoryStore, Role, StoredConversation};
pub use script::{default_script, ResponseScript};
pub use selector::{ResponseSelector, Selection};
pub use session::{ChatSession, QuickExchange};

/// Plugin name
pub const PLUGIN_NAME: &str = "atabot";

/// Plugin description
pub const PLUGIN_DESCRIPTION: &str = "Scripted keyword-routing chat assistant - no LLM required";

/// Plugin version
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One AtaBot conversation.
///
/// The script is shared and immutable; the session (recency list, random
/// source, message log) belongs to this instance alone.
pub struct AtaBotPlugin {
    selector: ResponseSelector,
    session: Mutex<ChatSession>,
}

impl Default for AtaBotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl AtaBotPlugin {
    /// Creates a plugin over the embedded script with an unseeded session
    /// and no persistence.
    pub fn new() -> Self {
        Self {
            selector: ResponseSelector::new(default_script()),
            session: Mutex::new(ChatSession::new(ConversationContext::new())),
        }
    }

    /// Creates a plugin from configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the configured script cannot
    /// be read or validated.
    pub fn with_config(config: AtaBotConfig) -> Result<Self> {
        config.validate()?;

        let script = match &config.script_path {
            Some(path) => Arc::new(ResponseScript::from_file(path)?),
            None => default_script(),
        };

        let context = match config.seed {
            Some(seed) => ConversationContext::seeded(seed),
            None => ConversationContext::new(),
        };

        let selector = ResponseSelector::new(script);
        let session = if !config.persist_history {
            ChatSession::new(context)
        } else {
            let store: Box<dyn HistoryStore> = match &config.history_dir {
                Some(dir) => {
                    info!("Persisting AtaBot history under {}", dir.display());
                    Box::new(FileStore::new(dir))
                }
                None => Box::new(MemoryStore::new()),
            };
            ChatSession::with_store(&selector, context, store, config.max_stored_messages)
        };

        Ok(Self {
            selector,
            session: Mutex::new(session),
        })
    }

    /// Creates a plugin over a custom script.
    pub fn from_script(script: ResponseScript) -> Self {
        Self::from_parts(Arc::new(script), ChatSession::new(ConversationContext::new()))
    }

    /// Creates a plugin from an already built script and session.
    pub fn from_parts(script: Arc<ResponseScript>, session: ChatSession) -> Self {
        Self {
            selector: ResponseSelector::new(script),
            session: Mutex::new(session),
        }
    }

    fn session(&self) -> MutexGuard<'_, ChatSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generates AtaBot's reply to the user's input.
    pub fn generate_response(&self, input: &str) -> String {
        self.respond(input).text
    }

    /// Like [`generate_response`](Self::generate_response), but also reports
    /// the category and easter-egg trigger.
    pub fn respond(&self, input: &str) -> Selection {
        self.session().respond(&self.selector, input)
    }

    /// Fires a quick action by id. `None` if the id is unknown.
    pub fn quick_reply(&self, id: &str) -> Option<QuickExchange> {
        self.session().quick_reply(&self.selector, id)
    }

    /// A random "typing" pause to show before a reply.
    pub fn typing_delay(&self) -> Duration {
        self.session().typing_delay()
    }

    /// Greeting for the current local time.
    pub fn get_greeting(&self) -> String {
        self.greeting_at(providers::local_hour())
    }

    /// Greeting for `hour` (0-23) given the conversation so far.
    pub fn greeting_at(&self, hour: u32) -> String {
        let count = self.user_message_count();
        providers::contextual_greeting(self.selector.script().greeting(), hour, count)
    }

    /// Messages the user has sent in this session.
    pub fn user_message_count(&self) -> u32 {
        self.session().context().user_message_count()
    }

    /// The opening message shown before any conversation.
    pub fn welcome_message(&self) -> &str {
        self.session().welcome(&self.selector)
    }

    /// Clears the conversation and returns the "cleared" line.
    pub fn reset_history(&self) -> String {
        self.session().clear(&self.selector)
    }

    /// The message log, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.session().history().to_vec()
    }

    /// What would be persisted right now.
    pub fn snapshot(&self) -> StoredConversation {
        self.session().snapshot()
    }

    /// Replaces the log and recency list with a host-saved conversation.
    pub fn restore_history(&self, saved: StoredConversation) {
        self.session().restore(&self.selector, saved);
    }

    /// The response selector.
    pub fn selector(&self) -> &ResponseSelector {
        &self.selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_KEY;

    fn seeded(seed: u64) -> AtaBotPlugin {
        AtaBotPlugin::from_parts(
            default_script(),
            ChatSession::new(ConversationContext::seeded(seed)),
        )
    }

    #[test]
    fn test_greeting() {
        let plugin = AtaBotPlugin::new();
        let greeting = plugin.greeting_at(10);
        assert!(greeting.contains("Good morning!"));
        assert!(greeting.contains("AtaBot"));
    }

    #[test]
    fn test_generate_response() {
        let plugin = seeded(3);
        let response = plugin.generate_response("tell me a joke");
        let jokes = plugin.selector().script().bank().get("jokes").unwrap();
        assert!(jokes.contains(&response));
    }

    #[test]
    fn test_greeting_tracks_message_count() {
        let plugin = seeded(3);
        plugin.generate_response("hello");
        assert_eq!(plugin.user_message_count(), 1);
        let greeting = plugin.greeting_at(14);
        assert!(greeting.starts_with("Good afternoon!"));
        assert!(greeting.ends_with("What else can we explore together?"));
    }

    #[test]
    fn test_reset_history() {
        let plugin = seeded(3);
        plugin.generate_response("hello");
        let cleared = plugin.reset_history();
        assert!(cleared.starts_with("Conversation cleared!"));
        assert!(plugin.history().is_empty());
        assert_eq!(plugin.user_message_count(), 0);
    }

    #[test]
    fn test_with_config_rejects_zero_cap() {
        let config = AtaBotConfig {
            max_stored_messages: 0,
            ..AtaBotConfig::default()
        };
        assert!(matches!(
            AtaBotPlugin::with_config(config),
            Err(AtaBotError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_with_config_missing_script() {
        let config = AtaBotConfig {
            script_path: Some("/nonexistent/atabot.json".into()),
            ..AtaBotConfig::default()
        };
        assert!(matches!(
            AtaBotPlugin::with_config(config),
            Err(AtaBotError::Io(_))
        ));
    }

    #[test]
    fn test_with_config_file_history() {
        let dir = tempfile::tempdir().unwrap();
        let config = AtaBotConfig {
            history_dir: Some(dir.path().to_path_buf()),
            seed: Some(9),
            ..AtaBotConfig::default()
        };

        let plugin = AtaBotPlugin::with_config(config.clone()).unwrap();
        plugin.generate_response("hello");
        assert!(dir.path().join(format!("{HISTORY_KEY}.json")).exists());

        let reopened = AtaBotPlugin::with_config(config).unwrap();
        assert_eq!(reopened.history(), plugin.history());
    }
}
