//! Configuration for the AtaBot plugin.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AtaBotError, Result};
use crate::history::MAX_STORED_MESSAGES;

/// Configuration for the AtaBot plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtaBotConfig {
    /// Response script to load instead of the embedded one
    pub script_path: Option<PathBuf>,
    /// Directory for the file-backed history store; in-memory when unset
    pub history_dir: Option<PathBuf>,
    /// Save the conversation after every exchange
    pub persist_history: bool,
    /// Newest messages kept when saving
    pub max_stored_messages: usize,
    /// Seed for reproducible replies
    pub seed: Option<u64>,
}

impl Default for AtaBotConfig {
    fn default() -> Self {
        Self {
            script_path: None,
            history_dir: None,
            persist_history: true,
            max_stored_messages: MAX_STORED_MESSAGES,
            seed: None,
        }
    }
}

impl AtaBotConfig {
    /// Create a new config from environment variables.
    ///
    /// `ATABOT_PERSIST_HISTORY` turns persistence off for `false`, `0`, `no`
    /// or `off`. Numbers that do not parse are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("ATABOT_SCRIPT_PATH") {
            if !val.trim().is_empty() {
                config.script_path = Some(PathBuf::from(val.trim()));
            }
        }

        if let Some(val) = lookup("ATABOT_HISTORY_DIR") {
            if !val.trim().is_empty() {
                config.history_dir = Some(PathBuf::from(val.trim()));
            }
        }

        if let Some(val) = lookup("ATABOT_PERSIST_HISTORY") {
            config.persist_history = !matches!(
                val.trim().to_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            );
        }

        if let Some(val) = lookup("ATABOT_MAX_STORED_MESSAGES") {
            match val.trim().parse() {
                Ok(n) => config.max_stored_messages = n,
                Err(e) => warn!("Ignoring ATABOT_MAX_STORED_MESSAGES={:?}: {}", val, e),
            }
        }

        if let Some(val) = lookup("ATABOT_SEED") {
            match val.trim().parse() {
                Ok(n) => config.seed = Some(n),
                Err(e) => warn!("Ignoring ATABOT_SEED={:?}: {}", val, e),
            }
        }

        config
    }

    /// Check the values that cannot be represented by the types alone.
    pub fn validate(&self) -> Result<()> {
        if self.max_stored_messages == 0 {
            return Err(AtaBotError::InvalidConfig(
                "maxStoredMessages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtaBotConfig::default();
        assert!(config.script_path.is_none());
        assert!(config.history_dir.is_none());
        assert!(config.persist_history);
        assert_eq!(config.max_stored_messages, 50);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AtaBotConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_stored_messages, 50);
        assert!(config.persist_history);
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_lookup_reads_every_variable() {
        let config = AtaBotConfig::from_lookup(lookup(&[
            ("ATABOT_SCRIPT_PATH", "/etc/atabot/script.json"),
            ("ATABOT_HISTORY_DIR", " /var/lib/atabot "),
            ("ATABOT_PERSIST_HISTORY", "true"),
            ("ATABOT_MAX_STORED_MESSAGES", "20"),
            ("ATABOT_SEED", "99"),
        ]));
        assert_eq!(config.script_path, Some(PathBuf::from("/etc/atabot/script.json")));
        assert_eq!(config.history_dir, Some(PathBuf::from("/var/lib/atabot")));
        assert!(config.persist_history);
        assert_eq!(config.max_stored_messages, 20);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_persist_history_false_spellings() {
        for off in ["false", "FALSE", "0", "no", "Off", " no "] {
            let config = AtaBotConfig::from_lookup(lookup(&[("ATABOT_PERSIST_HISTORY", off)]));
            assert!(!config.persist_history, "{off:?} should disable persistence");
        }
        for on in ["true", "1", "yes", ""] {
            let config = AtaBotConfig::from_lookup(lookup(&[("ATABOT_PERSIST_HISTORY", on)]));
            assert!(config.persist_history, "{on:?} should keep persistence");
        }
    }

    #[test]
    fn test_unparsable_numbers_keep_defaults() {
        let config = AtaBotConfig::from_lookup(lookup(&[
            ("ATABOT_MAX_STORED_MESSAGES", "abc"),
            ("ATABOT_SEED", "-3"),
            ("ATABOT_SCRIPT_PATH", "   "),
        ]));
        assert_eq!(config, AtaBotConfig::default());
    }

    #[test]
    fn test_from_env_script_path() {
        std::env::set_var("ATABOT_SCRIPT_PATH", "/tmp/atabot-script.json");
        let config = AtaBotConfig::from_env();
        std::env::remove_var("ATABOT_SCRIPT_PATH");
        assert_eq!(config.script_path, Some(PathBuf::from("/tmp/atabot-script.json")));
    }

    #[test]
    fn test_from_env_history_dir() {
        std::env::set_var("ATABOT_HISTORY_DIR", "/tmp/atabot-history");
        let config = AtaBotConfig::from_env();
        std::env::remove_var("ATABOT_HISTORY_DIR");
        assert_eq!(config.history_dir, Some(PathBuf::from("/tmp/atabot-history")));
    }

    #[test]
    fn test_from_env_persist_history() {
        std::env::set_var("ATABOT_PERSIST_HISTORY", "0");
        let config = AtaBotConfig::from_env();
        std::env::remove_var("ATABOT_PERSIST_HISTORY");
        assert!(!config.persist_history);
    }

    #[test]
    fn test_from_env_max_stored_messages() {
        std::env::set_var("ATABOT_MAX_STORED_MESSAGES", "12");
        let config = AtaBotConfig::from_env();
        std::env::remove_var("ATABOT_MAX_STORED_MESSAGES");
        assert_eq!(config.max_stored_messages, 12);
    }

    #[test]
    fn test_from_env_seed() {
        std::env::set_var("ATABOT_SEED", "4242");
        let config = AtaBotConfig::from_env();
        std::env::remove_var("ATABOT_SEED");
        assert_eq!(config.seed, Some(4242));
    }

    #[test]
    fn test_zero_cap_rejected() {
        let config = AtaBotConfig {
            max_stored_messages: 0,
            ..AtaBotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AtaBotError::InvalidConfig(_))
        ));
    }
}
