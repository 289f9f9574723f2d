//! AtaBot actions
//!
//! Provides action implementations for the AtaBot chatbot.

mod generate_response;
mod quick_reply;

pub use generate_response::GenerateResponseAction;
pub use quick_reply::QuickReplyAction;

use serde::Serialize;
use serde_json::Value;

use crate::AtaBotPlugin;

/// Action result structure
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Whether the action succeeded
    pub success: bool,
    /// Response text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured data about the reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionResult {
    pub(crate) fn ok(text: String, data: Value) -> Self {
        Self {
            success: true,
            text: Some(text),
            error: None,
            data: Some(data),
        }
    }

    /// A failure with no reply text.
    pub fn failure(error: &str) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.to_string()),
            data: None,
        }
    }

    pub(crate) fn failed(text: &str, error: &str) -> Self {
        Self {
            success: false,
            text: Some(text.to_string()),
            error: Some(error.to_string()),
            data: None,
        }
    }
}

/// Action example for documentation
pub struct ActionExample {
    /// Example input
    pub input: String,
    /// Example output
    pub output: String,
}

/// Common surface of AtaBot actions.
pub trait ChatAction: Send + Sync {
    /// Returns the action name.
    fn name(&self) -> &'static str;

    /// Returns action aliases.
    fn similes(&self) -> Vec<&'static str>;

    /// Returns the action description.
    fn description(&self) -> &'static str;

    /// Validates whether this action should handle the message.
    fn validate(&self, plugin: &AtaBotPlugin, message_text: &str) -> bool;

    /// Handles the action.
    fn handler(&self, plugin: &AtaBotPlugin, input: &str) -> ActionResult;

    /// Returns action examples.
    fn examples(&self) -> Vec<ActionExample>;
}

/// Returns all available actions.
pub fn get_actions() -> Vec<Box<dyn ChatAction>> {
    vec![Box::new(GenerateResponseAction), Box::new(QuickReplyAction)]
}

/// Finds an action by name or simile, ignoring case.
pub fn find_action(name: &str) -> Option<Box<dyn ChatAction>> {
    get_actions().into_iter().find(|action| {
        action.name().eq_ignore_ascii_case(name)
            || action.similes().iter().any(|s| s.eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_actions() {
        let actions = get_actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name(), "generate-response");
        assert_eq!(actions[1].name(), "quick-reply");
    }

    #[test]
    fn test_find_action_by_simile() {
        assert_eq!(find_action("ATABOT_CHAT").map(|a| a.name()), Some("generate-response"));
        assert_eq!(find_action("Quick-Reply").map(|a| a.name()), Some("quick-reply"));
        assert!(find_action("dance").is_none());
    }
}
