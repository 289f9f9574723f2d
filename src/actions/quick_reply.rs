//! Quick reply action for AtaBot
//!
//! Fires one of the script's registered quick actions (`analyze`, `code`,
//! `joke`, `help`) by id.

use super::{ActionExample, ActionResult, ChatAction};
use crate::AtaBotPlugin;

/// Action that answers a canned quick-action prompt.
pub struct QuickReplyAction;

impl ChatAction for QuickReplyAction {
    fn name(&self) -> &'static str {
        "quick-reply"
    }

    fn similes(&self) -> Vec<&'static str> {
        vec!["ATABOT_QUICK_ACTION", "QUICK_ACTION"]
    }

    fn description(&self) -> &'static str {
        "Answer one of AtaBot's registered quick actions by id."
    }

    fn validate(&self, plugin: &AtaBotPlugin, message_text: &str) -> bool {
        plugin.selector().script().quick_action(message_text).is_some()
    }

    fn handler(&self, plugin: &AtaBotPlugin, action_id: &str) -> ActionResult {
        match plugin.quick_reply(action_id) {
            Some(exchange) => ActionResult::ok(
                exchange.reply,
                serde_json::json!({
                    "id": exchange.id,
                    "prompt": exchange.prompt,
                    "category": exchange.category,
                }),
            ),
            None => ActionResult::failed(
                "I don't know that shortcut. Try analyze, code, joke or help.",
                &format!("Unknown quick action: {}", action_id.trim()),
            ),
        }
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample {
            input: "joke".to_string(),
            output: "I'll fire AtaBot's joke shortcut.".to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_known_ids() {
        let plugin = AtaBotPlugin::new();
        let action = QuickReplyAction;
        assert!(action.validate(&plugin, "analyze"));
        assert!(action.validate(&plugin, "Help"));
        assert!(!action.validate(&plugin, "hello"));
    }

    #[test]
    fn test_handler_fixed_reply() {
        let plugin = AtaBotPlugin::new();
        let result = QuickReplyAction.handler(&plugin, "code");
        assert!(result.success);
        assert!(result.text.unwrap().starts_with("Absolutely!"));
    }

    #[test]
    fn test_handler_unknown_id() {
        let plugin = AtaBotPlugin::new();
        let result = QuickReplyAction.handler(&plugin, "dance");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown quick action: dance"));
    }
}
