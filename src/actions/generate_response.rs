//! Generate response action for AtaBot
//!
//! Routes the user's message through the keyword rules and answers from the
//! matching response category.

use super::{ActionExample, ActionResult, ChatAction};
use crate::AtaBotPlugin;

/// Action to generate AtaBot responses using keyword routing.
pub struct GenerateResponseAction;

impl ChatAction for GenerateResponseAction {
    fn name(&self) -> &'static str {
        "generate-response"
    }

    fn similes(&self) -> Vec<&'static str> {
        vec!["ATABOT_RESPOND", "ATABOT_CHAT", "SCRIPTED_CHAT"]
    }

    fn description(&self) -> &'static str {
        "Generate an AtaBot response for user input using scripted keyword routing."
    }

    fn validate(&self, _plugin: &AtaBotPlugin, _message_text: &str) -> bool {
        true
    }

    fn handler(&self, plugin: &AtaBotPlugin, user_input: &str) -> ActionResult {
        if user_input.trim().is_empty() {
            return ActionResult::failed(
                "I need something to respond to. What would you like to talk about?",
                "No user input provided",
            );
        }

        let selection = plugin.respond(user_input);
        ActionResult::ok(
            selection.text,
            serde_json::json!({
                "category": selection.category,
                "trigger": selection.trigger,
            }),
        )
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![
            ActionExample {
                input: "Can you write code for me?".to_string(),
                output: "I'll let AtaBot answer that.".to_string(),
            },
            ActionExample {
                input: "Tell me a joke".to_string(),
                output: "I'll ask AtaBot for a programming joke.".to_string(),
            },
        ]
    }
}
