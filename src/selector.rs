//! Response selection: classify the input, then sample a reply.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::context::ConversationContext;
use crate::patterns::{first_match, Route};
use crate::script::ResponseScript;

/// Used only if a validated script somehow lacks its confusion category.
const BRAIN_FREEZE: &str = "I'm having a bit of a brain freeze. Try asking me something else! 🤖";

/// One reply and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Category the reply was drawn from.
    pub category: String,
    /// Reply text.
    pub text: String,
    /// Easter-egg trigger, when one fired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl Selection {
    /// Whether the reply came from an easter egg.
    pub fn is_easter_egg(&self) -> bool {
        self.trigger.is_some()
    }
}

/// Maps free text to canned replies using an immutable [`ResponseScript`].
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    script: Arc<ResponseScript>,
}

impl ResponseSelector {
    /// Creates a selector over a validated script.
    pub fn new(script: Arc<ResponseScript>) -> Self {
        Self { script }
    }

    /// The underlying script.
    pub fn script(&self) -> &ResponseScript {
        &self.script
    }

    /// Resolves the route for `input` without touching any session state.
    ///
    /// Blank input goes to the confusion category. `None` means no rule
    /// matched and the caller should fall back.
    pub fn resolve(&self, input: &str) -> Option<Route> {
        let lowered = input.to_lowercase();
        if lowered.trim().is_empty() {
            return Some(Route::Category(self.script.confusion_category().to_string()));
        }
        first_match(self.script.rules(), &lowered).cloned()
    }

    /// Selects a reply for `input` and records it in `context`.
    pub fn select(&self, input: &str, context: &mut ConversationContext) -> Selection {
        context.count_user_message();

        let route = match self.resolve(input) {
            Some(route) => route,
            None => Route::Category(self.fallback_category(context).to_string()),
        };

        let selection = match route {
            Route::EasterEgg(index) => self.easter_egg_reply(index, context),
            Route::Category(category) => self.category_reply(&category, context),
        };

        context.record(&selection.category);
        debug!(
            category = %selection.category,
            trigger = ?selection.trigger,
            "selected response"
        );
        selection
    }

    /// Selects a reply and returns only its text.
    pub fn select_response(&self, input: &str, context: &mut ConversationContext) -> String {
        self.select(input, context).text
    }

    /// Draws a reply straight from `category`, bypassing matching.
    ///
    /// Returns `None` for a category the bank does not hold.
    pub fn reply_from(&self, category: &str, context: &mut ConversationContext) -> Option<Selection> {
        let selection = self.draw(category, context)?;
        context.record(&selection.category);
        Some(selection)
    }

    fn fallback_category(&self, context: &mut ConversationContext) -> &str {
        let fallbacks = self.script.fallback_categories();
        let index = context.rng().gen_range(0..fallbacks.len());
        &fallbacks[index]
    }

    fn easter_egg_reply(&self, index: usize, context: &mut ConversationContext) -> Selection {
        let egg = match self.script.easter_egg(index) {
            Some(egg) => egg,
            None => return self.category_reply(self.script.confusion_category(), context),
        };

        let hits = context.hit_easter_egg(&egg.trigger);
        let mut text = egg.response.clone();
        if hits > 1 {
            if let Some(suffix) = self.script.easter_egg_repeat_suffix() {
                text.push_str(suffix);
            }
        }

        let category = self.script.easter_egg_category();
        context.set_last_pick(category, index);
        Selection {
            category: category.to_string(),
            text,
            trigger: Some(egg.trigger.clone()),
        }
    }

    fn category_reply(&self, category: &str, context: &mut ConversationContext) -> Selection {
        self.draw(category, context)
            .or_else(|| self.draw(self.script.confusion_category(), context))
            .unwrap_or_else(|| Selection {
                category: self.script.confusion_category().to_string(),
                text: BRAIN_FREEZE.to_string(),
                trigger: None,
            })
    }

    /// Random pick from a category. When the category repeats the previous
    /// reply's category, one resample is spent trying to avoid the same line.
    fn draw(&self, category: &str, context: &mut ConversationContext) -> Option<Selection> {
        let responses = self.script.bank().get(category)?;
        let len = responses.len();
        let mut index = context.rng().gen_range(0..len);

        if len > 1 && context.last_category() == Some(category) {
            let previous = context
                .last_pick()
                .filter(|(c, _)| *c == category)
                .map(|(_, i)| i);
            match previous {
                Some(previous) if previous != index => {}
                _ => index = context.rng().gen_range(0..len),
            }
        }

        context.set_last_pick(category, index);
        Some(Selection {
            category: category.to_string(),
            text: responses[index].clone(),
            trigger: None,
        })
    }
}
