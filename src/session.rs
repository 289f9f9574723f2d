//! A chat session: context, message log and optional persistence.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;

use crate::context::ConversationContext;
use crate::history::{
    load_conversation, save_conversation, ChatMessage, HistoryStore, Role, StoredConversation,
    MAX_STORED_MESSAGES,
};
use crate::script::QuickReply;
use crate::selector::{ResponseSelector, Selection};

const TYPING_DELAY_BASE_MS: u64 = 800;
const TYPING_DELAY_JITTER_MS: u64 = 1200;

/// Result of firing a quick action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickExchange {
    /// Registered id of the action.
    pub id: String,
    /// The user-side message the action stands for.
    pub prompt: String,
    /// What the bot answered.
    pub reply: String,
    /// Set when the reply was drawn from a category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// One user's conversation with the bot.
pub struct ChatSession {
    context: ConversationContext,
    messages: Vec<ChatMessage>,
    store: Option<Box<dyn HistoryStore>>,
    max_stored_messages: usize,
}

impl ChatSession {
    /// A session that keeps nothing beyond its own lifetime.
    pub fn new(context: ConversationContext) -> Self {
        Self {
            context,
            messages: Vec::new(),
            store: None,
            max_stored_messages: MAX_STORED_MESSAGES,
        }
    }

    /// A session backed by `store`. Saved history is loaded but not replayed;
    /// the saved recency list and last reply seed repeat avoidance.
    pub fn with_store(
        selector: &ResponseSelector,
        context: ConversationContext,
        store: Box<dyn HistoryStore>,
        max_stored_messages: usize,
    ) -> Self {
        let saved = load_conversation(store.as_ref());
        let mut session = Self {
            context,
            messages: Vec::new(),
            store: Some(store),
            max_stored_messages,
        };
        session.restore(selector, saved);
        session
    }

    /// Logs the user's message, selects a reply, logs it and persists.
    pub fn respond(&mut self, selector: &ResponseSelector, input: &str) -> Selection {
        self.push(ChatMessage::new(Role::User, input));
        let selection = selector.select(input, &mut self.context);
        self.push(ChatMessage::new(Role::Bot, selection.text.clone()));
        self.persist();
        selection
    }

    /// Fires a registered quick action. `None` if the id is unknown.
    pub fn quick_reply(&mut self, selector: &ResponseSelector, id: &str) -> Option<QuickExchange> {
        let action = selector.script().quick_action(id)?;
        let (reply, category) = match &action.reply {
            QuickReply::Fixed { text } => (text.clone(), None),
            QuickReply::Category { category } => {
                let selection = selector.reply_from(category, &mut self.context)?;
                (selection.text, Some(selection.category))
            }
        };

        self.push(ChatMessage::new(Role::User, action.prompt.clone()));
        self.push(ChatMessage::new(Role::Bot, reply.clone()));
        self.persist();

        Some(QuickExchange {
            id: action.id.clone(),
            prompt: action.prompt.clone(),
            reply,
            category,
        })
    }

    /// Forgets the conversation and returns the "cleared" line.
    pub fn clear(&mut self, selector: &ResponseSelector) -> String {
        self.context.reset();
        self.messages.clear();
        self.persist();
        selector.script().cleared_message().to_string()
    }

    /// The opening line shown before any conversation.
    pub fn welcome<'a>(&self, selector: &'a ResponseSelector) -> &'a str {
        selector.script().welcome_message()
    }

    /// A presentation-only "thinking" pause between 0.8 and 2 seconds.
    pub fn typing_delay(&mut self) -> Duration {
        let jitter = self.context.rng().gen_range(0..=TYPING_DELAY_JITTER_MS);
        Duration::from_millis(TYPING_DELAY_BASE_MS + jitter)
    }

    /// The message log, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Recency list, counters and random source of this session.
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Snapshot of what would be persisted.
    pub fn snapshot(&self) -> StoredConversation {
        StoredConversation {
            recent_categories: self.context.recent().map(str::to_string).collect(),
            messages: self.messages.clone(),
        }
    }

    /// Replaces the log and recency list, as when a host hands back history
    /// it saved itself.
    pub fn restore(&mut self, selector: &ResponseSelector, saved: StoredConversation) {
        self.context.restore_recent(saved.recent_categories);
        let skip = saved.messages.len().saturating_sub(self.max_stored_messages);
        self.messages = saved.messages.into_iter().skip(skip).collect();
        self.recall_last_pick(selector);
    }

    /// Points the last pick at the newest bot line, if that line belongs to
    /// the newest recent category.
    fn recall_last_pick(&mut self, selector: &ResponseSelector) {
        let category = match self.context.last_category() {
            Some(category) => category.to_string(),
            None => return,
        };
        let last_reply = self.messages.iter().rev().find(|m| m.role == Role::Bot);
        let responses = selector.script().bank().get(&category);
        if let (Some(reply), Some(responses)) = (last_reply, responses) {
            if let Some(index) = responses.iter().position(|r| *r == reply.text) {
                self.context.set_last_pick(&category, index);
            }
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > self.max_stored_messages {
            let excess = self.messages.len() - self.max_stored_messages;
            self.messages.drain(..excess);
        }
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            save_conversation(store.as_ref(), &self.snapshot(), self.max_stored_messages);
        }
    }
}
