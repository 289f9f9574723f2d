//! Per-session conversation state.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Most recent categories kept for repeat avoidance.
pub const RECENCY_LIMIT: usize = 5;

/// Small per-session state consulted and updated by the selector.
///
/// Holds the recency list, the session's random source, and the counters
/// used for easter-egg repeats and contextual greetings.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    recent: VecDeque<String>,
    last_pick: Option<(String, usize)>,
    easter_egg_hits: HashMap<String, u32>,
    user_message_count: u32,
    rng: StdRng,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    /// Creates a context seeded from system entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a context whose selections are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            recent: VecDeque::with_capacity(RECENCY_LIMIT),
            last_pick: None,
            easter_egg_hits: HashMap::new(),
            user_message_count: 0,
            rng,
        }
    }

    /// Recently used categories, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> + '_ {
        self.recent.iter().map(String::as_str)
    }

    /// Number of categories in the recency list.
    pub fn recent_len(&self) -> usize {
        self.recent.len()
    }

    /// The category used by the previous reply.
    pub fn last_category(&self) -> Option<&str> {
        self.recent.back().map(String::as_str)
    }

    /// Appends a category, evicting the oldest beyond [`RECENCY_LIMIT`].
    pub fn record(&mut self, category: &str) {
        self.recent.push_back(category.to_string());
        while self.recent.len() > RECENCY_LIMIT {
            self.recent.pop_front();
        }
    }

    /// Replaces the recency list, keeping only the newest entries. The last
    /// pick is forgotten since it belonged to the replaced list.
    pub fn restore_recent<I>(&mut self, categories: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.recent.clear();
        self.last_pick = None;
        for category in categories {
            self.record(&category);
        }
    }

    /// Messages the user has sent since the last reset.
    pub fn user_message_count(&self) -> u32 {
        self.user_message_count
    }

    /// Times the given easter-egg trigger has fired in this session.
    pub fn easter_egg_hits(&self, trigger: &str) -> u32 {
        self.easter_egg_hits.get(trigger).copied().unwrap_or(0)
    }

    /// Forgets everything except the random source.
    pub fn reset(&mut self) {
        self.recent.clear();
        self.last_pick = None;
        self.easter_egg_hits.clear();
        self.user_message_count = 0;
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn last_pick(&self) -> Option<(&str, usize)> {
        self.last_pick.as_ref().map(|(c, i)| (c.as_str(), *i))
    }

    pub(crate) fn set_last_pick(&mut self, category: &str, index: usize) {
        self.last_pick = Some((category.to_string(), index));
    }

    pub(crate) fn count_user_message(&mut self) {
        self.user_message_count = self.user_message_count.saturating_add(1);
    }

    pub(crate) fn hit_easter_egg(&mut self, trigger: &str) -> u32 {
        let hits = self.easter_egg_hits.entry(trigger.to_string()).or_insert(0);
        *hits = hits.saturating_add(1);
        *hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_recency_is_bounded() {
        let mut ctx = ConversationContext::seeded(1);
        for i in 0..12 {
            ctx.record(&format!("c{i}"));
            assert!(ctx.recent_len() <= RECENCY_LIMIT);
        }
        assert_eq!(
            ctx.recent().collect::<Vec<_>>(),
            vec!["c7", "c8", "c9", "c10", "c11"]
        );
        assert_eq!(ctx.last_category(), Some("c11"));
    }

    #[test]
    fn test_restore_keeps_newest() {
        let mut ctx = ConversationContext::seeded(1);
        ctx.restore_recent((0..8).map(|i| format!("c{i}")));
        assert_eq!(
            ctx.recent().collect::<Vec<_>>(),
            vec!["c3", "c4", "c5", "c6", "c7"]
        );
    }

    #[test]
    fn test_restore_forgets_last_pick() {
        let mut ctx = ConversationContext::seeded(1);
        ctx.record("jokes");
        ctx.set_last_pick("jokes", 4);
        ctx.restore_recent(vec!["greetings".to_string()]);
        assert!(ctx.last_pick().is_none());
        assert_eq!(ctx.last_category(), Some("greetings"));
    }

    #[test]
    fn test_easter_egg_hits_count_per_trigger() {
        let mut ctx = ConversationContext::seeded(1);
        assert_eq!(ctx.hit_easter_egg("42"), 1);
        assert_eq!(ctx.hit_easter_egg("42"), 2);
        assert_eq!(ctx.hit_easter_egg("skynet"), 1);
        assert_eq!(ctx.easter_egg_hits("42"), 2);
        assert_eq!(ctx.easter_egg_hits("matrix"), 0);
    }

    #[test]
    fn test_reset() {
        let mut ctx = ConversationContext::seeded(1);
        ctx.record("jokes");
        ctx.count_user_message();
        ctx.hit_easter_egg("42");
        ctx.set_last_pick("jokes", 2);
        ctx.reset();
        assert_eq!(ctx.recent_len(), 0);
        assert_eq!(ctx.user_message_count(), 0);
        assert_eq!(ctx.easter_egg_hits("42"), 0);
        assert!(ctx.last_pick().is_none());
    }
}
