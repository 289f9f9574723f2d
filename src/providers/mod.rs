//! AtaBot providers
//!
//! Provides context data for AtaBot interactions.

mod atabot_greeting;

pub use atabot_greeting::{contextual_greeting, local_hour, AtaBotGreetingProvider, DayPart};

use serde_json::Value;

/// What the host knows when asking for provider data.
#[derive(Debug, Clone, Default)]
pub struct ProviderContext {
    /// Local hour (0-23) to greet for; the system clock when unset
    pub hour: Option<u32>,
}

/// Provider result structure
#[derive(Debug, Clone)]
pub struct ProviderResult {
    /// Human-readable text
    pub text: String,
    /// Key-value pairs
    pub values: Value,
    /// Structured data
    pub data: Value,
}

/// Returns all available providers.
pub fn get_providers() -> Vec<AtaBotGreetingProvider> {
    vec![AtaBotGreetingProvider]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_providers() {
        let providers = get_providers();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "atabot-greeting");
    }

    #[test]
    fn test_default_context_uses_clock() {
        assert_eq!(ProviderContext::default().hour, None);
    }
}
