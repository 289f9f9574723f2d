//! AtaBot Greeting Provider
//!
//! Greets according to the local time of day and how far into the
//! conversation the user is.

use chrono::{Local, Timelike};

use super::{ProviderContext, ProviderResult};
use crate::script::GreetingTemplates;
use crate::AtaBotPlugin;

/// Part of the day used to pick a greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    /// 06:00 to 11:59
    Morning,
    /// 12:00 to 17:59
    Afternoon,
    /// 18:00 to 21:59
    Evening,
    /// Everything else
    Night,
}

impl DayPart {
    /// Maps an hour (0-23) to a part of the day.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => DayPart::Morning,
            12..=17 => DayPart::Afternoon,
            18..=21 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }
}

/// Builds the greeting for `hour` given how many messages the user has sent.
pub fn contextual_greeting(templates: &GreetingTemplates, hour: u32, message_count: u32) -> String {
    let greeting = match DayPart::from_hour(hour) {
        DayPart::Morning => &templates.morning,
        DayPart::Afternoon => &templates.afternoon,
        DayPart::Evening => &templates.evening,
        DayPart::Night => &templates.night,
    };
    let template = match message_count {
        0 => &templates.first_visit,
        1 | 2 => &templates.early,
        _ => &templates.returning,
    };
    template
        .replace("{greeting_lower}", &greeting.to_lowercase())
        .replace("{greeting}", greeting)
        .replace("{round}", &(u64::from(message_count) + 1).to_string())
}

/// The current local hour.
pub fn local_hour() -> u32 {
    Local::now().hour()
}

/// Provider for the AtaBot greeting message.
pub struct AtaBotGreetingProvider;

impl AtaBotGreetingProvider {
    /// Returns the provider name.
    pub fn name(&self) -> &'static str {
        "atabot-greeting"
    }

    /// Returns the provider description.
    pub fn description(&self) -> &'static str {
        "Provides a time-of-day aware AtaBot greeting."
    }

    /// Gets the provider data.
    pub fn get(&self, plugin: &AtaBotPlugin, context: &ProviderContext) -> ProviderResult {
        let hour = context.hour.unwrap_or_else(local_hour);
        let message_count = plugin.user_message_count();
        let greeting = plugin.greeting_at(hour);

        ProviderResult {
            text: greeting.clone(),
            values: serde_json::json!({
                "greeting": greeting
            }),
            data: serde_json::json!({
                "greeting": greeting,
                "hour": hour,
                "messageCount": message_count
            }),
        }
    }
}
