#![allow(missing_docs)]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ScriptError;
use crate::patterns::{MatchRule, Pattern, PatternSpec, Route};

/// The script shipped with the crate.
pub const EMBEDDED_SCRIPT: &str = include_str!("../data/atabot.json");

lazy_static! {
    static ref DEFAULT_SCRIPT: Arc<ResponseScript> =
        Arc::new(ResponseScript::embedded().expect("data/atabot.json must be valid"));
}

/// Shared handle to the embedded script, validated on first use.
pub fn default_script() -> Arc<ResponseScript> {
    Arc::clone(&DEFAULT_SCRIPT)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScriptFile {
    pub name: String,
    pub confusion_category: String,
    pub fallback_categories: Vec<String>,
    pub easter_egg_category: String,
    #[serde(default)]
    pub easter_egg_repeat_suffix: Option<String>,
    #[serde(default)]
    pub easter_eggs: Vec<EasterEgg>,
    pub rules: Vec<RuleSpec>,
    pub categories: BTreeMap<String, Vec<String>>,
    pub greeting: GreetingTemplates,
    #[serde(default)]
    pub quick_actions: Vec<QuickAction>,
    pub cleared_message: String,
    pub welcome_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EasterEgg {
    pub trigger: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub category: String,
    pub pattern: PatternSpec,
}

/// Time-of-day greetings plus the three visit templates.
///
/// Visit templates understand `{greeting}`, `{greeting_lower}` and `{round}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GreetingTemplates {
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
    pub night: String,
    pub first_visit: String,
    pub early: String,
    pub returning: String,
}

/// A canned prompt the UI can fire without typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuickAction {
    pub id: String,
    pub prompt: String,
    pub reply: QuickReply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuickReply {
    Fixed { text: String },
    Category { category: String },
}

/// Category name to candidate responses. Every category holds at least one
/// non-blank response.
#[derive(Debug, Clone)]
pub struct ResponseBank {
    categories: BTreeMap<String, Vec<String>>,
}

impl ResponseBank {
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Result<Self, ScriptError> {
        if categories.is_empty() {
            return Err(ScriptError::EmptyBank);
        }
        for (name, responses) in &categories {
            if responses.is_empty() {
                return Err(ScriptError::EmptyCategory(name.clone()));
            }
            if let Some(index) = responses.iter().position(|r| r.trim().is_empty()) {
                return Err(ScriptError::BlankResponse {
                    category: name.clone(),
                    index,
                });
            }
        }
        Ok(Self { categories })
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// A validated script: the bank, the ordered rules and the surrounding copy.
#[derive(Debug, Clone)]
pub struct ResponseScript {
    name: String,
    bank: ResponseBank,
    rules: Vec<MatchRule>,
    easter_eggs: Vec<EasterEgg>,
    confusion_category: String,
    fallback_categories: Vec<String>,
    easter_egg_category: String,
    easter_egg_repeat_suffix: Option<String>,
    greeting: GreetingTemplates,
    quick_actions: Vec<QuickAction>,
    cleared_message: String,
    welcome_message: String,
}

impl ResponseScript {
    pub fn embedded() -> Result<Self, ScriptError> {
        Self::from_json(EMBEDDED_SCRIPT)
    }

    pub fn from_json(raw: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile = serde_json::from_str(raw)?;
        Self::compile(file)
    }

    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let script = Self::from_json(&raw)?;
        info!("Loaded response script '{}' from {}", script.name, path.display());
        Ok(script)
    }

    /// Validates a parsed script file and compiles its rules.
    ///
    /// Easter eggs are compiled first, in declaration order, followed by the
    /// declared rules. That order is the matching priority.
    pub fn compile(file: ScriptFile) -> Result<Self, ScriptError> {
        let bank = ResponseBank::new(file.categories)?;

        let require = |owner: String, category: &str| {
            if bank.contains(category) {
                Ok(())
            } else {
                Err(ScriptError::UnknownCategory {
                    owner,
                    category: category.to_string(),
                })
            }
        };

        require("confusionCategory".to_string(), &file.confusion_category)?;
        if file.fallback_categories.is_empty() {
            return Err(ScriptError::NoFallback);
        }
        for category in &file.fallback_categories {
            require("fallbackCategories".to_string(), category)?;
        }
        if bank.contains(&file.easter_egg_category) {
            return Err(ScriptError::EasterEggCategoryCollision(
                file.easter_egg_category,
            ));
        }

        let mut rules = Vec::with_capacity(file.easter_eggs.len() + file.rules.len());
        let mut easter_eggs = Vec::with_capacity(file.easter_eggs.len());
        let mut seen_triggers = HashSet::new();
        for (index, egg) in file.easter_eggs.into_iter().enumerate() {
            let trigger = egg.trigger.trim().to_lowercase();
            if trigger.is_empty() {
                return Err(ScriptError::EmptyTrigger(index));
            }
            if egg.response.trim().is_empty() {
                return Err(ScriptError::BlankResponse {
                    category: file.easter_egg_category.clone(),
                    index,
                });
            }
            if !seen_triggers.insert(trigger.clone()) {
                return Err(ScriptError::DuplicateTrigger(trigger));
            }
            rules.push(MatchRule::new(
                Pattern::Substring(trigger.clone()),
                Route::EasterEgg(index),
            ));
            easter_eggs.push(EasterEgg {
                trigger,
                response: egg.response,
            });
        }

        for (index, rule) in file.rules.iter().enumerate() {
            require(format!("rule {index}"), &rule.category)?;
            let pattern = Pattern::compile(&rule.pattern, index, &rule.category)?;
            rules.push(MatchRule::new(pattern, Route::Category(rule.category.clone())));
        }

        let mut seen_actions = HashSet::new();
        for action in &file.quick_actions {
            if !seen_actions.insert(action.id.as_str()) {
                return Err(ScriptError::DuplicateQuickAction(action.id.clone()));
            }
            if let QuickReply::Category { category } = &action.reply {
                require(format!("quick action '{}'", action.id), category)?;
            }
        }

        Ok(Self {
            name: file.name,
            bank,
            rules,
            easter_eggs,
            confusion_category: file.confusion_category,
            fallback_categories: file.fallback_categories,
            easter_egg_category: file.easter_egg_category,
            easter_egg_repeat_suffix: file.easter_egg_repeat_suffix,
            greeting: file.greeting,
            quick_actions: file.quick_actions,
            cleared_message: file.cleared_message,
            welcome_message: file.welcome_message,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bank(&self) -> &ResponseBank {
        &self.bank
    }

    /// Rules in matching priority order.
    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    pub fn easter_eggs(&self) -> &[EasterEgg] {
        &self.easter_eggs
    }

    pub fn easter_egg(&self, index: usize) -> Option<&EasterEgg> {
        self.easter_eggs.get(index)
    }

    pub fn confusion_category(&self) -> &str {
        &self.confusion_category
    }

    pub fn fallback_categories(&self) -> &[String] {
        &self.fallback_categories
    }

    pub fn easter_egg_category(&self) -> &str {
        &self.easter_egg_category
    }

    pub fn easter_egg_repeat_suffix(&self) -> Option<&str> {
        self.easter_egg_repeat_suffix.as_deref()
    }

    pub fn greeting(&self) -> &GreetingTemplates {
        &self.greeting
    }

    pub fn quick_actions(&self) -> &[QuickAction] {
        &self.quick_actions
    }

    pub fn quick_action(&self, id: &str) -> Option<&QuickAction> {
        let id = id.trim();
        self.quick_actions
            .iter()
            .find(|a| a.id.eq_ignore_ascii_case(id))
    }

    pub fn cleared_message(&self) -> &str {
        &self.cleared_message
    }

    pub fn welcome_message(&self) -> &str {
        &self.welcome_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded_file() -> ScriptFile {
        serde_json::from_str(EMBEDDED_SCRIPT).unwrap()
    }

    #[test]
    fn test_embedded_script_basic_integrity() {
        let script = ResponseScript::embedded().unwrap();
        assert_eq!(script.name(), "AtaBot");
        assert!(!script.bank().is_empty());
        assert!(!script.easter_eggs().is_empty());
        assert!(script.bank().contains(script.confusion_category()));
        assert_eq!(script.fallback_categories(), ["helpfulTips", "wittyBanter"]);
        assert_eq!(script.quick_actions().len(), 4);
    }

    #[test]
    fn test_easter_eggs_come_first() {
        let script = ResponseScript::embedded().unwrap();
        let eggs = script.easter_eggs().len();
        assert!(script.rules()[..eggs]
            .iter()
            .all(|r| matches!(r.route(), Route::EasterEgg(_))));
        assert!(script.rules()[eggs..]
            .iter()
            .all(|r| matches!(r.route(), Route::Category(_))));
        assert_eq!(
            script.rules()[eggs].route(),
            &Route::Category("greetings".to_string())
        );
    }

    #[test]
    fn test_unknown_rule_category_fails_fast() {
        let mut file = embedded_file();
        file.rules[0].category = "smallTalk".to_string();
        let err = ResponseScript::compile(file).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::UnknownCategory { ref category, .. } if category == "smallTalk"
        ));
    }

    #[test]
    fn test_empty_category_fails_fast() {
        let mut file = embedded_file();
        file.categories.insert("jokes".to_string(), Vec::new());
        let err = ResponseScript::compile(file).unwrap_err();
        assert!(matches!(err, ScriptError::EmptyCategory(ref c) if c == "jokes"));
    }

    #[test]
    fn test_empty_bank_fails_fast() {
        let mut file = embedded_file();
        file.categories.clear();
        assert!(matches!(
            ResponseScript::compile(file).unwrap_err(),
            ScriptError::EmptyBank
        ));
    }

    #[test]
    fn test_missing_fallback_fails_fast() {
        let mut file = embedded_file();
        file.fallback_categories.clear();
        assert!(matches!(
            ResponseScript::compile(file).unwrap_err(),
            ScriptError::NoFallback
        ));

        let mut file = embedded_file();
        file.confusion_category = "puzzled".to_string();
        assert!(matches!(
            ResponseScript::compile(file).unwrap_err(),
            ScriptError::UnknownCategory { .. }
        ));
    }

    #[test]
    fn test_duplicate_trigger_fails_fast() {
        let mut file = embedded_file();
        file.easter_eggs.push(EasterEgg {
            trigger: "  SKYNET ".to_string(),
            response: "again".to_string(),
        });
        assert!(matches!(
            ResponseScript::compile(file).unwrap_err(),
            ScriptError::DuplicateTrigger(ref t) if t == "skynet"
        ));
    }

    #[test]
    fn test_quick_action_category_checked() {
        let mut file = embedded_file();
        file.quick_actions.push(QuickAction {
            id: "poem".to_string(),
            prompt: "Write me a poem".to_string(),
            reply: QuickReply::Category {
                category: "poems".to_string(),
            },
        });
        assert!(matches!(
            ResponseScript::compile(file).unwrap_err(),
            ScriptError::UnknownCategory { .. }
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let raw = EMBEDDED_SCRIPT.replacen("\"name\"", "\"nickname\": \"x\", \"name\"", 1);
        assert!(matches!(
            ResponseScript::from_json(&raw).unwrap_err(),
            ScriptError::Parse(_)
        ));
    }

    #[test]
    fn test_quick_action_lookup_is_case_insensitive() {
        let script = default_script();
        assert_eq!(script.quick_action(" JOKE ").map(|a| a.id.as_str()), Some("joke"));
        assert!(script.quick_action("dance").is_none());
    }
}
