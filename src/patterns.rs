//! Match patterns and the ordered rules built from them.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// A pattern as declared in the response script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatternSpec {
    /// Any of the words or phrases, on word boundaries.
    Words {
        /// Words or short phrases.
        words: Vec<String>,
    },
    /// Plain case-insensitive substring.
    Substring {
        /// Text to look for.
        text: String,
    },
    /// Case-insensitive regular expression.
    Regex {
        /// Regex source, without flags.
        pattern: String,
    },
    /// Input that is too short or carries no letters at all.
    Unintelligible {
        /// Inputs shorter than this many characters match.
        #[serde(rename = "minLength")]
        min_length: usize,
    },
}

/// A compiled pattern, evaluated against lower-cased input.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Compiled words or regex pattern.
    Regex(Regex),
    /// Lower-cased substring.
    Substring(String),
    /// Short or letterless input.
    Unintelligible {
        /// Minimum length, in characters, of an intelligible input.
        min_length: usize,
    },
}

impl Pattern {
    /// Compiles a declared pattern. `index` and `category` only feed error messages.
    pub fn compile(spec: &PatternSpec, index: usize, category: &str) -> Result<Self, ScriptError> {
        let empty = || ScriptError::EmptyWordList {
            index,
            category: category.to_string(),
        };
        let invalid = |source| ScriptError::InvalidPattern {
            index,
            category: category.to_string(),
            source,
        };

        match spec {
            PatternSpec::Words { words } => {
                let alternatives = words
                    .iter()
                    .map(|w| w.split_whitespace().collect::<Vec<_>>().join(" "))
                    .filter(|w| !w.is_empty())
                    .map(|w| bounded(&w.to_lowercase()))
                    .collect::<Vec<_>>();
                if alternatives.is_empty() {
                    return Err(empty());
                }
                let source = format!("(?i)(?:{})", alternatives.join("|"));
                Regex::new(&source).map(Pattern::Regex).map_err(invalid)
            }
            PatternSpec::Substring { text } => {
                let text = text.trim().to_lowercase();
                if text.is_empty() {
                    return Err(empty());
                }
                Ok(Pattern::Substring(text))
            }
            PatternSpec::Regex { pattern } => {
                if pattern.trim().is_empty() {
                    return Err(empty());
                }
                Regex::new(&format!("(?i){pattern}"))
                    .map(Pattern::Regex)
                    .map_err(invalid)
            }
            PatternSpec::Unintelligible { min_length } => Ok(Pattern::Unintelligible {
                min_length: *min_length,
            }),
        }
    }

    /// Tests the pattern. `lowered` must already be lower-cased.
    pub fn matches(&self, lowered: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(lowered),
            Pattern::Substring(text) => lowered.contains(text.as_str()),
            Pattern::Unintelligible { min_length } => {
                let trimmed = lowered.trim();
                trimmed.chars().count() < *min_length
                    || !trimmed.chars().any(|c| c.is_ascii_alphabetic())
            }
        }
    }
}

/// Where a matched rule sends the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Index into the script's easter eggs.
    EasterEgg(usize),
    /// A response bank category.
    Category(String),
}

/// One (pattern, target) pair. Rules are tried in order; first match wins.
#[derive(Debug, Clone)]
pub struct MatchRule {
    pub(crate) pattern: Pattern,
    pub(crate) route: Route,
}

impl MatchRule {
    /// Creates a rule.
    pub fn new(pattern: Pattern, route: Route) -> Self {
        Self { pattern, route }
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The rule's target.
    pub fn route(&self) -> &Route {
        &self.route
    }
}

/// Returns the route of the first rule matching `lowered`.
pub fn first_match<'a>(rules: &'a [MatchRule], lowered: &str) -> Option<&'a Route> {
    rules
        .iter()
        .find(|rule| rule.pattern.matches(lowered))
        .map(|rule| &rule.route)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escapes `word` and anchors it so it cannot match inside a longer word.
/// `\b` only holds next to a word character, so an edge such as the `+` in
/// `c++` is anchored on a non-word character or the end of input instead.
fn bounded(word: &str) -> String {
    let start = match word.chars().next() {
        Some(c) if is_word_char(c) => r"\b",
        _ => r"(?:^|\W)",
    };
    let end = match word.chars().last() {
        Some(c) if is_word_char(c) => r"\b",
        _ => r"(?:\W|$)",
    };
    format!("{start}{}{end}", regex::escape(word))
}
