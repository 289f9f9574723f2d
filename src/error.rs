#![allow(missing_docs)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtaBotError>;

/// Raised while loading or validating a response script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Script is not valid JSON for the response schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response bank has no categories")]
    EmptyBank,

    #[error("Category '{0}' has no responses")]
    EmptyCategory(String),

    #[error("Category '{category}' has a blank response at index {index}")]
    BlankResponse { category: String, index: usize },

    #[error("{owner} refers to unknown category '{category}'")]
    UnknownCategory { owner: String, category: String },

    #[error("Rule {index} ({category}) has no words to match")]
    EmptyWordList { index: usize, category: String },

    #[error("Rule {index} ({category}) has an invalid pattern: {source}")]
    InvalidPattern {
        index: usize,
        category: String,
        #[source]
        source: regex::Error,
    },

    #[error("Easter egg at index {0} has an empty trigger")]
    EmptyTrigger(usize),

    #[error("Easter egg trigger '{0}' is declared twice")]
    DuplicateTrigger(String),

    #[error("At least one fallback category is required")]
    NoFallback,

    #[error("Easter egg category '{0}' collides with a response bank category")]
    EasterEggCategoryCollision(String),

    #[error("Quick action '{0}' is declared twice")]
    DuplicateQuickAction(String),
}

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum AtaBotError {
    #[error("Invalid response script: {0}")]
    Script(#[from] ScriptError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
