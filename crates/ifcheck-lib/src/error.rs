//! Error kinds raised by discovery and check evaluation

use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Debug, Error)]
pub enum CheckError {
    /// A counter was seen for the first time (or time did not advance).
    /// The new sample has been stored; the next cycle can produce a rate.
    #[error("no baseline yet: {0}")]
    NoBaselineYet(String),

    /// Malformed rule, pattern or parameter set
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed agent row
    #[error("parse error: {0}")]
    Parse(String),

    /// No interface in the current poll matches the item
    #[error("item not found: {0}")]
    ItemNotFound(String),
}

impl CheckError {
    pub fn no_baseline(key: impl Into<String>) -> Self {
        Self::NoBaselineYet(key.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// True when the error only signals counter initialisation
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::NoBaselineYet(_))
    }
}
