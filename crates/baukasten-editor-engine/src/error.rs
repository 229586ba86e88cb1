use thiserror::Error;

/// Errors raised while building editor configuration from strings.
///
/// Editing itself never fails; only turning user-supplied text into triggers
/// and decorator rules can.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid decorator pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Trigger must be exactly one character, got {0:?}")]
    InvalidTrigger(String),
}
