use thiserror::Error;

/// Failure taxonomy for the survey pipeline.
///
/// Lookup misses (unknown id, unknown category) are not errors; those paths
/// return `Option`/empty collections instead.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// A source file is missing or does not match the expected schema.
    /// Callers at the load boundary may degrade to an empty pool.
    #[error("data error: {0}")]
    Data(String),

    /// The corpus is too small or too empty to fit a vector index.
    /// Retrieval for the affected language is disabled; other languages
    /// are unaffected.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A requirements document is structurally malformed. Fatal: no partial
    /// output is written.
    #[error("invalid requirements: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SurveyError>;
