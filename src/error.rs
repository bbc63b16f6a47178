//! Error types for markup projection and glossary splicing.
//!
//! Only integration mistakes surface as errors. Expected "no alignment found"
//! outcomes are reported as [`crate::diagnostics::Diagnostic`] values instead.

use thiserror::Error;

/// Errors that abort a single operation
#[derive(Error, Debug)]
pub enum AlignError {
    /// Spans out of bounds, relation dimensions disagreeing with word counts,
    /// unbalanced markup lists and similar caller mistakes
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A glossary source could not be read
    #[error("Glossary error: {0}")]
    Glossary(String),

    /// The translation/alignment backend reported a failure
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AlignError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        AlignError::MalformedInput(msg.into())
    }

    pub fn glossary(msg: impl Into<String>) -> Self {
        AlignError::Glossary(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        AlignError::Backend(msg.into())
    }

    /// Whether the error stems from inconsistent caller data rather than I/O
    /// or a backend
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, AlignError::MalformedInput(_))
    }
}

/// Result type for alignment operations
pub type AlignResult<T> = Result<T, AlignError>;
