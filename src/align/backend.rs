//! Translation/alignment backend boundary
//!
//! A backend translates one unit and reports which target words correspond
//! to which source words. How it gets there (a local model's attention
//! weights, a dedicated aligner, a remote API plus an aligner) is opaque to
//! the rest of the crate.
//!
//! # Example
//!
//! ```ignore
//! use latexmt_core::align::{MockAligner, MockMode, TranslatorAligner, tokenize};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MockAligner::new(MockMode::Identity);
//!     let source = AnnotatedText::plain("Hallo Welt");
//!     let (words, _) = tokenize(&source);
//!
//!     let output = backend
//!         .translate(&source, &words, "de", "en", &Glossary::new())
//!         .await?;
//!     println!("{}", output.target_text);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::error::AlignResult;
use crate::glossary::Glossary;
use crate::markup::AnnotatedText;

use super::relation::AlignmentRelation;
use super::words::Word;

/// How a backend reports its word alignment
///
/// Rows are the words of `split_words(target_text)`, columns the source words
/// passed to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum WordAlignment {
    /// Already decided word pairs
    Relation(AlignmentRelation),
    /// Raw weights (e.g. averaged attention); the caller applies its threshold
    Weights(Vec<Vec<f32>>),
}

impl WordAlignment {
    /// The boolean relation, thresholding weights at `threshold` (inclusive)
    pub fn resolve(self, threshold: f32) -> AlignResult<AlignmentRelation> {
        match self {
            WordAlignment::Relation(relation) => Ok(relation),
            WordAlignment::Weights(rows) => AlignmentRelation::from_weights(&rows, threshold),
        }
    }
}

impl From<AlignmentRelation> for WordAlignment {
    fn from(relation: AlignmentRelation) -> Self {
        WordAlignment::Relation(relation)
    }
}

/// What a backend returns for one unit
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutput {
    /// Plain target text
    pub target_text: String,
    pub alignment: WordAlignment,
}

/// A translation backend that also aligns its output to the input words
///
/// All methods are async to support backends doing I/O (remote APIs, model
/// servers). Backends hold the expensive shared resource; callers running
/// units in parallel share one backend behind an `Arc`.
#[async_trait]
pub trait TranslatorAligner: Send + Sync {
    /// Translate one unit.
    ///
    /// # Arguments
    ///
    /// * `source` - The unit's text; markup is informational only
    /// * `source_words` - Words of `source`, defining the relation's columns
    /// * `source_lang` / `target_lang` - Language codes (e.g. "de", "en")
    /// * `glossary` - Terminology to enforce natively; empty unless the
    ///   pipeline delegates glossary handling to the backend
    ///
    /// # Returns
    ///
    /// * `Ok(BackendOutput)` - Target text and word alignment, either as
    ///   word pairs or as weights for the pipeline's threshold
    /// * `Err(AlignError::Backend)` - If translation fails
    async fn translate(
        &self,
        source: &AnnotatedText,
        source_words: &[Word],
        source_lang: &str,
        target_lang: &str,
        glossary: &Glossary,
    ) -> AlignResult<BackendOutput>;

    /// Whether `translate` honors the glossary argument
    fn supports_glossary(&self) -> bool {
        false
    }

    /// Used for logging to identify which backend handled a unit
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_passes_through_threshold() {
        let alignment = WordAlignment::from(AlignmentRelation::identity(2));
        assert_eq!(alignment.resolve(0.9).unwrap(), AlignmentRelation::identity(2));
    }

    #[test]
    fn test_weights_threshold_is_inclusive() {
        let weights = WordAlignment::Weights(vec![vec![0.5, 0.2], vec![0.0, 0.7]]);
        let relation = weights.clone().resolve(0.5).unwrap();
        assert_eq!(relation, AlignmentRelation::identity(2));

        let loose = weights.resolve(0.2).unwrap();
        assert!(loose.is_aligned(0, 1));
        assert_eq!(loose.pair_count(), 3);
    }
}
