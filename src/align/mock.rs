//! Mock translation/alignment backend for testing
//!
//! Translates word by word and aligns every target word to the source words
//! whose translation it overlaps. Deterministic, no model, no network.
//!
//! # Example
//!
//! ```ignore
//! use latexmt_core::align::{MockAligner, MockMode, TranslatorAligner};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockAligner::new(MockMode::Reorder);
//!     let source = AnnotatedText::plain("hello world");
//!     let (words, _) = tokenize(&source);
//!     let output = mock.translate(&source, &words, "en", "de", &Glossary::new()).await.unwrap();
//!     assert_eq!(output.target_text, "world hello");
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AlignError, AlignResult};
use crate::glossary::Glossary;
use crate::markup::AnnotatedText;

use super::backend::{BackendOutput, TranslatorAligner};
use super::relation::AlignmentRelation;
use super::words::{Word, split_words};

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Return the input unchanged
    Identity,

    /// Translate words through a lowercase word → translation map; unknown
    /// words pass through
    Dictionary(HashMap<String, String>),

    /// Reverse the order of the words, leaving separators in place
    /// (simulates word-order-changing language pairs)
    Reorder,

    /// Simulate backend errors
    Error(String),
}

/// Mock backend that simulates various translation scenarios
#[derive(Debug, Clone)]
pub struct MockAligner {
    mode: MockMode,
    /// Optional simulated model latency (in milliseconds)
    delay_ms: u64,
    /// Apply single-word glossary entries while translating
    native_glossary: bool,
}

/// A translated source word placed in the target text
struct Piece {
    source: usize,
    /// Character range of the translation in the target text
    start: usize,
    end: usize,
}

impl MockAligner {
    /// Create a new MockAligner with the specified mode
    ///
    /// # Arguments
    ///
    /// * `mode` - How words are translated (identity, dictionary, reorder,
    ///   or a forced error)
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockAligner::new(MockMode::Reorder);
    /// ```
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay_ms: 0,
            native_glossary: false,
        }
    }

    /// Create a MockAligner with simulated model latency
    ///
    /// # Arguments
    ///
    /// * `mode` - The translation mode
    /// * `delay_ms` - Simulated delay in milliseconds
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockAligner::with_delay(MockMode::Identity, 50);
    /// // Each unit takes ~50ms
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Report glossary support and honor single-word entries
    ///
    /// With this set, the pipeline's `auto` glossary method resolves to
    /// `builtin` and hands the glossary to `translate`. Source words matching
    /// an entry (case-insensitively) are replaced by its target before the
    /// mode applies; multi-word entries are ignored.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockAligner::new(MockMode::Identity).with_native_glossary();
    /// assert!(mock.supports_glossary());
    /// ```
    pub fn with_native_glossary(mut self) -> Self {
        self.native_glossary = true;
        self
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn translate_word(&self, word: &str, glossary: &Glossary) -> String {
        if word.is_empty() {
            return String::new();
        }
        if self.native_glossary {
            let forced = glossary
                .iter()
                .find(|entry| entry.source.trim().to_lowercase() == word.to_lowercase());
            if let Some(entry) = forced {
                return entry.target.trim().to_string();
            }
        }

        match &self.mode {
            MockMode::Dictionary(map) => match map.get(&word.to_lowercase()) {
                Some(translation) if word.chars().next().is_some_and(char::is_uppercase) => {
                    let mut chars = translation.chars();
                    chars
                        .next()
                        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                        .unwrap_or_default()
                }
                Some(translation) => translation.clone(),
                None => word.to_string(),
            },
            _ => word.to_string(),
        }
    }

    fn build(&self, source_words: &[Word], glossary: &Glossary) -> AlignResult<BackendOutput> {
        let order: Vec<usize> = match &self.mode {
            MockMode::Error(msg) => return Err(AlignError::backend(msg.clone())),
            MockMode::Reorder => {
                let mut content: Vec<usize> = (0..source_words.len())
                    .filter(|&i| !source_words[i].text.is_empty())
                    .collect();
                content.reverse();
                let mut reversed = content.into_iter();
                (0..source_words.len())
                    .map(|i| {
                        if source_words[i].text.is_empty() {
                            i
                        } else {
                            reversed.next().unwrap_or(i)
                        }
                    })
                    .collect()
            }
            _ => (0..source_words.len()).collect(),
        };

        let mut target_text = String::new();
        let mut pieces = Vec::with_capacity(order.len());
        let mut pos = 0;
        for (slot, &source) in order.iter().enumerate() {
            let translation = self.translate_word(&source_words[source].text, glossary);
            let len = translation.chars().count();
            pieces.push(Piece {
                source,
                start: pos,
                end: pos + len,
            });
            target_text.push_str(&translation);
            // separators stay where they were
            let separator = &source_words[slot].trailing_space;
            target_text.push_str(separator);
            pos += len + separator.chars().count();
        }

        let target_words = split_words(&target_text);
        let mut relation = AlignmentRelation::new(target_words.len(), source_words.len());
        let mut word_start = 0;
        for (target, word) in target_words.iter().enumerate() {
            let word_end = word_start + word.text.chars().count();
            for piece in &pieces {
                if piece.start < word_end && word_start < piece.end {
                    relation.align(target, piece.source)?;
                }
            }
            word_start += word.char_len();
        }

        Ok(BackendOutput {
            target_text,
            alignment: relation.into(),
        })
    }
}

#[async_trait]
impl TranslatorAligner for MockAligner {
    async fn translate(
        &self,
        _source: &AnnotatedText,
        source_words: &[Word],
        source_lang: &str,
        target_lang: &str,
        glossary: &Glossary,
    ) -> AlignResult<BackendOutput> {
        self.apply_delay().await;

        let output = self.build(source_words, glossary)?;
        tracing::debug!(
            provider = self.provider_name(),
            source_lang,
            target_lang,
            target = %output.target_text,
            "Mock translation"
        );
        Ok(output)
    }

    fn supports_glossary(&self) -> bool {
        self.native_glossary
    }

    fn provider_name(&self) -> &str {
        "Mock Aligner"
    }
}
