//! Word-level alignment of markup
//!
//! This module carries character-level markup from a source unit over to its
//! translation. Markup is moved through words: the source is tokenized into
//! words and word spans, a backend translates the unit and aligns target
//! words to source words, and every source span is projected onto the target
//! words aligned to it.
//!
//! # Overview
//!
//! 1. **Tokenizer** ([`words`]) - Words with their trailing separators, and
//!    markup as spans over word indices
//! 2. **Subword attribution** ([`subword`]) - Maps a model's subword tokens to
//!    words so token alignments can be lifted to word level
//! 3. **Alignment relation** ([`relation`]) - Boolean target × source word
//!    matrix, built from a matrix, weights, word pairs or token pairs
//! 4. **Projection** ([`projection`]) - Source word spans to target word spans
//! 5. **Backends** ([`backend`], [`mock`]) - The translation/alignment boundary
//!    and a deterministic mock
//!
//! # Example
//!
//! ```ignore
//! use latexmt_core::align::{AlignmentRelation, project_markup, split_words, tokenize};
//!
//! let source = AnnotatedText::new("The cat sat", vec![Span::new("emph", 4, 7)])?;
//! let (source_words, source_spans) = tokenize(&source);
//! let target_words = split_words("Die Katze saß");
//! let relation = AlignmentRelation::identity(3);
//!
//! let projection = project_markup(&source_words, &source_spans, &relation)?;
//! let text = words_to_annotated(&target_words, &projection.spans)?;
//! assert_eq!(text.spans(), &[Span::new("emph", 4, 9)]);
//! ```
pub mod backend;
pub mod integration_tests;
pub mod mock;
pub mod projection;
pub mod relation;
pub mod subword;
pub mod words;

pub use backend::{BackendOutput, TranslatorAligner, WordAlignment};
pub use mock::{MockAligner, MockMode};
pub use projection::{Projection, project_markup};
pub use relation::{AlignmentRelation, contiguous_runs};
pub use subword::{SubwordTokenizer, TokenizedWords, tokenize_words};
pub use words::{Word, phrase_text, split_words, tokenize, words_to_annotated, words_to_plain};
