//! Markup-preserving alignment projection and glossary splicing for
//! paragraph-level machine translation.
//!
//! A document layer hands over one [`AnnotatedText`] per translatable unit.
//! The unit is split into words, translated by a [`TranslatorAligner`]
//! backend that also aligns target words to source words, and its markup is
//! projected onto the translation along that alignment. A terminology
//! [`Glossary`] can be enforced on the way.
//!
//! ```ignore
//! use latexmt_core::{AnnotatedText, MockAligner, MockMode, PipelineConfig, Span, TranslationPipeline};
//!
//! let pipeline = TranslationPipeline::new(Box::new(MockAligner::new(MockMode::Identity)), PipelineConfig::default());
//! let unit = AnnotatedText::new("Die Katze schläft", vec![Span::new("emph", 4, 9)])?;
//! let translation = pipeline.translate_unit(&unit).await?;
//! ```

pub mod align;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod glossary;
pub mod markup;
pub mod pipeline;

pub use align::{
    AlignmentRelation, BackendOutput, MockAligner, MockMode, Projection, SubwordTokenizer,
    TokenizedWords, TranslatorAligner, Word, WordAlignment, project_markup, split_words, tokenize,
    tokenize_words, words_to_annotated, words_to_plain,
};
pub use config::PipelineConfig;
pub use diagnostics::{Diagnostic, DiagnosticContext, DiagnosticKind};
pub use error::{AlignError, AlignResult};
pub use glossary::{
    Glossary, GlossaryEntry, GlossaryMethod, Splice, apply_glossary, replace_in_source,
};
pub use markup::{AnnotatedText, MarkupNode, Span, Stripped};
pub use pipeline::{TranslationPipeline, UnitOutcome, UnitTranslation};
