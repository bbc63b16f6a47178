//! Per-unit translation pipeline
//!
//! Ties the pieces together for one paragraph-sized unit: optional source
//! glossary replacement, tokenization, the backend call, markup projection,
//! optional glossary splicing and re-assembly into an [`AnnotatedText`].
//!
//! A unit that fails is replaced by a visible failure marker; the other units
//! are unaffected.

use crate::align::backend::TranslatorAligner;
use crate::align::projection::project_markup;
use crate::align::words::{split_words, tokenize, words_to_annotated};
use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostic;
use crate::error::AlignResult;
use crate::glossary::{Glossary, GlossaryMethod, apply_glossary, replace_in_source};
use crate::markup::AnnotatedText;

/// A translated unit and what was lost on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTranslation {
    pub text: AnnotatedText,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Translated(UnitTranslation),
    /// The unit could not be translated; `marker` takes its place
    Failed { marker: AnnotatedText, error: String },
}

impl UnitOutcome {
    /// The text to put back into the document
    pub fn text(&self) -> &AnnotatedText {
        match self {
            UnitOutcome::Translated(translation) => &translation.text,
            UnitOutcome::Failed { marker, .. } => marker,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UnitOutcome::Failed { .. })
    }
}

pub struct TranslationPipeline {
    backend: Box<dyn TranslatorAligner>,
    glossary: Glossary,
    config: PipelineConfig,
}

impl TranslationPipeline {
    pub fn new(backend: Box<dyn TranslatorAligner>, config: PipelineConfig) -> Self {
        Self {
            backend,
            glossary: Glossary::new(),
            config,
        }
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The glossary method in effect for this pipeline's backend
    pub fn glossary_method(&self) -> GlossaryMethod {
        self.config
            .glossary_method
            .resolve(self.backend.supports_glossary(), self.config.glossary_fallback)
    }

    /// Translate one unit, carrying its markup over to the translation.
    ///
    /// Surrounding whitespace is kept out of the backend call and restored
    /// around the result.
    pub async fn translate_unit(&self, unit: &AnnotatedText) -> AlignResult<UnitTranslation> {
        let method = self.glossary_method();
        let use_glossary = !self.glossary.is_empty();

        let source = if use_glossary && method == GlossaryMethod::SourceReplace {
            replace_in_source(unit, &self.glossary)?
        } else {
            unit.clone()
        };

        let stripped = source.strip();
        if stripped.text.is_empty() {
            return Ok(UnitTranslation {
                text: source,
                diagnostics: Vec::new(),
            });
        }

        let (source_words, source_spans) = tokenize(&stripped.text);
        let native_glossary = if method == GlossaryMethod::Builtin {
            self.glossary.clone()
        } else {
            Glossary::new()
        };

        let output = self
            .backend
            .translate(
                &stripped.text,
                &source_words,
                &self.config.source_lang,
                &self.config.target_lang,
                &native_glossary,
            )
            .await?;

        let target_words = split_words(&output.target_text);
        let relation = output.alignment.resolve(self.config.alignment_threshold)?;
        relation.check_dims(target_words.len(), source_words.len())?;

        let projection = project_markup(&source_words, &source_spans, &relation)?;
        let mut diagnostics = projection.diagnostics;

        let (words, spans) = if use_glossary && method == GlossaryMethod::Align {
            let splice = apply_glossary(
                &self.glossary,
                &source_words,
                &target_words,
                &projection.spans,
                &relation,
            )?;
            diagnostics.extend(splice.diagnostics);
            (splice.words, splice.spans)
        } else {
            (target_words, projection.spans)
        };

        let translated = words_to_annotated(&words, &spans)?;
        let text = AnnotatedText::plain(stripped.leading).concat(&translated) + stripped.trailing.as_str();

        tracing::debug!(
            provider = self.backend.provider_name(),
            method = %method,
            source_words = source_words.len(),
            target_words = words.len(),
            diagnostics = diagnostics.len(),
            "Translated unit"
        );

        Ok(UnitTranslation { text, diagnostics })
    }

    /// Translate units in order. A failing unit is replaced by the configured
    /// failure marker and the remaining units are still translated.
    pub async fn translate_units(&self, units: &[AnnotatedText]) -> Vec<UnitOutcome> {
        let mut outcomes = Vec::with_capacity(units.len());

        for (index, unit) in units.iter().enumerate() {
            match self.translate_unit(unit).await {
                Ok(translation) => outcomes.push(UnitOutcome::Translated(translation)),
                Err(e) => {
                    let error = e.to_string();
                    tracing::warn!(unit = index, error = %error, "Unit translation failed");
                    outcomes.push(UnitOutcome::Failed {
                        marker: AnnotatedText::plain(self.config.render_failure(&error)),
                        error,
                    });
                }
            }
        }

        let failed = outcomes.iter().filter(|outcome| outcome.is_failed()).count();
        tracing::info!(
            units = units.len(),
            failed,
            provider = self.backend.provider_name(),
            "Translated {} units",
            units.len()
        );

        outcomes
    }
}
