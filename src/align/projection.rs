//! Projection of source markup onto target words.
//!
//! Every source span is mapped to the target words aligned to any of its
//! words. A span whose words are aligned to scattered target positions yields
//! one target span per run of consecutive target words; a span with no
//! aligned target word is dropped and reported.

use crate::diagnostics::Diagnostic;
use crate::error::{AlignError, AlignResult};
use crate::markup::Span;

use super::relation::{AlignmentRelation, contiguous_runs};
use super::words::{Word, phrase_text};

/// Target markup produced by [`project_markup`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Spans over target word indices, in source span order
    pub spans: Vec<Span>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Project word-granular source spans onto target word indices.
///
/// # Errors
/// `MalformedInput` when the relation's source width differs from the number
/// of source words or a span reaches past the source words.
pub fn project_markup(
    source_words: &[Word],
    source_spans: &[Span],
    relation: &AlignmentRelation,
) -> AlignResult<Projection> {
    relation.check_source_dim(source_words.len())?;
    for span in source_spans {
        if span.start > span.end || span.end > source_words.len() {
            return Err(AlignError::malformed(format!(
                "source span '{}' {}..{} out of bounds for {} words",
                span.label,
                span.start,
                span.end,
                source_words.len()
            )));
        }
    }

    let mut projection = Projection::default();
    for span in source_spans {
        let targets = relation.aligned_targets(span.start..span.end);
        if targets.is_empty() {
            let content = phrase_text(&source_words[span.start..span.end]);
            projection
                .diagnostics
                .push(Diagnostic::unmapped_span(content, span.label.clone()).emit());
            continue;
        }

        for run in contiguous_runs(&targets) {
            projection
                .spans
                .push(Span::new(span.label.clone(), *run.start(), *run.end() + 1));
        }
    }

    tracing::debug!(
        source_spans = source_spans.len(),
        target_spans = projection.spans.len(),
        dropped = projection.diagnostics.len(),
        "Projected markup onto target words"
    );

    Ok(projection)
}
