//! Glossary splicing over aligned target words.
//!
//! Every occurrence of a glossary source phrase in the source words is
//! located, the target words aligned to it are found through the word
//! alignment, and those words are replaced by the glossary's target phrase.
//! Markup around the replaced words is kept in place.
//!
//! The target is edited as one stream of markers and tagged words. Words keep
//! their original index as a tag so later occurrences can still find them;
//! inserted words carry no index and can never be replaced again.

use std::ops::RangeInclusive;

use crate::align::relation::{AlignmentRelation, contiguous_runs};
use crate::align::words::{Word, phrase_text, split_words};
use crate::diagnostics::Diagnostic;
use crate::error::{AlignError, AlignResult};
use crate::markup::{Interleaved, Span, collect_interleaved, interleave};

use super::{Glossary, GlossaryEntry};

/// Target words and word spans after glossary substitution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Splice {
    pub words: Vec<Word>,
    pub spans: Vec<Span>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Original(usize),
    Inserted,
}

type Element = Interleaved<(Tag, Word)>;

/// A matched glossary phrase: source words `start..start + len`
struct Occurrence<'g> {
    entry: &'g GlossaryEntry,
    start: usize,
    len: usize,
}

/// Replace the target words aligned to glossary phrase occurrences.
///
/// Entries are processed in glossary order and, within an entry, occurrences
/// in source order. Each occurrence edits the result of the previous ones, so
/// overlapping phrases give order-dependent results.
///
/// # Errors
/// `MalformedInput` when the relation does not match the word counts or a
/// target span reaches past the target words.
pub fn apply_glossary(
    glossary: &Glossary,
    source_words: &[Word],
    target_words: &[Word],
    target_spans: &[Span],
    relation: &AlignmentRelation,
) -> AlignResult<Splice> {
    relation.check_dims(target_words.len(), source_words.len())?;
    for span in target_spans {
        if span.start > span.end || span.end > target_words.len() {
            return Err(AlignError::malformed(format!(
                "target span '{}' {}..{} out of bounds for {} words",
                span.label,
                span.start,
                span.end,
                target_words.len()
            )));
        }
    }

    let mut stream: Vec<Element> = interleave(
        target_words
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, word)| (Tag::Original(i), word)),
        target_spans,
    );
    let mut diagnostics = Vec::new();

    for occurrence in find_occurrences(glossary, source_words) {
        if let Err(diagnostic) = splice_occurrence(&mut stream, &occurrence, source_words, relation) {
            diagnostics.push(diagnostic.emit());
        }
    }

    let (items, spans) = collect_interleaved(stream)?;
    let words = items.into_iter().map(|(_, word)| word).collect();

    Ok(Splice {
        words,
        spans,
        diagnostics,
    })
}

/// All full-length, case-insensitive matches of every entry's phrase
fn find_occurrences<'g>(glossary: &'g Glossary, source_words: &[Word]) -> Vec<Occurrence<'g>> {
    let source: Vec<String> = source_words.iter().map(|w| w.text.to_lowercase()).collect();
    let mut occurrences = Vec::new();

    for entry in glossary.iter() {
        let phrase: Vec<String> = split_words(entry.source.trim())
            .into_iter()
            .filter(|w| !w.text.is_empty())
            .map(|w| w.text.to_lowercase())
            .collect();
        if phrase.is_empty() || phrase.len() > source.len() {
            continue;
        }

        for start in 0..=source.len() - phrase.len() {
            if source[start..start + phrase.len()] == phrase[..] {
                occurrences.push(Occurrence {
                    entry,
                    start,
                    len: phrase.len(),
                });
            }
        }
    }

    occurrences
}

fn splice_occurrence(
    stream: &mut Vec<Element>,
    occurrence: &Occurrence<'_>,
    source_words: &[Word],
    relation: &AlignmentRelation,
) -> Result<(), Diagnostic> {
    let range = occurrence.start..occurrence.start + occurrence.len;
    let unmapped = |message: &str| {
        Diagnostic::unmapped_glossary_occurrence(
            format!("Could not apply glossary entry: {}", message),
            phrase_text(&source_words[range.clone()]),
            occurrence.entry.source.clone(),
        )
    };

    let targets = relation.aligned_targets(range.clone());
    let runs = contiguous_runs(&targets);
    let Some(run) = closest_run(&runs, occurrence.start) else {
        return Err(unmapped("no aligned target words"));
    };
    let in_run = |tag: Tag| matches!(tag, Tag::Original(i) if run.contains(&i));

    let first = *run.start();
    let Some(insert_at) = stream.iter().position(
        |element| matches!(element, Interleaved::Item((Tag::Original(i), _)) if *i == first),
    ) else {
        return Err(unmapped("aligned target words were already replaced"));
    };

    let trailing_space = stream
        .iter()
        .find_map(|element| match element {
            Interleaved::Item((Tag::Original(i), word)) if i == run.end() => {
                Some(word.trailing_space.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| " ".to_string());

    let mut replacement = split_words(occurrence.entry.target.trim());
    if let Some(last) = replacement.last_mut() {
        last.trailing_space = trailing_space;
    }
    if starts_sentence(&stream[..insert_at]) {
        if let Some(first) = replacement.first_mut() {
            first.text = capitalize(&first.text);
        }
    }

    stream.retain(|element| !matches!(element, Interleaved::Item((tag, _)) if in_run(*tag)));
    stream.splice(
        insert_at..insert_at,
        replacement
            .into_iter()
            .map(|word| Interleaved::Item((Tag::Inserted, word))),
    );

    tracing::debug!(
        phrase = %occurrence.entry.source,
        target = %occurrence.entry.target,
        first = run.start(),
        last = run.end(),
        "Spliced glossary phrase"
    );

    Ok(())
}

/// The run whose mean index is closest to `anchor`; ties go to the earlier run
fn closest_run(runs: &[RangeInclusive<usize>], anchor: usize) -> Option<&RangeInclusive<usize>> {
    let distance = |run: &RangeInclusive<usize>| {
        let mean = (*run.start() + *run.end()) as f64 / 2.0;
        (mean - anchor as f64).abs()
    };

    let mut best: Option<(&RangeInclusive<usize>, f64)> = None;
    for run in runs {
        let d = distance(run);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((run, d));
        }
    }
    best.map(|(run, _)| run)
}

/// Whether a word inserted after `preceding` opens a sentence
fn starts_sentence(preceding: &[Element]) -> bool {
    let previous = preceding.iter().rev().find_map(|element| match element {
        Interleaved::Item((_, word)) if !word.text.is_empty() => Some(word),
        _ => None,
    });
    match previous {
        None => true,
        Some(word) => word
            .trailing_space
            .chars()
            .next()
            .is_some_and(|c| matches!(c, '.' | '!' | '?')),
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
