//! Glossary enforcement before translation ("srcrepl").
//!
//! Source phrases are replaced by their target phrases directly in the
//! source text, relying on the backend to carry the already-translated terms
//! through unchanged. Markup spans are rebased with the substitutions.

use regex::{Captures, Regex};

use crate::error::{AlignError, AlignResult};
use crate::markup::AnnotatedText;

use super::Glossary;
use super::splice::capitalize;

/// Replace every glossary source phrase in `text` by its target phrase.
///
/// Matching is literal and case-insensitive; a phrase only matches between
/// non-word characters (`#` counts as a word character) or text boundaries.
/// Entries are applied in glossary order.
pub fn replace_in_source(text: &AnnotatedText, glossary: &Glossary) -> AlignResult<AnnotatedText> {
    let mut result = text.clone();

    for entry in glossary.iter() {
        let phrase = entry.source.trim();
        if phrase.is_empty() {
            continue;
        }
        let re = Regex::new(&format!(r"(?i)([^\w#]+|^)({})([^\w#]|$)", regex::escape(phrase)))
            .map_err(|e| AlignError::glossary(format!("phrase {:?}: {}", phrase, e)))?;

        let target = entry.target.trim();
        let mut count = 0;
        result = result.substitute_group(&re, 2, 0, |caps| {
            count += 1;
            if opens_sentence(caps) {
                capitalize(target)
            } else {
                target.to_string()
            }
        });

        if count > 0 {
            tracing::debug!(
                phrase = %phrase,
                target = %target,
                count,
                "Replaced glossary phrase in source"
            );
        }
    }

    Ok(result)
}

/// The match starts the text, or a capitalized phrase follows `.`, `!` or `?`
fn opens_sentence(caps: &Captures) -> bool {
    let leading = caps.get(1).map_or("", |m| m.as_str());
    if leading.is_empty() {
        return true;
    }
    let capitalized = caps
        .get(2)
        .and_then(|m| m.as_str().chars().next())
        .is_some_and(char::is_uppercase);
    capitalized && leading.starts_with(['.', '!', '?'])
}
