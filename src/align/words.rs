//! Word tokenizer
//!
//! Splits text into words that own the separator run following them, and
//! converts character-level markup into spans over word indices.
//!
//! Word characters are letters, digits, `_` and `( ) [ ] # ' " -`; every
//! other character separates words. No input character is ever dropped:
//! concatenating `text + trailing_space` over all words reproduces the input.
//!
//! ```ignore
//! let text = AnnotatedText::new("The cat sat.", vec![Span::new("emph", 4, 7)])?;
//! let (words, spans) = tokenize(&text);
//! // words: "The"+" ", "cat"+" ", "sat"+"."
//! // spans: emph over words 1..2
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};
use crate::markup::{AnnotatedText, MarkupNode, Span};

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w()\[\]#'"-]+"#).expect("separator pattern is valid"));

/// A word together with the separator run that follows it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub trailing_space: String,
    /// Subword token ids of a specific model's tokenizer, when attributed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subword_tokens: Option<Vec<u32>>,
}

impl Word {
    pub fn new(text: impl Into<String>, trailing_space: impl Into<String>) -> Self {
        Word {
            text: text.into(),
            trailing_space: trailing_space.into(),
            subword_tokens: None,
        }
    }

    /// `text` followed by `trailing_space`
    pub fn rendered(&self) -> String {
        format!("{}{}", self.text, self.trailing_space)
    }

    /// Length of the rendered word in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count() + self.trailing_space.chars().count()
    }
}

/// Split plain text into words.
///
/// A leading separator run becomes a word with empty `text`.
pub fn split_words(text: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut last = 0;
    for sep in SEPARATOR.find_iter(text) {
        words.push(Word::new(&text[last..sep.start()], sep.as_str()));
        last = sep.end();
    }
    if last < text.len() {
        words.push(Word::new(&text[last..], ""));
    }
    words
}

/// Split annotated text into words and word-granular markup spans.
///
/// Markup boundaries always fall on word boundaries, so a word never straddles
/// a start or end marker. Spans are listed outer-first in the order their
/// start markers appear.
pub fn tokenize(text: &AnnotatedText) -> (Vec<Word>, Vec<Span>) {
    let mut words: Vec<Word> = Vec::new();
    let mut spans: Vec<Span> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for node in text.to_markup_list() {
        match node {
            MarkupNode::Start(label) => {
                open.push(spans.len());
                spans.push(Span::new(label, words.len(), words.len()));
            }
            MarkupNode::End(_) => {
                if let Some(idx) = open.pop() {
                    spans[idx].end = words.len();
                }
            }
            MarkupNode::Text(run) => {
                for word in split_words(&run) {
                    match words.last_mut() {
                        // separator run right after a marker belongs to the previous word
                        Some(prev) if word.text.is_empty() => {
                            prev.trailing_space.push_str(&word.trailing_space)
                        }
                        _ => words.push(word),
                    }
                }
            }
        }
    }

    (words, spans)
}

/// Concatenate the rendered words
pub fn words_to_plain(words: &[Word]) -> String {
    words.iter().map(Word::rendered).collect()
}

/// Render a run of words without the last word's trailing separator.
///
/// Used to report the content covered by a word span.
pub fn phrase_text(words: &[Word]) -> String {
    match words.split_last() {
        Some((last, init)) => {
            let mut text = words_to_plain(init);
            text.push_str(&last.text);
            text
        }
        None => String::new(),
    }
}

/// Rebuild annotated text from words and word-granular spans.
///
/// A word span `[s, e)` covers the characters from the start of word `s` to
/// the end of word `e - 1`'s text; the trailing separator of the last word
/// stays outside the span.
pub fn words_to_annotated(words: &[Word], spans: &[Span]) -> AlignResult<AnnotatedText> {
    let mut offsets = Vec::with_capacity(words.len() + 1);
    let mut pos = 0;
    for word in words {
        offsets.push(pos);
        pos += word.char_len();
    }
    offsets.push(pos);

    let mut text = AnnotatedText::plain(words_to_plain(words));
    for span in spans {
        if span.start > span.end || span.end > words.len() {
            return Err(AlignError::malformed(format!(
                "word span '{}' {}..{} out of bounds for {} words",
                span.label,
                span.start,
                span.end,
                words.len()
            )));
        }
        let start = offsets[span.start];
        let end = if span.is_empty() {
            start
        } else {
            offsets[span.end] - words[span.end - 1].trailing_space.chars().count()
        };
        text.add_markup(span.label.clone(), start, end)?;
    }

    Ok(text)
}
