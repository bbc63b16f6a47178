//! Attribution of model subword tokens to words.
//!
//! Translation and alignment models work on subword tokens, while markup is
//! projected over words. This module tokenizes a text into words (see
//! [`super::words`]) and attributes each subword token of the model's
//! tokenization to at most one word, so that token-level alignments can be
//! lifted to word level with
//! [`AlignmentRelation::from_token_pairs`](super::relation::AlignmentRelation::from_token_pairs).

use std::collections::HashMap;

use crate::markup::{AnnotatedText, Span};

use super::words::{Word, tokenize};

/// A model tokenizer, reduced to what word attribution needs
pub trait SubwordTokenizer {
    fn encode(&self, text: &str) -> Vec<u32>;

    fn decode(&self, tokens: &[u32]) -> String;
}

/// Words with their attributed subword tokens
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedWords {
    pub words: Vec<Word>,
    /// Markup spans over word indices
    pub spans: Vec<Span>,
    /// Tokenization of the whole text
    pub tokens: Vec<u32>,
    /// Token index to word index; unattributed tokens are absent
    pub token_to_word: HashMap<usize, usize>,
}

impl TokenizedWords {
    pub fn word_of(&self, token_index: usize) -> Option<usize> {
        self.token_to_word.get(&token_index).copied()
    }
}

/// Tokenize `text` into words and attribute subword tokens to them.
///
/// `tokens` is the model's tokenization of the text; when absent the text is
/// encoded with `tokenizer`. Each word grows its token list one token at a
/// time. As soon as the decoded list is no longer a prefix of
/// `text + trailing_space`, the list is discarded (those tokens stay
/// unattributed) and growth restarts with the next token. A word is complete
/// once the decoding equals its text or its trimmed rendering.
pub fn tokenize_words<T>(text: &AnnotatedText, tokenizer: &T, tokens: Option<&[u32]>) -> TokenizedWords
where
    T: SubwordTokenizer + ?Sized,
{
    let (mut words, spans) = tokenize(text);
    let tokens = match tokens {
        Some(tokens) => tokens.to_vec(),
        None => tokenizer.encode(text.content()),
    };

    let mut token_to_word = HashMap::new();
    let mut next = 0;

    for (word_idx, word) in words.iter_mut().enumerate() {
        let rendered = word.rendered();
        let mut candidates: Vec<usize> = Vec::new();

        while next < tokens.len() {
            candidates.push(next);
            next += 1;

            let ids: Vec<u32> = candidates.iter().map(|&i| tokens[i]).collect();
            let decoded = tokenizer.decode(&ids);
            if !rendered.starts_with(&decoded) {
                // a token straddling punctuation; it cannot belong to this word
                candidates.clear();
            } else if decoded == word.text || decoded == rendered.trim() {
                break;
            }
        }

        for &i in &candidates {
            token_to_word.insert(i, word_idx);
        }
        word.subword_tokens = Some(candidates.iter().map(|&i| tokens[i]).collect());
    }

    tracing::debug!(
        words = words.len(),
        tokens = tokens.len(),
        attributed = token_to_word.len(),
        "Attributed subword tokens to words"
    );

    TokenizedWords {
        words,
        spans,
        tokens,
        token_to_word,
    }
}
