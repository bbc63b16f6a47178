//! Terminology glossaries and the methods that enforce them.
//!
//! A glossary maps source phrases to mandated target phrases. It can be
//! enforced in three ways:
//!
//! - [`splice`]: after translation, replace the target words aligned to each
//!   source phrase occurrence ([`GlossaryMethod::Align`])
//! - [`source_replace`]: before translation, replace source phrases with
//!   their target phrases in the input ([`GlossaryMethod::SourceReplace`])
//! - natively by a backend that accepts a glossary ([`GlossaryMethod::Builtin`])
//!
//! Entry order is significant: entries are applied one after another, so
//! overlapping phrases yield order-dependent results.

pub mod source_replace;
pub mod splice;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};

pub use source_replace::replace_in_source;
pub use splice::{Splice, apply_glossary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub source: String,
    pub target: String,
}

/// Ordered source phrase → target phrase mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

impl Glossary {
    pub fn new() -> Self {
        Glossary::default()
    }

    /// Add an entry. Re-inserting a source phrase replaces its target but keeps
    /// its position.
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        let source = source.into();
        let target = target.into();
        match self.entries.iter_mut().find(|entry| entry.source == source) {
            Some(entry) => entry.target = target,
            None => self.entries.push(GlossaryEntry { source, target }),
        }
        self
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| entry.target.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlossaryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `source,target` lines. Blank lines are skipped, fields past the
    /// second are ignored and both fields are trimmed.
    pub fn from_csv_lines<I, S>(lines: I) -> AlignResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut glossary = Glossary::new();
        for (number, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            match (fields.next(), fields.next()) {
                (Some(source), Some(target)) => {
                    glossary.insert(source.trim(), target.trim());
                }
                _ => {
                    return Err(AlignError::glossary(format!(
                        "line {}: expected 'source,target', got {:?}",
                        number + 1,
                        line
                    )));
                }
            }
        }
        Ok(glossary)
    }

    /// Read a glossary CSV file
    pub fn load(path: impl AsRef<Path>) -> AlignResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let glossary = Self::from_csv_lines(contents.lines())?;
        tracing::info!(
            path = %path.display(),
            "Loaded {} glossary entries",
            glossary.len()
        );
        Ok(glossary)
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut glossary = Glossary::new();
        for (source, target) in iter {
            glossary.insert(source, target);
        }
        glossary
    }
}

/// How a glossary is enforced during translation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlossaryMethod {
    /// `Builtin` when the backend supports glossaries, the configured fallback
    /// otherwise
    #[default]
    Auto,
    /// Splice target phrases into the output using the word alignment
    Align,
    /// Replace source phrases before translation
    #[serde(rename = "srcrepl")]
    SourceReplace,
    /// Hand the glossary to the backend
    Builtin,
}

impl GlossaryMethod {
    /// Resolve `Auto` for a backend; other methods are returned unchanged
    pub fn resolve(self, backend_supports_glossary: bool, fallback: GlossaryMethod) -> GlossaryMethod {
        match self {
            GlossaryMethod::Auto if backend_supports_glossary => GlossaryMethod::Builtin,
            GlossaryMethod::Auto => match fallback {
                GlossaryMethod::Auto | GlossaryMethod::Builtin => GlossaryMethod::Align,
                other => other,
            },
            other => other,
        }
    }
}

impl fmt::Display for GlossaryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GlossaryMethod::Auto => "auto",
            GlossaryMethod::Align => "align",
            GlossaryMethod::SourceReplace => "srcrepl",
            GlossaryMethod::Builtin => "builtin",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for GlossaryMethod {
    type Err = AlignError;

    fn from_str(s: &str) -> AlignResult<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(GlossaryMethod::Auto),
            "align" => Ok(GlossaryMethod::Align),
            "srcrepl" => Ok(GlossaryMethod::SourceReplace),
            "builtin" => Ok(GlossaryMethod::Builtin),
            _ => Err(AlignError::glossary(format!("unknown glossary method: {}", s))),
        }
    }
}
