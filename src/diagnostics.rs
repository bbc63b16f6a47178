//! Recoverable conditions reported during projection and splicing.
//!
//! A diagnostic never aborts the operation that produced it. It is returned to
//! the caller and emitted as a `tracing` warning with the lost content attached
//! as structured fields.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A source markup span has no aligned target words and was dropped
    UnmappedSpan,
    /// A glossary phrase occurrence could not be placed in the target
    UnmappedGlossaryOccurrence,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnmappedSpan => write!(f, "unmapped_span"),
            DiagnosticKind::UnmappedGlossaryOccurrence => {
                write!(f, "unmapped_glossary_occurrence")
            }
        }
    }
}

/// What was lost: the source text covered and the markup label or glossary
/// phrase involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticContext {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub context: DiagnosticContext,
}

impl Diagnostic {
    pub fn unmapped_span(text: impl Into<String>, label: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::UnmappedSpan,
            message: "Could not map markup contents into output".to_string(),
            context: DiagnosticContext {
                text: text.into(),
                label: label.into(),
            },
        }
    }

    pub fn unmapped_glossary_occurrence(
        message: impl Into<String>,
        text: impl Into<String>,
        phrase: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind: DiagnosticKind::UnmappedGlossaryOccurrence,
            message: message.into(),
            context: DiagnosticContext {
                text: text.into(),
                label: phrase.into(),
            },
        }
    }

    /// Log through `tracing` and hand the diagnostic back for collection
    pub fn emit(self) -> Self {
        tracing::warn!(
            kind = %self.kind,
            text = %self.context.text,
            label = %self.context.label,
            "{}",
            self.message
        );
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (text: {:?}, label: {:?})",
            self.kind, self.message, self.context.text, self.context.label
        )
    }
}
