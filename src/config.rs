//! Pipeline configuration
//!
//! Loaded from JSON; every field has a default so a partial (or empty) file
//! is valid. The CLI overrides individual fields on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, AlignResult};
use crate::glossary::GlossaryMethod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source language code
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Target language code
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    #[serde(default)]
    pub glossary_method: GlossaryMethod,

    /// Method used by `auto` when the backend has no native glossary support
    #[serde(default = "default_glossary_fallback")]
    pub glossary_fallback: GlossaryMethod,

    /// Minimum weight for a word pair to count as aligned
    #[serde(default = "default_alignment_threshold")]
    pub alignment_threshold: f32,

    /// Text standing in for a unit that failed; `{error}` is replaced by the
    /// error message
    #[serde(default = "default_failure_marker")]
    pub failure_marker: String,
}

fn default_source_lang() -> String {
    "de".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

fn default_glossary_fallback() -> GlossaryMethod {
    GlossaryMethod::Align
}

fn default_alignment_threshold() -> f32 {
    0.3
}

fn default_failure_marker() -> String {
    "% TRANSLATION FAILED: {error}".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            glossary_method: GlossaryMethod::default(),
            glossary_fallback: default_glossary_fallback(),
            alignment_threshold: default_alignment_threshold(),
            failure_marker: default_failure_marker(),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> AlignResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AlignResult<()> {
        for lang in [&self.source_lang, &self.target_lang] {
            if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(AlignError::malformed(format!("invalid language code: {:?}", lang)));
            }
        }
        if matches!(
            self.glossary_fallback,
            GlossaryMethod::Auto | GlossaryMethod::Builtin
        ) {
            return Err(AlignError::malformed(format!(
                "glossary fallback must be 'align' or 'srcrepl', got '{}'",
                self.glossary_fallback
            )));
        }
        if !(0.0..=1.0).contains(&self.alignment_threshold) {
            return Err(AlignError::malformed(format!(
                "alignment threshold {} outside 0..=1",
                self.alignment_threshold
            )));
        }
        Ok(())
    }

    /// The failure marker with `{error}` filled in
    pub fn render_failure(&self, error: &str) -> String {
        self.failure_marker.replace("{error}", error)
    }
}
