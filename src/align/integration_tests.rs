//! End-to-end tests for markup projection and glossary enforcement
//!
//! These tests drive tokenization, alignment, projection, splicing and the
//! pipeline together, using the mock backend in place of a model.
//!
//! ```bash
//! cargo test --lib align::integration_tests
//! ```

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::PipelineConfig;
    use crate::diagnostics::DiagnosticKind;
    use crate::glossary::{Glossary, GlossaryMethod, apply_glossary};
    use crate::markup::{AnnotatedText, Span};
    use crate::pipeline::{TranslationPipeline, UnitOutcome};
    use std::collections::HashMap;

    fn dictionary(pairs: &[(&str, &str)]) -> MockMode {
        MockMode::Dictionary(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn glossary(entries: &[(&str, &str)]) -> Glossary {
        entries.iter().copied().collect()
    }

    // ============================================================================
    // Projection
    // ============================================================================

    #[test]
    fn test_e2e_projection_cat_example() {
        let source = AnnotatedText::new("The cat sat", vec![Span::new("emph", 4, 7)]).unwrap();
        let (source_words, source_spans) = tokenize(&source);
        assert_eq!(source_spans, vec![Span::new("emph", 1, 2)]);

        let target_words = split_words("Die Katze saß");
        let relation = AlignmentRelation::from_pairs(3, 3, [(0, 0), (1, 1), (2, 2)]).unwrap();
        relation.check_dims(target_words.len(), source_words.len()).unwrap();

        let projection = project_markup(&source_words, &source_spans, &relation).unwrap();
        assert_eq!(projection.spans, vec![Span::new("emph", 1, 2)]);

        let text = words_to_annotated(&target_words, &projection.spans).unwrap();
        assert_eq!(text.content(), "Die Katze saß");
        assert_eq!(text.spans(), &[Span::new("emph", 4, 9)]);
    }

    #[test]
    fn test_e2e_projection_from_weights() {
        let source = AnnotatedText::new("a red car", vec![Span::new("textbf", 2, 5)]).unwrap();
        let (source_words, source_spans) = tokenize(&source);
        let target_words = split_words("ein rotes Auto");

        let weights = vec![
            vec![0.8, 0.1, 0.1],
            vec![0.05, 0.6, 0.35],
            vec![0.0, 0.2, 0.8],
        ];
        let threshold = PipelineConfig::default().alignment_threshold;
        let relation = AlignmentRelation::from_weights(&weights, threshold).unwrap();

        // "rotes" also passes the threshold for "car", "Auto" does not for "red"
        let projection = project_markup(&source_words, &source_spans, &relation).unwrap();
        assert_eq!(projection.spans, vec![Span::new("textbf", 1, 2)]);

        let text = words_to_annotated(&target_words, &projection.spans).unwrap();
        assert_eq!(text.spans(), &[Span::new("textbf", 4, 9)]);
    }

    #[test]
    fn test_e2e_projection_through_subword_tokens() {
        struct CharTokenizer;

        impl SubwordTokenizer for CharTokenizer {
            fn encode(&self, text: &str) -> Vec<u32> {
                text.chars().map(|c| c as u32).collect()
            }

            fn decode(&self, tokens: &[u32]) -> String {
                tokens.iter().filter_map(|&t| char::from_u32(t)).collect()
            }
        }

        let source = AnnotatedText::new("ab cd", vec![Span::new("emph", 3, 5)]).unwrap();
        let target = AnnotatedText::plain("cd ab");
        let source_tok = tokenize_words(&source, &CharTokenizer, None);
        let target_tok = tokenize_words(&target, &CharTokenizer, None);

        // a model aligning each character to its counterpart
        let pairs = [(0, 3), (1, 4), (3, 0), (4, 1)];
        let relation = AlignmentRelation::from_token_pairs(
            target_tok.words.len(),
            source_tok.words.len(),
            pairs,
            &target_tok.token_to_word,
            &source_tok.token_to_word,
        )
        .unwrap();

        let projection = project_markup(&source_tok.words, &source_tok.spans, &relation).unwrap();
        assert_eq!(projection.spans, vec![Span::new("emph", 0, 1)]);
        let text = words_to_annotated(&target_tok.words, &projection.spans).unwrap();
        assert_eq!(text.spans(), &[Span::new("emph", 0, 2)]);
    }

    // ============================================================================
    // Glossary splicing
    // ============================================================================

    #[test]
    fn test_e2e_glossary_hello_world() {
        let source_words = split_words("Hello world");
        let target_words = split_words("Hallo Welt");
        let relation = AlignmentRelation::from_pairs(2, 2, [(0, 0), (1, 1)]).unwrap();

        let splice = apply_glossary(
            &glossary(&[("world", "Erde")]),
            &source_words,
            &target_words,
            &[],
            &relation,
        )
        .unwrap();

        let texts: Vec<&str> = splice.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Hallo", "Erde"]);
        assert_eq!(splice.words[1].trailing_space, target_words[1].trailing_space);
        assert!(splice.diagnostics.is_empty());
    }

    #[test]
    fn test_e2e_disjoint_entries_commute() {
        let source_words = split_words("the quick fox jumps");
        let target_words = split_words("der schnelle Fuchs springt");
        let relation = AlignmentRelation::identity(4);
        let spans = vec![Span::new("emph", 1, 3)];

        let forward = apply_glossary(
            &glossary(&[("quick", "flinke"), ("jumps", "hüpft")]),
            &source_words,
            &target_words,
            &spans,
            &relation,
        )
        .unwrap();
        let backward = apply_glossary(
            &glossary(&[("jumps", "hüpft"), ("quick", "flinke")]),
            &source_words,
            &target_words,
            &spans,
            &relation,
        )
        .unwrap();

        assert_eq!(forward, backward);
        assert_eq!(words_to_plain(&forward.words), "der flinke Fuchs hüpft");
        assert_eq!(forward.spans, spans);
    }

    // ============================================================================
    // Pipeline
    // ============================================================================

    #[tokio::test]
    async fn test_e2e_pipeline_align_method() {
        let backend = MockAligner::new(dictionary(&[("hallo", "hello"), ("welt", "world")]));
        let config = PipelineConfig {
            glossary_method: GlossaryMethod::Align,
            ..PipelineConfig::default()
        };
        let pipeline = TranslationPipeline::new(Box::new(backend), config)
            .with_glossary(glossary(&[("Welt", "Earth")]));

        // "Hallo \emph{Welt}!"
        let unit = AnnotatedText::new("Hallo Welt!", vec![Span::new("emph", 6, 10)]).unwrap();
        let translation = pipeline.translate_unit(&unit).await.unwrap();

        assert_eq!(translation.text.content(), "Hello Earth!");
        assert_eq!(translation.text.spans(), &[Span::new("emph", 6, 11)]);
        assert!(translation.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_e2e_pipeline_source_replace_method() {
        let config = PipelineConfig {
            glossary_method: GlossaryMethod::SourceReplace,
            ..PipelineConfig::default()
        };
        let pipeline = TranslationPipeline::new(Box::new(MockAligner::new(MockMode::Identity)), config)
            .with_glossary(glossary(&[("Welt", "Erde")]));

        let unit = AnnotatedText::new("die Welt dreht sich", vec![Span::new("textit", 9, 14)]).unwrap();
        let translation = pipeline.translate_unit(&unit).await.unwrap();
        assert_eq!(translation.text.content(), "die Erde dreht sich");
        assert_eq!(translation.text.spans(), &[Span::new("textit", 9, 14)]);
    }

    #[tokio::test]
    async fn test_e2e_pipeline_builtin_glossary() {
        let backend = MockAligner::new(MockMode::Identity).with_native_glossary();
        let pipeline = TranslationPipeline::new(Box::new(backend), PipelineConfig::default())
            .with_glossary(glossary(&[("welt", "Erde")]));
        assert_eq!(pipeline.glossary_method(), GlossaryMethod::Builtin);

        let translation = pipeline
            .translate_unit(&AnnotatedText::plain("Hallo Welt"))
            .await
            .unwrap();
        assert_eq!(translation.text.content(), "Hallo Erde");
    }

    #[tokio::test]
    async fn test_e2e_pipeline_reports_dropped_markup() {
        let backend = MockAligner::new(dictionary(&[("doch", "")]));
        let pipeline = TranslationPipeline::new(Box::new(backend), PipelineConfig::default());

        // "Das ist \emph{doch} gut"
        let unit = AnnotatedText::new("Das ist doch gut", vec![Span::new("emph", 8, 12)]).unwrap();
        let outcomes = pipeline.translate_units(&[unit]).await;

        let UnitOutcome::Translated(translation) = &outcomes[0] else {
            panic!("Expected translation, got {:?}", outcomes[0]);
        };
        assert_eq!(translation.text.content(), "Das ist  gut");
        assert!(translation.text.spans().is_empty());
        assert_eq!(translation.diagnostics.len(), 1);
        assert_eq!(translation.diagnostics[0].kind, DiagnosticKind::UnmappedSpan);
        assert_eq!(translation.diagnostics[0].context.text, "doch");
        assert_eq!(translation.diagnostics[0].context.label, "emph");
    }

    #[tokio::test]
    async fn test_e2e_units_continue_after_failure() {
        let map: HashMap<String, String> = HashMap::new();
        let pipeline = TranslationPipeline::new(
            Box::new(MockAligner::new(MockMode::Dictionary(map))),
            PipelineConfig::default(),
        );

        let units = vec![
            AnnotatedText::plain("Erster Absatz."),
            AnnotatedText::plain("   "),
            AnnotatedText::new("Zweiter Absatz.", vec![Span::new("", 0, 7)]).unwrap(),
        ];
        let outcomes = pipeline.translate_units(&units).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|outcome| !outcome.is_failed()));
        assert_eq!(outcomes[2].text().spans(), &[Span::new("", 0, 7)]);

        let failing = TranslationPipeline::new(
            Box::new(MockAligner::new(MockMode::Error("timeout".to_string()))),
            PipelineConfig::default(),
        );
        let outcomes = failing.translate_units(&units).await;
        assert!(outcomes[0].is_failed());
        // whitespace-only units never reach the backend
        assert!(!outcomes[1].is_failed());
        assert!(outcomes[2].is_failed());
        assert_eq!(
            outcomes[2].text().content(),
            "% TRANSLATION FAILED: Backend error: timeout"
        );
    }
}
