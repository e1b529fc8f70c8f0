//! Person-name annotation of chunks

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::EntityRecognizer;

/// Extracts the set of person names mentioned in a block.
///
/// Without a recognizer every text annotates to the empty set. That silent
/// no-op is the contract here, unlike the other optional capabilities.
#[derive(Clone)]
pub struct EntityAnnotator {
    recognizer: Option<Arc<dyn EntityRecognizer>>,
    label: String,
    min_score: f32,
}

impl EntityAnnotator {
    /// Create an annotator keeping entities with the given group label
    pub fn new(recognizer: Option<Arc<dyn EntityRecognizer>>, label: impl Into<String>) -> Self {
        Self {
            recognizer,
            label: label.into(),
            min_score: 0.0,
        }
    }

    /// Drop spans whose confidence is below `min_score`
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// An annotator that finds nothing
    pub fn disabled() -> Self {
        Self::new(None, "PER")
    }

    /// Whether a recognizer is configured
    pub fn is_enabled(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Person names in `chunk_text`, deduplicated by surface text.
    ///
    /// Recognizer failures propagate unchanged.
    pub async fn annotate(&self, chunk_text: &str) -> Result<BTreeSet<String>> {
        let Some(recognizer) = &self.recognizer else {
            return Ok(BTreeSet::new());
        };

        let spans = recognizer.recognize(chunk_text).await?;
        Ok(spans
            .into_iter()
            .filter(|span| span.entity_group == self.label && span.score >= self.min_score)
            .map(|span| span.word.trim().to_string())
            .filter(|word| !word.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::EntitySpan;
    use async_trait::async_trait;

    struct FixedRecognizer(Vec<EntitySpan>);

    #[async_trait]
    impl EntityRecognizer for FixedRecognizer {
        async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenRecognizer;

    #[async_trait]
    impl EntityRecognizer for BrokenRecognizer {
        async fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> {
            Err(Error::upstream("entity annotation", "model unavailable"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn span(word: &str, group: &str) -> EntitySpan {
        EntitySpan {
            word: word.to_string(),
            entity_group: group.to_string(),
            score: 0.9,
        }
    }

    #[tokio::test]
    async fn test_disabled_annotator_is_empty() {
        let annotator = EntityAnnotator::disabled();
        assert!(!annotator.is_enabled());
        assert!(annotator.annotate("Enter Romeo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keeps_people_deduplicated() {
        let recognizer = FixedRecognizer(vec![
            span("Romeo", "PER"),
            span("Verona", "LOC"),
            span("Romeo", "PER"),
            span(" Tybalt", "PER"),
        ]);
        let annotator = EntityAnnotator::new(Some(Arc::new(recognizer)), "PER");

        let people = annotator.annotate("...").await.unwrap();
        let people: Vec<&str> = people.iter().map(String::as_str).collect();
        assert_eq!(people, vec!["Romeo", "Tybalt"]);
    }

    #[tokio::test]
    async fn test_low_confidence_spans_are_dropped() {
        let mut unsure = span("Mantua", "PER");
        unsure.score = 0.3;
        let recognizer = FixedRecognizer(vec![span("Balthasar", "PER"), unsure]);
        let annotator = EntityAnnotator::new(Some(Arc::new(recognizer)), "PER").with_min_score(0.5);

        let people = annotator.annotate("...").await.unwrap();
        assert_eq!(people.into_iter().collect::<Vec<_>>(), vec!["Balthasar".to_string()]);
    }

    #[tokio::test]
    async fn test_failures_propagate() {
        let annotator = EntityAnnotator::new(Some(Arc::new(BrokenRecognizer)), "PER");
        let err = annotator.annotate("Enter Nurse").await.unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }
}
