// ============================================================
// Layer 3 — Word-Level Annotation
// ============================================================
// One sentence as the annotators saw it: a list of words, and for
// each word the SET of semantic-role labels active on it.
//
// Example (labels: AGENT=0, THEME=1, LOCATION=2):
//   words:  ["Mary", "sold", "books", "in",  "Paris"]
//   labels: [{0},    {},     {1},     {},    {2}   ]
//
// An empty set is a real observation ("this word has no role"),
// not a missing value.
//
// Exported VerbNet corpora name these fields "tok" and "verbnet";
// both spellings are accepted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::error::{AlignmentError, CoreError};
use crate::domain::label::LabelVocabulary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    #[serde(alias = "tok")]
    pub words: Vec<String>,

    #[serde(alias = "verbnet")]
    pub labels: Vec<BTreeSet<usize>>,
}

impl AnnotatedSentence {
    pub fn new(words: Vec<String>, labels: Vec<BTreeSet<usize>>) -> Self {
        Self { words, labels }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Check that every word has a label set and every label is in range.
    pub fn validate(&self, num_labels: usize) -> Result<(), AlignmentError> {
        if self.labels.len() != self.words.len() {
            return Err(AlignmentError::AnnotationLengthMismatch {
                words:      self.words.len(),
                label_sets: self.labels.len(),
            });
        }
        for set in &self.labels {
            if let Some(&label) = set.iter().find(|&&l| l >= num_labels) {
                return Err(AlignmentError::LabelOutOfRange { label, num_labels });
            }
        }
        Ok(())
    }

    /// The sentence as a single space-joined string, for reports.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// A labelled corpus: the label vocabulary plus its train and test splits.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub labels: LabelVocabulary,
    pub train:  Vec<AnnotatedSentence>,
    pub test:   Vec<AnnotatedSentence>,
}

impl Corpus {
    /// Build the vocabulary from `label_names` and check every sentence
    /// of both splits against it.
    pub fn new(
        label_names: Vec<String>,
        train:       Vec<AnnotatedSentence>,
        test:        Vec<AnnotatedSentence>,
    ) -> Result<Self, CoreError> {
        let labels = LabelVocabulary::new(label_names)?;
        for sentence in train.iter().chain(&test) {
            sentence.validate(labels.len())?;
        }
        Ok(Self { labels, train, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_tok_and_verbnet_fields() {
        let line = r#"{"tok": ["Mary", "ran"], "verbnet": [[0], []]}"#;
        let s: AnnotatedSentence = serde_json::from_str(line).unwrap();
        assert_eq!(s.words, vec!["Mary", "ran"]);
        assert_eq!(s.labels[0], BTreeSet::from([0]));
        assert!(s.labels[1].is_empty());
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let s = AnnotatedSentence::new(vec!["a".into(), "b".into()], vec![BTreeSet::new()]);
        assert_eq!(
            s.validate(3),
            Err(AlignmentError::AnnotationLengthMismatch { words: 2, label_sets: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_label() {
        let s = AnnotatedSentence::new(vec!["a".into()], vec![BTreeSet::from([1, 5])]);
        assert_eq!(
            s.validate(3),
            Err(AlignmentError::LabelOutOfRange { label: 5, num_labels: 3 })
        );
        assert!(s.validate(6).is_ok());
    }

    #[test]
    fn test_corpus_checks_vocabulary_and_both_splits() {
        let names = || vec!["AGENT".to_string(), "THEME".to_string()];
        let ok  = AnnotatedSentence::new(vec!["Mary".into()], vec![BTreeSet::from([0])]);
        let bad = AnnotatedSentence::new(vec!["Mary".into()], vec![BTreeSet::from([2])]);

        let corpus = Corpus::new(names(), vec![ok.clone()], vec![ok.clone()]).unwrap();
        assert_eq!(corpus.labels.len(), 2);

        assert!(matches!(
            Corpus::new(Vec::new(), vec![ok.clone()], Vec::new()),
            Err(CoreError::Configuration(_))
        ));
        assert!(matches!(
            Corpus::new(names(), vec![ok], vec![bad]),
            Err(CoreError::Alignment(AlignmentError::LabelOutOfRange { label: 2, num_labels: 2 }))
        ));
    }

    #[test]
    fn test_text_joins_words() {
        let s = AnnotatedSentence::new(vec!["Mary".into(), "ran".into()], vec![BTreeSet::new(); 2]);
        assert_eq!(s.text(), "Mary ran");
    }
}
