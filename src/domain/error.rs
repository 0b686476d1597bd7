// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Two fatal error families:
//
//   AlignmentError     — the word/subword/label data handed to us
//                        breaks its contract (bad word index, label
//                        index outside the vocabulary, row of the
//                        wrong width or one row too many/few).
//                        Signals an upstream bug.
//
//   ConfigurationError — the run itself is mis-configured (empty
//                        label vocabulary, weight vector of the
//                        wrong length).
//
// Neither is ever retried. The application layer wraps them in
// anyhow errors with context and the run stops.
//
// Zero-division in metrics is NOT an error: it is logged as a
// warning by the metrics code and scored as 0.

use thiserror::Error;

/// The word-level annotation or its subword alignment map is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("subword token {token} references word {word_index}, but the sentence has {word_count} words")]
    WordIndexOutOfRange {
        token:      usize,
        word_index: usize,
        word_count: usize,
    },

    #[error("label index {label} is outside a vocabulary of {num_labels} labels")]
    LabelOutOfRange { label: usize, num_labels: usize },

    #[error("sentence has {words} words but {label_sets} label sets")]
    AnnotationLengthMismatch { words: usize, label_sets: usize },

    #[error("{rows} token rows for {tokens} subword tokens")]
    RowCountMismatch { rows: usize, tokens: usize },

    #[error("attention mask has {mask} entries for {tokens} subword tokens")]
    MaskLengthMismatch { mask: usize, tokens: usize },

    #[error("token row {token} has width {width}, expected {num_labels}")]
    RowWidthMismatch {
        token:      usize,
        width:      usize,
        num_labels: usize,
    },
}

/// The run configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("label vocabulary is empty")]
    EmptyVocabulary,

    #[error("label '{0}' appears more than once in the vocabulary")]
    DuplicateLabel(String),

    #[error("class weight vector has {actual} entries, expected {expected}")]
    WeightLengthMismatch { expected: usize, actual: usize },

    #[error("class weight for label {index} is {value}; weights must be finite and non-negative")]
    InvalidWeight { index: usize, value: f32 },
}

/// Any fatal error raised while building the core's inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let e = AlignmentError::WordIndexOutOfRange { token: 4, word_index: 7, word_count: 3 };
        assert_eq!(
            e.to_string(),
            "subword token 4 references word 7, but the sentence has 3 words"
        );

        let e = AlignmentError::RowCountMismatch { rows: 3, tokens: 4 };
        assert_eq!(e.to_string(), "3 token rows for 4 subword tokens");

        let e = ConfigurationError::WeightLengthMismatch { expected: 3, actual: 2 };
        assert!(e.to_string().contains("expected 3"));
    }

    #[test]
    fn test_core_error_wraps_both_families() {
        let core: CoreError = ConfigurationError::EmptyVocabulary.into();
        assert!(matches!(core, CoreError::Configuration(_)));

        let core: CoreError = AlignmentError::LabelOutOfRange { label: 9, num_labels: 3 }.into();
        assert!(matches!(core, CoreError::Alignment(_)));
    }
}
