use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::error::AlignmentError;
use crate::domain::token_row::TokenRow;

/// One tokenised sentence with its token label rows.
/// `rows[i]` labels `input_ids[i]`; `words` is the raw sentence,
/// carried along for reports only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub rows:           Vec<TokenRow>,
    pub words:          Vec<String>,
}

impl AlignedSample {
    pub fn new(input_ids: Vec<u32>, attention_mask: Vec<u32>, rows: Vec<TokenRow>, words: Vec<String>) -> Self {
        Self { input_ids, attention_mask, rows, words }
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.len()
    }

    /// One row and one mask entry per token, every row ignored or
    /// exactly `num_labels` wide.
    pub fn check_rows(&self, num_labels: usize) -> Result<(), AlignmentError> {
        let tokens = self.input_ids.len();
        if self.rows.len() != tokens {
            return Err(AlignmentError::RowCountMismatch { rows: self.rows.len(), tokens });
        }
        if self.attention_mask.len() != tokens {
            return Err(AlignmentError::MaskLengthMismatch { mask: self.attention_mask.len(), tokens });
        }
        self.rows
            .iter()
            .enumerate()
            .try_for_each(|(token, row)| row.check_width(token, num_labels))
    }
}

pub struct AlignedDataset {
    samples: Vec<AlignedSample>,
}

impl AlignedDataset {
    pub fn new(samples: Vec<AlignedSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn samples(&self) -> &[AlignedSample] { &self.samples }
}

impl Dataset<AlignedSample> for AlignedDataset {
    fn get(&self, index: usize) -> Option<AlignedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AlignedSample {
        AlignedSample::new(
            vec![0, 11, 12, 2],
            vec![1; 4],
            vec![
                TokenRow::Ignored,
                TokenRow::Scored(vec![true, false]),
                TokenRow::Scored(vec![false, false]),
                TokenRow::Ignored,
            ],
            vec!["Mary".into(), "ran".into()],
        )
    }

    #[test]
    fn test_seq_len_counts_tokens() {
        assert_eq!(sample().seq_len(), 4);
    }

    #[test]
    fn test_check_rows_flags_wrong_width() {
        assert!(sample().check_rows(2).is_ok());
        assert_eq!(
            sample().check_rows(3),
            Err(AlignmentError::RowWidthMismatch { token: 1, width: 2, num_labels: 3 })
        );
    }

    #[test]
    fn test_check_rows_flags_row_count_and_mask_length() {
        let mut short = sample();
        short.rows.pop();
        assert_eq!(
            short.check_rows(2),
            Err(AlignmentError::RowCountMismatch { rows: 3, tokens: 4 })
        );

        let mut masked = sample();
        masked.attention_mask.push(1);
        assert_eq!(
            masked.check_rows(2),
            Err(AlignmentError::MaskLengthMismatch { mask: 5, tokens: 4 })
        );
    }

    #[test]
    fn test_dataset_get_and_len() {
        let ds = AlignedDataset::new(vec![sample(), sample()]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1), Some(sample()));
        assert_eq!(ds.get(2), None);
    }
}
