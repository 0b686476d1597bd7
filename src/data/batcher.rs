// ============================================================
// Layer 4 — Sentence Batcher
// ============================================================
// Implements Burn's Batcher trait to turn an AlignedSample into
// device tensors.
//
// A batch is exactly ONE sentence (the DataLoader is built with
// batch_size(1)), so sequences are never padded against each other
// and the token dimension is the sentence's own length:
//
//   input_ids       [1, S]  Int
//   attention_mask  [1, S]  Int
//
// The token label rows and the raw words are NOT turned into model
// inputs. They ride along next to the tensors: the training loop
// needs the rows to decide which positions are scored, and the
// evaluation report needs the text.
//
// The batcher owns the target device; every tensor of a batch is
// created there and nowhere else.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::AlignedSample;
use crate::domain::error::AlignmentError;
use crate::domain::token_row::TokenRow;

// ─── SrlBatch ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct SrlBatch<B: Backend> {
    /// Subword token ids — shape: [1, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention mask — shape: [1, seq_len], 1 = real token
    pub attention_mask: Tensor<B, 2, Int>,

    /// Gold label row per token (scored or ignored)
    pub rows: Vec<TokenRow>,

    /// The sentence's words, for reporting only
    pub input_text: Vec<String>,
}

impl<B: Backend> SrlBatch<B> {
    /// Number of subword tokens, i.e. logit positions.
    pub fn seq_len(&self) -> usize {
        let [_, seq_len] = self.input_ids.dims();
        seq_len
    }

    /// One row and one mask entry per token, every scored row
    /// exactly `num_labels` wide.
    pub fn check_rows(&self, num_labels: usize) -> Result<(), AlignmentError> {
        let tokens = self.seq_len();
        if self.rows.len() != tokens {
            return Err(AlignmentError::RowCountMismatch { rows: self.rows.len(), tokens });
        }
        let [_, mask] = self.attention_mask.dims();
        if mask != tokens {
            return Err(AlignmentError::MaskLengthMismatch { mask, tokens });
        }
        self.rows
            .iter()
            .enumerate()
            .try_for_each(|(token, row)| row.check_width(token, num_labels))
    }
}

// ─── SrlBatcher ───────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct SrlBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SrlBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Build the batch for a single sentence.
    /// Shapes come from the sample as-is; `SrlBatch::check_rows`
    /// reports any disagreement.
    pub fn sentence(&self, sample: AlignedSample) -> SrlBatch<B> {
        let ids: Vec<i32>  = sample.input_ids.iter().map(|&x| x as i32).collect();
        let mask: Vec<i32> = sample.attention_mask.iter().map(|&x| x as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([1, ids.len()]);
        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask.as_slice(), &self.device)
            .reshape([1, mask.len()]);

        SrlBatch {
            input_ids,
            attention_mask,
            rows:       sample.rows,
            input_text: sample.words,
        }
    }
}

impl<B: Backend> Batcher<AlignedSample, SrlBatch<B>> for SrlBatcher<B> {
    fn batch(&self, mut items: Vec<AlignedSample>) -> SrlBatch<B> {
        // The loaders are built with batch_size(1)
        debug_assert_eq!(items.len(), 1, "one sentence per batch");
        self.sentence(items.swap_remove(0))
    }
}
