// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a model over aligned sentences without gradients and
// scores its multi-label predictions.
//
// Per sentence:
//   logits [1, S, L] ─► threshold (logit ≥ 0 ⇒ label on)
//                    ─► keep rows whose TokenRow is Scored
//                    ─► (gold, predicted) row pairs
//
// All pairs of all sentences feed one ClassificationReport.
//
// Thresholding the raw logit at 0 is the same decision as
// thresholding sigmoid(logit) at 0.5, without computing the sigmoid.
//
// In reporting mode each sentence also keeps its text and its
// gold/predicted label sets, for the per-sentence report.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::data::{batcher::SrlBatcher, dataset::AlignedDataset};
use crate::domain::label::LabelVocabulary;
use crate::domain::multi_hot::to_class_set;
use crate::domain::prediction::SentencePrediction;
use crate::eval::classification_report::{ClassificationReport, ZeroDivision};
use crate::ml::model::TokenEncoder;

/// Decision boundary on raw logits
pub const LOGIT_THRESHOLD: f32 = 0.0;

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: ClassificationReport,

    /// Filled in reporting mode only
    pub sentences: Vec<SentencePrediction>,

    /// Number of (gold, predicted) rows behind the report
    pub scored_tokens: usize,
}

pub struct Evaluator<B: Backend> {
    batcher:       SrlBatcher<B>,
    labels:        LabelVocabulary,
    zero_division: ZeroDivision,
}

impl<B: Backend> Evaluator<B> {
    pub fn new(labels: LabelVocabulary, device: B::Device) -> Self {
        Self {
            batcher: SrlBatcher::new(device),
            labels,
            zero_division: ZeroDivision::default(),
        }
    }

    pub fn with_zero_division(mut self, zero_division: ZeroDivision) -> Self {
        self.zero_division = zero_division;
        self
    }

    /// Aggregate metrics only.
    pub fn evaluate<M: TokenEncoder<B>>(&self, model: &M, dataset: &AlignedDataset) -> Result<Evaluation> {
        self.run(model, dataset, false)
    }

    /// Aggregate metrics plus one `SentencePrediction` per sentence.
    pub fn evaluate_for_report<M: TokenEncoder<B>>(
        &self,
        model:   &M,
        dataset: &AlignedDataset,
    ) -> Result<Evaluation> {
        self.run(model, dataset, true)
    }

    fn run<M: TokenEncoder<B>>(&self, model: &M, dataset: &AlignedDataset, keep_sentences: bool) -> Result<Evaluation> {
        let num_labels = self.labels.len();
        if model.num_labels() != num_labels {
            anyhow::bail!(
                "Model predicts {} labels but the vocabulary has {}",
                model.num_labels(),
                num_labels
            );
        }

        let mut pairs: Vec<(Vec<bool>, Vec<bool>)> = Vec::new();
        let mut sentences = Vec::new();

        for (i, sample) in dataset.samples().iter().enumerate() {
            sample
                .check_rows(num_labels)
                .with_context(|| format!("Evaluation sentence {i}"))?;

            let batch   = self.batcher.sentence(sample.clone());
            let seq_len = batch.seq_len();
            let logits  = model.forward_logits(batch.input_ids, batch.attention_mask);

            let values: Vec<f32> = logits
                .reshape([seq_len * num_labels])
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("Cannot read logits of sentence {i}: {e:?}"))?;
            let predicted = threshold_logits(&values, num_labels);

            let mut gold_sets = Vec::new();
            let mut pred_sets = Vec::new();
            for (row, pred) in batch.rows.iter().zip(predicted) {
                if let Some(gold) = row.labels() {
                    if keep_sentences {
                        gold_sets.push(to_class_set(gold));
                        pred_sets.push(to_class_set(&pred));
                    }
                    pairs.push((gold.to_vec(), pred));
                }
            }

            if keep_sentences {
                sentences.push(SentencePrediction::new(batch.input_text.join(" "), gold_sets, pred_sets));
            }
        }

        let report = ClassificationReport::compute(&pairs, &self.labels, self.zero_division)?;
        tracing::debug!(
            "Evaluated {} sentences, {} scored tokens, micro F1 {:.4}",
            dataset.sample_count(),
            pairs.len(),
            report.micro_avg.f1
        );

        Ok(Evaluation { report, sentences, scored_tokens: pairs.len() })
    }
}

/// Split a flat `[S · L]` logit buffer into S prediction rows.
pub fn threshold_logits(logits: &[f32], num_labels: usize) -> Vec<Vec<bool>> {
    if num_labels == 0 {
        return Vec::new();
    }
    logits
        .chunks(num_labels)
        .map(|row| row.iter().map(|&x| x >= LOGIT_THRESHOLD).collect())
        .collect()
}
