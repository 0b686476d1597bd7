// ============================================================
// Layer 3 — Sentence Prediction
// ============================================================
// What the reporting step receives for one evaluated sentence:
// the original text plus, for every scored token, the gold label
// set and the predicted label set.
//
// gold[i] and predicted[i] describe the same scored token, so the
// two vectors always have the same length.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePrediction {
    pub text:      String,
    pub gold:      Vec<BTreeSet<usize>>,
    pub predicted: Vec<BTreeSet<usize>>,
}

impl SentencePrediction {
    pub fn new(text: impl Into<String>, gold: Vec<BTreeSet<usize>>, predicted: Vec<BTreeSet<usize>>) -> Self {
        Self { text: text.into(), gold, predicted }
    }

    /// Number of scored tokens whose predicted set equals the gold set.
    pub fn exact_matches(&self) -> usize {
        self.gold
            .iter()
            .zip(&self.predicted)
            .filter(|(g, p)| g == p)
            .count()
    }
}
