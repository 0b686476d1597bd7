// ============================================================
// Layer 4 — Class Weights
// ============================================================
// Semantic-role labels are very unbalanced: almost every verb has
// an AGENT, few have a LOCATION. With a plain BCE loss the rare
// labels barely move the model, so their positive examples can be
// up-weighted through the loss's pos_weight.
//
// Pipeline:
//   training sentences ─► LabelDistribution (word-level counts)
//                      ─► ClassWeighter      (strategy)
//                      ─► resolve_loss_weights (validated, length L)
//
// Strategies (count_i = words carrying label i, K = #labels):
//   Uniform     w_i = 1
//   InverseFreq w_i = total / (K · count_i)
//   SqrtInverse w_i = sqrt(total / (K · count_i))
//
// A label that never occurs is treated as occurring once so its
// weight stays finite. When weighting is switched off the loss
// gets a vector of ones.

use serde::{Deserialize, Serialize};

use crate::domain::annotation::AnnotatedSentence;
use crate::domain::error::ConfigurationError;
use crate::domain::label::LabelVocabulary;

/// How often each label occurs over a set of sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDistribution {
    /// Number of words carrying label i
    pub label_counts: Vec<usize>,

    /// Number of sentences counted
    pub sentences: usize,
}

impl LabelDistribution {
    pub fn from_sentences(sentences: &[AnnotatedSentence], num_labels: usize) -> Self {
        let mut label_counts = vec![0usize; num_labels];
        for set in sentences.iter().flat_map(|s| &s.labels) {
            for &label in set {
                if let Some(c) = label_counts.get_mut(label) {
                    *c += 1;
                }
            }
        }
        Self { label_counts, sentences: sentences.len() }
    }

    pub fn total(&self) -> usize {
        self.label_counts.iter().sum()
    }
}

/// Turns label statistics into per-label positive-class weights.
pub trait ClassWeighter {
    fn weights(&self, distribution: &LabelDistribution, labels: &LabelVocabulary) -> Vec<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassWeightStrategy {
    Uniform,
    #[default]
    InverseFreq,
    SqrtInverse,
}

impl ClassWeighter for ClassWeightStrategy {
    fn weights(&self, distribution: &LabelDistribution, labels: &LabelVocabulary) -> Vec<f32> {
        let k     = labels.len();
        let total = distribution.total();

        if *self == ClassWeightStrategy::Uniform || total == 0 {
            return vec![1.0; k];
        }

        (0..k)
            .map(|i| {
                let count = distribution.label_counts.get(i).copied().unwrap_or(0).max(1);
                let w = total as f64 / (k as f64 * count as f64);
                match self {
                    ClassWeightStrategy::SqrtInverse => w.sqrt() as f32,
                    _ => w as f32,
                }
            })
            .collect()
    }
}

/// The pos_weight vector for the loss.
///
/// `None` means weighting is disabled and yields all ones. A weighter's
/// output must have one finite, non-negative weight per label.
pub fn resolve_loss_weights(
    weighter:     Option<&dyn ClassWeighter>,
    distribution: &LabelDistribution,
    labels:       &LabelVocabulary,
) -> Result<Vec<f32>, ConfigurationError> {
    let weights = match weighter {
        None    => vec![1.0; labels.len()],
        Some(w) => w.weights(distribution, labels),
    };
    check_weights(&weights, labels.len())?;
    Ok(weights)
}

pub fn check_weights(weights: &[f32], num_labels: usize) -> Result<(), ConfigurationError> {
    if weights.len() != num_labels {
        return Err(ConfigurationError::WeightLengthMismatch {
            expected: num_labels,
            actual:   weights.len(),
        });
    }
    if let Some((index, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(ConfigurationError::InvalidWeight { index, value });
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn roles() -> LabelVocabulary {
        LabelVocabulary::new(vec!["AGENT".into(), "THEME".into(), "LOCATION".into()]).unwrap()
    }

    /// 10 sentences: every one has an AGENT, one has a THEME, one a LOCATION.
    fn skewed_corpus() -> Vec<AnnotatedSentence> {
        (0..10)
            .map(|i| {
                let mut labels = vec![BTreeSet::from([0]), BTreeSet::new()];
                if i == 3 { labels[1].insert(1); }
                if i == 7 { labels[1].insert(2); }
                AnnotatedSentence::new(vec!["w0".into(), "w1".into()], labels)
            })
            .collect()
    }

    #[test]
    fn test_distribution_counts_words_per_label() {
        let d = LabelDistribution::from_sentences(&skewed_corpus(), 3);
        assert_eq!(d.label_counts, vec![10, 1, 1]);
        assert_eq!(d.sentences, 10);
        assert_eq!(d.total(), 12);
    }

    #[test]
    fn test_frequent_label_gets_the_smaller_weight() {
        let labels = roles();
        let d = LabelDistribution::from_sentences(&skewed_corpus(), 3);

        for strategy in [ClassWeightStrategy::InverseFreq, ClassWeightStrategy::SqrtInverse] {
            let w = resolve_loss_weights(Some(&strategy), &d, &labels).unwrap();
            assert_eq!(w.len(), 3);
            assert!(w[0] <= w[1], "{strategy:?}: {w:?}");
            assert!(w[0] <= w[2], "{strategy:?}: {w:?}");
        }
    }

    #[test]
    fn test_disabled_weighting_is_all_ones() {
        let labels = roles();
        let d = LabelDistribution::from_sentences(&skewed_corpus(), 3);
        assert_eq!(resolve_loss_weights(None, &d, &labels).unwrap(), vec![1.0; 3]);
        assert_eq!(
            resolve_loss_weights(Some(&ClassWeightStrategy::Uniform), &d, &labels).unwrap(),
            vec![1.0; 3]
        );
    }

    #[test]
    fn test_unseen_label_keeps_a_finite_weight() {
        let labels = roles();
        let d = LabelDistribution { label_counts: vec![4, 0, 2], sentences: 3 };
        let w = ClassWeightStrategy::InverseFreq.weights(&d, &labels);
        assert!(w.iter().all(|x| x.is_finite()));
        assert!(w[1] >= w[0]);
    }

    #[test]
    fn test_weighter_with_wrong_length_is_rejected() {
        struct Short;
        impl ClassWeighter for Short {
            fn weights(&self, _: &LabelDistribution, _: &LabelVocabulary) -> Vec<f32> {
                vec![1.0, 1.0]
            }
        }
        let d = LabelDistribution { label_counts: vec![1, 1, 1], sentences: 1 };
        assert_eq!(
            resolve_loss_weights(Some(&Short), &d, &roles()),
            Err(ConfigurationError::WeightLengthMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        assert_eq!(
            check_weights(&[1.0, -0.5], 2),
            Err(ConfigurationError::InvalidWeight { index: 1, value: -0.5 })
        );
    }
}
