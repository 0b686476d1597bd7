// ============================================================
// Layer 5 — Multi-label BCE Loss
// ============================================================
// Binary cross-entropy with logits, one independent binary
// problem per (token, label):
//
//   ℓ = −[ pw_j · t · log σ(x) + (1 − t) · log(1 − σ(x)) ]
//
// with pw_j the positive-class weight of label j. The loss is the
// mean of ℓ over every element of the scored rows.
//
// log(1 − σ(x)) is computed as log σ(−x), which stays finite for
// large |x|.

use burn::{prelude::*, tensor::activation::log_sigmoid};

use crate::data::class_weights::check_weights;
use crate::domain::error::ConfigurationError;

#[derive(Debug, Clone)]
pub struct MultiLabelBceLoss<B: Backend> {
    /// Shape [1, L], broadcast over the rows
    pos_weight: Tensor<B, 2>,
    num_labels: usize,
}

impl<B: Backend> MultiLabelBceLoss<B> {
    pub fn new(pos_weight: &[f32], device: &B::Device) -> Result<Self, ConfigurationError> {
        let num_labels = pos_weight.len();
        if num_labels == 0 {
            return Err(ConfigurationError::EmptyVocabulary);
        }
        check_weights(pos_weight, num_labels)?;

        let pos_weight = Tensor::<B, 1>::from_floats(pos_weight, device).reshape([1, num_labels]);
        Ok(Self { pos_weight, num_labels })
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// logits, targets: [N, L] → scalar loss [1]
    pub fn forward(&self, logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        let positive = log_sigmoid(logits.clone()) * targets.clone() * self.pos_weight.clone();
        let negative = log_sigmoid(logits.neg()) * targets.neg().add_scalar(1.0);
        (positive + negative).neg().mean()
    }
}
