// ============================================================
// Layer 5 — Token Classifier
// ============================================================
// Transformer encoder with a multi-label head: one independent
// logit per (token, label). A token may switch on zero, one or
// several labels, so there is no softmax across labels.
//
//   input_ids [1, S] ─► EncoderBody ─► [1, S, d_model]
//                                         │
//                                         ▼
//                                   Linear(d_model, L)
//                                         │
//                                         ▼
//                                 logits [1, S, L]
//
// The body and head are separate modules so a trained body can be
// reused under a new head of a different width (from_pretrained).

use anyhow::{Context, Result};
use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::path::Path;

/// The contract the training loop and the evaluator need from an encoder.
pub trait TokenEncoder<B: Backend> {
    /// input_ids, attention_mask: [batch, seq_len] → logits [batch, seq_len, L]
    fn forward_logits(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3>;

    fn num_labels(&self) -> usize;
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct TokenClassifierConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    /// Label name per output column; its length is L
    pub id2label:    Vec<String>,
}

impl TokenClassifierConfig {
    pub fn num_labels(&self) -> usize {
        self.id2label.len()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> TokenClassifier<B> {
        TokenClassifier {
            body:       self.init_body(device),
            head:       LinearConfig::new(self.d_model, self.num_labels()).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            num_labels: self.num_labels(),
        }
    }

    fn init_body<B: Backend>(&self, device: &B::Device) -> EncoderBody<B> {
        let layers = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        EncoderBody {
            token_embedding:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            layers,
            final_norm:         LayerNormConfig::new(self.d_model).init(device),
            dropout:            DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `mask_pad`: [batch, seq_len], true where the token is padding
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_output = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(mask_pad))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct EncoderBody<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> EncoderBody<B> {
    /// input_ids: [batch, seq_len] → hidden states [batch, seq_len, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mask_pad = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        self.final_norm.forward(x)
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct TokenClassifier<B: Backend> {
    pub body:       EncoderBody<B>,
    pub head:       Linear<B>,
    pub dropout:    Dropout,
    pub num_labels: usize,
}

impl<B: Backend> TokenClassifier<B> {
    /// Build a classifier for `config` whose body comes from the checkpoint
    /// at `base`, with a freshly initialised head of width `config.num_labels()`.
    ///
    /// `base` must hold a checkpoint written by `CheckpointManager` for an
    /// encoder with the same body shape; its own head is discarded.
    pub fn from_pretrained(
        config: &TokenClassifierConfig,
        base:   &Path,
        device: &B::Device,
    ) -> Result<Self> {
        let path = base.join("model");
        let record: TokenClassifierRecord<B> = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load base encoder '{}'", path.display()))?;

        let mut model = config.init(device);
        model.body = model.body.load_record(record.body);

        tracing::info!(
            "Encoder body loaded from '{}', new head with {} labels",
            base.display(),
            config.num_labels()
        );
        Ok(model)
    }
}

impl<B: Backend> TokenEncoder<B> for TokenClassifier<B> {
    fn forward_logits(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let hidden = self.body.forward(input_ids, attention_mask);
        self.head.forward(self.dropout.forward(hidden))
    }

    fn num_labels(&self) -> usize {
        self.num_labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_config(labels: &[&str]) -> TokenClassifierConfig {
        TokenClassifierConfig::new(
            32, 16, 8, 2, 1, 16, 0.0,
            labels.iter().map(|l| l.to_string()).collect(),
        )
    }

    fn ids(values: &[i32]) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, &Default::default())
            .reshape([1, values.len()])
    }

    #[test]
    fn test_logits_have_one_column_per_label() {
        let model: TokenClassifier<TestBackend> =
            tiny_config(&["AGENT", "THEME", "LOCATION"]).init(&Default::default());

        let logits = model.forward_logits(ids(&[1, 5, 6, 2]), ids(&[1, 1, 1, 1]));
        assert_eq!(logits.dims(), [1, 4, 3]);
        assert_eq!(model.num_labels(), 3);
    }

    #[test]
    fn test_from_pretrained_keeps_body_and_resizes_head() {
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();

        let base: TokenClassifier<TestBackend> = tiny_config(&["A", "B"]).init(&device);
        CompactRecorder::new()
            .record(base.clone().into_record(), dir.path().join("model"))
            .unwrap();

        let config = tiny_config(&["AGENT", "THEME", "LOCATION", "TIME"]);
        let model  = TokenClassifier::<TestBackend>::from_pretrained(&config, dir.path(), &device).unwrap();
        assert_eq!(model.num_labels(), 4);

        // Compare against the base as recorded (f16), not the in-memory f32 copy
        let record   = CompactRecorder::new().load(dir.path().join("model"), &device).unwrap();
        let recorded = tiny_config(&["A", "B"]).init::<TestBackend>(&device).load_record(record);

        let before: Vec<f32> = recorded.body.forward(ids(&[3, 4]), ids(&[1, 1])).into_data().to_vec().unwrap();
        let after:  Vec<f32> = model.body.forward(ids(&[3, 4]), ids(&[1, 1])).into_data().to_vec().unwrap();
        assert_eq!(before, after);

        let logits = model.forward_logits(ids(&[3, 4]), ids(&[1, 1]));
        assert_eq!(logits.dims(), [1, 2, 4]);
    }
}
