// ============================================================
// Layer 5 — Tagger
// ============================================================
// Tags the words of a single sentence with semantic-role names.
//
//   words ─► tokenizer ─► model ─► logits [1, S, L]
//                                    │
//         first subword piece of each word
//                                    │
//                                    ▼
//                 logit ≥ 0 ⇒ label name is on
//
// A word whose pieces were all cut off by truncation gets no
// labels.

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::Serialize;
use tokenizers::Tokenizer;

use crate::domain::label::LabelVocabulary;
use crate::domain::multi_hot::to_class_set;
use crate::domain::traits::WordTokenizer;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::evaluator::threshold_logits;
use crate::ml::model::{TokenClassifier, TokenEncoder};

type InferBackend = burn::backend::Wgpu;

/// One word with the labels the model switched on for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedWord {
    pub word:   String,
    pub labels: Vec<String>,
}

pub struct Tagger<B: Backend = InferBackend> {
    model:     TokenClassifier<B>,
    tokenizer: Tokenizer,
    labels:    LabelVocabulary,
    device:    B::Device,
}

impl<B: Backend> Tagger<B> {
    pub fn load(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let (model, config) = ckpt_manager.load_model::<B>(&device)?;
        let tokenizer = TokenizerStore::new(ckpt_manager.dir()).load(config.max_seq_len)?;
        let labels = LabelVocabulary::new(config.id2label.clone())
            .context("Invalid id2label in encoder config")?;
        Ok(Self::new(model, tokenizer, labels, device))
    }

    pub fn new(model: TokenClassifier<B>, tokenizer: Tokenizer, labels: LabelVocabulary, device: B::Device) -> Self {
        Self { model, tokenizer, labels, device }
    }

    pub fn tag(&self, words: &[String]) -> Result<Vec<TaggedWord>> {
        let encoding = self.tokenizer.tokenize_words(words)?;
        let seq_len  = encoding.input_ids.len();
        let num_labels = self.labels.len();

        let ids: Vec<i32>  = encoding.input_ids.iter().map(|&x| x as i32).collect();
        let mask: Vec<i32> = encoding.attention_mask.iter().map(|&x| x as i32).collect();
        let input_ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([1, seq_len]);
        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask.as_slice(), &self.device)
            .reshape([1, seq_len]);

        let logits: Vec<f32> = self
            .model
            .forward_logits(input_ids, attention_mask)
            .reshape([seq_len * num_labels])
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read logits: {e:?}"))?;
        let rows = threshold_logits(&logits, num_labels);

        let tagged = words
            .iter()
            .enumerate()
            .map(|(w, word)| {
                let first_piece = encoding.word_ids.iter().position(|&id| id == Some(w));
                let labels = first_piece
                    .map(|t| {
                        self.labels
                            .names_of(&to_class_set(&rows[t]))
                            .into_iter()
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                TaggedWord { word: word.clone(), labels }
            })
            .collect();

        Ok(tagged)
    }
}
