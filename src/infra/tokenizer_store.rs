// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Owns tokenizer.json inside the model directory so training,
// evaluation and tagging all see the same vocabulary.
//
// Three ways to get a tokenizer:
//   load           — tokenizer.json already in the model directory
//   import         — copy an existing tokenizer.json (e.g. the one
//                    shipped with a base encoder) into the directory
//   build          — a word-level vocabulary from the training words
//
// The built tokenizer is written as HuggingFace JSON and loaded
// back; the trainer API in tokenizers 0.15 wants a ModelWrapper
// trainer, which writing the JSON sidesteps entirely.
//
// Sentences arrive already split into words. The tokenizer still
// runs its Whitespace pre-tokenizer inside each word, so "don't"
// becomes three pieces that all map back to the same word. Those
// pieces are what the label aligner calls continuation tokens.
//
// Every encoding is wrapped as [CLS] … [SEP] and truncated to the
// model's max_seq_len.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tokenizers::{Tokenizer, TruncationParams};

use crate::domain::traits::{SubwordEncoding, WordTokenizer};

pub const CLS_ID: u32 = 101;
pub const SEP_ID: u32 = 102;

/// Reserved ids below the first word id
const FIRST_WORD_ID: usize = 104;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load the stored tokenizer, or build one from `words` if none exists.
    pub fn load_or_build(
        &self,
        words:       &[&str],
        vocab_size:  usize,
        max_seq_len: usize,
    ) -> Result<Tokenizer> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.path().display());
            self.load(max_seq_len)
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(words, vocab_size, max_seq_len)
        }
    }

    /// Load tokenizer.json from the store's directory.
    pub fn load(&self, max_seq_len: usize) -> Result<Tokenizer> {
        load_file(&self.path(), max_seq_len)
    }

    /// Copy an external tokenizer.json into the store and load it.
    pub fn import(&self, source: &Path, max_seq_len: usize) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        fs::copy(source, self.path())
            .with_context(|| format!("Cannot copy tokenizer from '{}'", source.display()))?;
        tracing::info!("Imported tokenizer from '{}'", source.display());
        self.load(max_seq_len)
    }

    fn build_and_save(&self, words: &[&str], vocab_size: usize, max_seq_len: usize) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Piece frequencies ─────────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for word in words {
            for piece in whitespace_pieces(&word.to_lowercase()) {
                *freq.entry(piece.to_string()).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so the ids are stable
        let mut pieces: Vec<(String, usize)> = freq.into_iter().collect();
        pieces.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pieces.truncate(vocab_size.saturating_sub(5));

        // ── Step 2: Vocabulary with BERT-style special ids ────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]":  0,
            "[UNK]":  1,
            "[CLS]":  CLS_ID,
            "[SEP]":  SEP_ID,
            "[MASK]": 103,
        });
        let mut next_id = FIRST_WORD_ID;
        for (piece, _) in &pieces {
            if vocab.get(piece).is_none() {
                vocab[piece] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: HuggingFace tokenizer JSON ────────────────────────────────
        let special = |id: u32, content: &str| serde_json::json!({
            "id": id, "content": content, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        });
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                special(0, "[PAD]"),
                special(1, "[UNK]"),
                special(CLS_ID, "[CLS]"),
                special(SEP_ID, "[SEP]"),
                special(103, "[MASK]"),
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": {
                "type": "TemplateProcessing",
                "single": [
                    { "SpecialToken": { "id": "[CLS]", "type_id": 0 } },
                    { "Sequence":     { "id": "A",     "type_id": 0 } },
                    { "SpecialToken": { "id": "[SEP]", "type_id": 0 } }
                ],
                "pair": [
                    { "SpecialToken": { "id": "[CLS]", "type_id": 0 } },
                    { "Sequence":     { "id": "A",     "type_id": 0 } },
                    { "SpecialToken": { "id": "[SEP]", "type_id": 0 } },
                    { "Sequence":     { "id": "B",     "type_id": 1 } },
                    { "SpecialToken": { "id": "[SEP]", "type_id": 1 } }
                ],
                "special_tokens": {
                    "[CLS]": { "id": "[CLS]", "ids": [CLS_ID], "tokens": ["[CLS]"] },
                    "[SEP]": { "id": "[SEP]", "ids": [SEP_ID], "tokens": ["[SEP]"] }
                }
            },
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.path();
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} pieces, saved to '{}'",
            next_id - FIRST_WORD_ID,
            tok_path.display()
        );

        self.load(max_seq_len)
    }
}

fn load_file(path: &Path, max_seq_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {e}", path.display()))?;
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_seq_len, ..Default::default() }))
        .map_err(|e| anyhow::anyhow!("Invalid truncation for '{}': {e}", path.display()))?;
    Ok(tokenizer)
}

/// Number of embedding rows a model needs for this tokenizer: one past
/// the largest token id (ids need not be contiguous).
pub fn embedding_rows(tokenizer: &Tokenizer) -> usize {
    tokenizer
        .get_vocab(true)
        .values()
        .max()
        .map_or(0, |&id| id as usize + 1)
}

/// Same split as the Whitespace pre-tokenizer: runs of word
/// characters, and runs of other non-space characters.
fn whitespace_pieces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (i, c) in text.char_indices() {
        let class = if c.is_whitespace() { None } else { Some(c.is_alphanumeric() || c == '_') };
        match (start, class) {
            (Some((_, word)), Some(w)) if word == w => {}
            (Some((s, _)), _) => {
                pieces.push(&text[s..i]);
                start = class.map(|w| (i, w));
            }
            (None, Some(w)) => start = Some((i, w)),
            (None, None) => {}
        }
    }
    if let Some((s, _)) = start {
        pieces.push(&text[s..]);
    }
    pieces
}

impl WordTokenizer for Tokenizer {
    fn tokenize_words(&self, words: &[String]) -> Result<SubwordEncoding> {
        let encoding = self
            .encode(words, true)
            .map_err(|e| anyhow::anyhow!("Tokenisation failed: {e}"))?;

        Ok(SubwordEncoding {
            input_ids:      encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
            word_ids:       encoding
                .get_word_ids()
                .iter()
                .map(|w| w.map(|w| w as usize))
                .collect(),
        })
    }
}
