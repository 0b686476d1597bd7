// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The collaborators the core talks to, expressed as traits so the
// training and evaluation code never depends on a concrete
// tokenizer, corpus format or report renderer:
//
//   CorpusSource        — where annotated sentences come from
//   WordTokenizer       — pre-split words → subword ids + word ids
//   EvaluationReporter  — renders (text, gold, predicted) triples
//
// The encoder itself is a burn Module and lives in Layer 5
// (ml::model::TokenEncoder); the class-weight contract lives next
// to the label statistics it consumes (data::class_weights).

use anyhow::Result;

use crate::domain::annotation::Corpus;
use crate::domain::label::LabelVocabulary;
use crate::domain::prediction::SentencePrediction;
use crate::eval::classification_report::ClassificationReport;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can load a labelled corpus.
///
/// Implementations:
///   - JsonlCorpusLoader → labels.json + train.jsonl (+ test.jsonl)
pub trait CorpusSource {
    fn load(&self) -> Result<Corpus>;
}

// ─── WordTokenizer ────────────────────────────────────────────────────────────
/// Subword tokenisation of one already-split sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubwordEncoding {
    /// Subword token ids, structural tokens included
    pub input_ids: Vec<u32>,

    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,

    /// For each token, the index of the source word it came from,
    /// or None for structural tokens (<s>, </s>, padding)
    pub word_ids: Vec<Option<usize>>,
}

/// Any tokenizer that can split pre-split words into subword
/// pieces and say which word each piece belongs to.
///
/// Implementations:
///   - tokenizers::Tokenizer (see infra::tokenizer_store)
pub trait WordTokenizer: Sync {
    fn tokenize_words(&self, words: &[String]) -> Result<SubwordEncoding>;
}

// ─── EvaluationReporter ───────────────────────────────────────────────────────
/// Renders a human-facing evaluation artifact.
///
/// Implementations:
///   - JsonlReporter → predictions.jsonl + report.json
pub trait EvaluationReporter {
    fn report(
        &self,
        sentences: &[SentencePrediction],
        labels:    &LabelVocabulary,
        metrics:   &ClassificationReport,
    ) -> Result<()>;
}
