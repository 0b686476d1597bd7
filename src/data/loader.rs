// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads a VerbNet-style semantic-role corpus from a directory:
//
//   <data_dir>/
//     labels.json    ["AGENT", "THEME", "LOCATION", ...]
//     train.jsonl    one AnnotatedSentence per line
//     test.jsonl     optional; same format
//
// One line of train.jsonl:
//   {"tok": ["Mary", "sold", "books"], "verbnet": [[0], [], [1]]}
//
// The label vocabulary comes from labels.json (the dataset schema)
// and is the single source of label indices for the whole run.
//
// If test.jsonl is missing, the training file is split 80/20 with
// a seeded shuffle so repeated runs see the same test sentences.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::splitter::split_train_val;
use crate::domain::annotation::{AnnotatedSentence, Corpus};
use crate::domain::traits::CorpusSource;

/// Fraction of train.jsonl kept for training when there is no test.jsonl
const FALLBACK_TRAIN_FRACTION: f64 = 0.8;

pub struct JsonlCorpusLoader {
    dir:  PathBuf,
    seed: u64,
}

impl JsonlCorpusLoader {
    pub fn new(dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self { dir: dir.into(), seed }
    }

    /// The label names in labels.json, in index order.
    fn read_label_names(&self) -> Result<Vec<String>> {
        let path = self.dir.join("labels.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read label vocabulary '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid label vocabulary in '{}'", path.display()))
    }
}

impl CorpusSource for JsonlCorpusLoader {
    fn load(&self) -> Result<Corpus> {
        let names = self.read_label_names()?;
        let train = read_sentences(&self.dir.join("train.jsonl"))?;

        let test_path = self.dir.join("test.jsonl");
        let (train, test) = if test_path.exists() {
            (train, read_sentences(&test_path)?)
        } else {
            tracing::warn!(
                "No test.jsonl in '{}' — holding out {:.0}% of train.jsonl",
                self.dir.display(),
                (1.0 - FALLBACK_TRAIN_FRACTION) * 100.0
            );
            split_train_val(train, FALLBACK_TRAIN_FRACTION, self.seed)
        };

        let corpus = Corpus::new(names, train, test)
            .with_context(|| format!("Invalid corpus in '{}'", self.dir.display()))?;
        tracing::info!(
            "Loaded corpus: {} labels, {} train / {} test sentences",
            corpus.labels.len(),
            corpus.train.len(),
            corpus.test.len()
        );
        Ok(corpus)
    }
}

/// Parse a JSONL file of annotated sentences, skipping blank lines.
fn read_sentences(path: &Path) -> Result<Vec<AnnotatedSentence>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<AnnotatedSentence>(line)
                .with_context(|| format!("{}:{}: invalid sentence", path.display(), n + 1))
        })
        .collect()
}
