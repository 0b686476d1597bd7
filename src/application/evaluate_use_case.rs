// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained model on the corpus's test split:
//
//   Step 1: Load model, encoder config and train config  (infra)
//   Step 2: Load the corpus, check the label vocabulary  (data)
//   Step 3: Align the test split, in file order          (data)
//   Step 4: Reporting-mode evaluation                    (ml)
//   Step 5: Write predictions.jsonl and report.json      (infra)
//
// The continuation policy and split seed come from the saved
// train_config.json, so the test sentences and their scored
// tokens are the same ones the training run evaluated on.

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    alignment::{align_corpus, LabelAligner},
    dataset::AlignedDataset,
    loader::JsonlCorpusLoader,
};
use crate::domain::label::LabelVocabulary;
use crate::domain::traits::{CorpusSource, EvaluationReporter};
use crate::eval::classification_report::{ClassificationReport, ZeroDivision};
use crate::infra::{
    checkpoint::CheckpointManager,
    report::JsonlReporter,
    tokenizer_store::TokenizerStore,
};
use crate::ml::evaluator::Evaluator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateConfig {
    pub data_dir:   String,
    pub models_dir: String,
    pub model_name: String,

    /// Where predictions.jsonl and report.json go; the model directory if unset
    pub report_dir: Option<String>,

    pub zero_division: ZeroDivision,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            data_dir:      "data/verbnet".to_string(),
            models_dir:    "models".to_string(),
            model_name:    "srl-encoder".to_string(),
            report_dir:    None,
            zero_division: ZeroDivision::Zero,
        }
    }
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ClassificationReport> {
        self.execute_on::<burn::backend::Wgpu>(burn::backend::wgpu::WgpuDevice::default())
    }

    pub fn execute_on<B: Backend>(&self, device: B::Device) -> Result<ClassificationReport> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.models_dir, &cfg.model_name);

        // ── Step 1: Model ─────────────────────────────────────────────────────
        let (model, encoder) = ckpt.load_model::<B>(&device)?;
        let train_cfg = ckpt.load_config()?;
        let labels = LabelVocabulary::new(encoder.id2label.clone())
            .context("Invalid id2label in encoder config")?;

        // ── Step 2: Corpus ────────────────────────────────────────────────────
        let corpus = JsonlCorpusLoader::new(&cfg.data_dir, train_cfg.seed).load()?;
        if corpus.labels != labels {
            anyhow::bail!(
                "Corpus labels {:?} differ from the labels the model was trained on {:?}",
                corpus.labels.names(),
                labels.names()
            );
        }

        // ── Step 3: Alignment ─────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(ckpt.dir()).load(encoder.max_seq_len)?;
        let aligner   = LabelAligner::new(labels.len(), train_cfg.continuation);
        let test      = align_corpus(&tokenizer, &aligner, &corpus.test).context("Test split")?;
        tracing::info!("Evaluating on {} test sentences", test.len());

        // ── Step 4: Evaluation ────────────────────────────────────────────────
        let evaluation = Evaluator::<B>::new(labels.clone(), device)
            .with_zero_division(cfg.zero_division)
            .evaluate_for_report(&model, &AlignedDataset::new(test))?;

        // ── Step 5: Report ────────────────────────────────────────────────────
        let report_dir = cfg
            .report_dir
            .as_ref()
            .map_or_else(|| ckpt.dir().to_path_buf(), PathBuf::from);
        JsonlReporter::new(report_dir).report(&evaluation.sentences, &labels, &evaluation.report)?;

        tracing::info!(
            "Scored {} tokens over {} sentences",
            evaluation.scored_tokens,
            evaluation.sentences.len()
        );
        tracing::info!("micro avg: {}", evaluation.report.micro_avg);
        tracing::info!("macro avg: {}", evaluation.report.macro_avg);
        tracing::info!("weighted avg: {}", evaluation.report.weighted_avg);
        tracing::info!("samples avg: {}", evaluation.report.samples_avg);

        Ok(evaluation.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{tests::{tiny_config, write_corpus}, TrainUseCase};
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_evaluation_after_training_writes_reports() {
        let data   = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        let out    = tempfile::tempdir().unwrap();
        write_corpus(data.path());

        TrainUseCase::new(tiny_config(data.path(), models.path()))
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap();

        let cfg = EvaluateConfig {
            data_dir:   data.path().display().to_string(),
            models_dir: models.path().display().to_string(),
            model_name: "tiny".to_string(),
            report_dir: Some(out.path().display().to_string()),
            ..EvaluateConfig::default()
        };
        let report = EvaluateUseCase::new(cfg).execute_on::<NdArray>(Default::default()).unwrap();

        assert_eq!(report.per_label.len(), 3);
        // Gold rows over the two test sentences: two AGENT, one THEME, one LOCATION
        assert_eq!(report.label("AGENT").unwrap().support, 2);
        assert_eq!(report.micro_avg.support, 4);

        let lines = std::fs::read_to_string(out.path().join("predictions.jsonl")).unwrap();
        assert_eq!(lines.lines().count(), 2);
        assert!(out.path().join("report.json").exists());
    }

    #[test]
    fn test_missing_model_is_reported() {
        let models = tempfile::tempdir().unwrap();
        let cfg = EvaluateConfig {
            models_dir: models.path().display().to_string(),
            ..EvaluateConfig::default()
        };
        assert!(EvaluateUseCase::new(cfg).execute_on::<NdArray>(Default::default()).is_err());
    }
}
