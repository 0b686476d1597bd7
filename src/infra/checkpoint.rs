// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a trained classifier with Burn's
// CompactRecorder.
//
// Layout of one model directory:
//
//   <models_dir>/srl-classifier/<model_name>/
//     encoder_config.json   ← architecture + id2label
//     model.mpk             ← all learned parameters (half precision)
//     train_config.json     ← the run's TrainConfig
//     tokenizer.json        ← written by TokenizerStore
//     metrics.csv           ← written by MetricsLogger
//
// The models directory is always passed in; nothing here derives
// a location from the binary or the source tree.
//
// Loading needs encoder_config.json first: the model is rebuilt
// from it, then the recorded weights are loaded into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{TokenClassifier, TokenClassifierConfig};

/// Subdirectory of the models directory that holds every run of this tool
pub const MODEL_FAMILY: &str = "srl-classifier";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// The directory of model `model_name` under `models_dir`.
    pub fn new(models_dir: impl AsRef<Path>, model_name: &str) -> Self {
        Self::at(models_dir.as_ref().join(MODEL_FAMILY).join(model_name))
    }

    /// A manager rooted at an explicit model directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn create_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))
    }

    /// Write the model weights and its architecture.
    pub fn save_model<B: Backend>(
        &self,
        model:  &TokenClassifier<B>,
        config: &TokenClassifierConfig,
    ) -> Result<()> {
        self.create_dir()?;

        let config_path = self.dir.join("encoder_config.json");
        config
            .save(&config_path)
            .with_context(|| format!("Cannot write '{}'", config_path.display()))?;

        let path = self.dir.join("model");
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::info!("Model saved to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load_encoder_config(&self) -> Result<TokenClassifierConfig> {
        let path = self.dir.join("encoder_config.json");
        TokenClassifierConfig::load(&path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read '{}': {e}. Have you run 'train' first?",
                path.display()
            )
        })
    }

    /// Rebuild the classifier from encoder_config.json and load its weights.
    pub fn load_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(TokenClassifier<B>, TokenClassifierConfig)> {
        let config = self.load_encoder_config()?;
        let path   = self.dir.join("model");

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you trained the model first?", path.display())
            })?;

        let model = config.init::<B>(device).load_record(record);
        tracing::info!("Model loaded from '{}'", self.dir.display());
        Ok((model, config))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.create_dir()?;
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }
}
