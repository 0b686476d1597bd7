// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the corpus                (Layer 4 - data)
//   Step 2: Build / import the tokenizer   (Layer 6 - infra)
//   Step 3: Align word labels to tokens    (Layer 4 - data)
//   Step 4: Resolve class weights          (Layer 4 - data)
//   Step 5: Build the encoder              (Layer 5 - ml)
//   Step 6: Save config                    (Layer 6 - infra)
//   Step 7: Run the training loop          (Layer 5 - ml)
//   Step 8: Save the trained encoder       (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, optim::AdamWConfig, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    alignment::{align_corpus, ContinuationPolicy, LabelAligner},
    class_weights::{resolve_loss_weights, ClassWeightStrategy, ClassWeighter, LabelDistribution},
    dataset::AlignedDataset,
    loader::JsonlCorpusLoader,
};
use crate::domain::traits::CorpusSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    tokenizer_store::{embedding_rows, TokenizerStore},
};
use crate::ml::{
    model::{TokenClassifier, TokenClassifierConfig},
    schedule::LinearDecayLr,
    trainer::{TrainBackend, TrainingLoop},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Saved as train_config.json next to
// the model so evaluation can reuse the seed and continuation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:   String,
    pub models_dir: String,
    pub model_name: String,

    /// Existing tokenizer.json to use instead of building one
    pub tokenizer:       Option<String>,
    /// Model directory whose encoder body initialises this run
    pub base_checkpoint: Option<String>,

    pub epochs:       usize,
    pub lr:           f64,
    pub warmup_steps: usize,
    pub weight_decay: f32,
    pub seed:         u64,

    pub weighted:        bool,
    pub class_weighting: ClassWeightStrategy,
    pub continuation:    ContinuationPolicy,

    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    pub vocab_size:  usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data/verbnet".to_string(),
            models_dir:      "models".to_string(),
            model_name:      "srl-encoder".to_string(),
            tokenizer:       None,
            base_checkpoint: None,
            epochs:          3,
            lr:              2e-5,
            warmup_steps:    0,
            weight_decay:    0.01,
            seed:            42,
            weighted:        false,
            class_weighting: ClassWeightStrategy::default(),
            continuation:    ContinuationPolicy::default(),
            max_seq_len:     256,
            d_model:         256,
            num_heads:       8,
            num_layers:      6,
            d_ff:            1024,
            dropout:         0.1,
            vocab_size:      30522,
        }
    }
}

impl TrainConfig {
    pub fn checkpoint_manager(&self) -> CheckpointManager {
        CheckpointManager::new(&self.models_dir, &self.model_name)
    }
}

/// What a finished run hands back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub model_dir: PathBuf,
    pub history:   Vec<EpochMetrics>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the default GPU backend.
    pub fn execute(&self) -> Result<TrainSummary> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<TrainBackend>(device, true)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device, show_progress: bool) -> Result<TrainSummary> {
        let cfg  = &self.config;
        let ckpt = cfg.checkpoint_manager();
        ckpt.create_dir()?;

        // ── Step 1: Corpus ────────────────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_dir);
        let corpus = JsonlCorpusLoader::new(&cfg.data_dir, cfg.seed).load()?;
        let labels = corpus.labels.clone();

        // ── Step 2: Tokenizer ─────────────────────────────────────────────────
        let base = cfg.base_checkpoint.as_deref().map(Path::new);
        let base_config = base
            .map(|dir| CheckpointManager::at(dir).load_encoder_config())
            .transpose()
            .context("Cannot read the base encoder")?;
        let max_seq_len = base_config.as_ref().map_or(cfg.max_seq_len, |b| b.max_seq_len);

        let store = TokenizerStore::new(ckpt.dir());
        let tokenizer = match (&cfg.tokenizer, base) {
            (Some(path), _) => store.import(Path::new(path), max_seq_len)?,
            (None, Some(dir)) if dir.join("tokenizer.json").exists() => {
                store.import(&dir.join("tokenizer.json"), max_seq_len)?
            }
            _ => {
                let words: Vec<&str> = corpus
                    .train
                    .iter()
                    .flat_map(|s| s.words.iter().map(String::as_str))
                    .collect();
                store.load_or_build(&words, cfg.vocab_size, max_seq_len)?
            }
        };

        // ── Step 3: Alignment ─────────────────────────────────────────────────
        let aligner = LabelAligner::new(labels.len(), cfg.continuation);
        let train   = align_corpus(&tokenizer, &aligner, &corpus.train).context("Training split")?;
        let test    = align_corpus(&tokenizer, &aligner, &corpus.test).context("Test split")?;
        tracing::info!(
            "Aligned {} train / {} test sentences ({:?})",
            train.len(),
            test.len(),
            aligner.policy()
        );

        // ── Step 4: Class weights ─────────────────────────────────────────────
        let distribution = LabelDistribution::from_sentences(&corpus.train, labels.len());
        let weighter: Option<&dyn ClassWeighter> = cfg.weighted.then_some(&cfg.class_weighting as &dyn ClassWeighter);
        let weights = resolve_loss_weights(weighter, &distribution, &labels)?;
        tracing::info!("Class weights: {:?}", weights);

        // ── Step 5: Encoder ───────────────────────────────────────────────────
        if let Some(b) = &base_config {
            let rows = embedding_rows(&tokenizer);
            if rows > b.vocab_size {
                anyhow::bail!(
                    "Tokenizer ids need {} embedding rows but the base encoder has {}",
                    rows,
                    b.vocab_size
                );
            }
        }
        let model_config = match &base_config {
            Some(b) => TokenClassifierConfig::new(
                b.vocab_size, b.max_seq_len, b.d_model, b.num_heads, b.num_layers, b.d_ff,
                cfg.dropout, labels.names().to_vec(),
            ),
            None => TokenClassifierConfig::new(
                embedding_rows(&tokenizer), cfg.max_seq_len, cfg.d_model, cfg.num_heads,
                cfg.num_layers, cfg.d_ff, cfg.dropout, labels.names().to_vec(),
            ),
        };
        let model: TokenClassifier<B> = match base {
            Some(dir) => TokenClassifier::from_pretrained(&model_config, dir, &device)?,
            None => model_config.init(&device),
        };
        tracing::info!(
            "Model ready: {} layers, d_model={}, {} labels",
            model_config.num_layers,
            model_config.d_model,
            model_config.num_labels()
        );

        // ── Step 6: Config ────────────────────────────────────────────────────
        ckpt.save_config(cfg)?;

        // ── Step 7: Training loop ─────────────────────────────────────────────
        let optim  = AdamWConfig::new().with_weight_decay(cfg.weight_decay).init();
        let logger = MetricsLogger::new(ckpt.dir())?;
        tracing::info!("Epoch metrics go to '{}'", logger.csv_path().display());
        let training = TrainingLoop::<B>::new(cfg.epochs, cfg.seed, labels, &weights, device)?
            .with_metrics(logger)
            .with_progress(show_progress);
        let schedule = LinearDecayLr::new(cfg.lr, cfg.warmup_steps, training.total_steps(train.len()));

        let (model, history) = training.fit(
            model,
            optim,
            schedule,
            AlignedDataset::new(train),
            &AlignedDataset::new(test),
        )?;

        // ── Step 8: Save ──────────────────────────────────────────────────────
        ckpt.save_model(&model.valid(), &model_config)?;

        Ok(TrainSummary { model_dir: ckpt.dir().to_path_buf(), history })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    /// Tiny corpus: AGENT, THEME, LOCATION over six sentences.
    pub(crate) fn write_corpus(dir: &Path) {
        fs::write(dir.join("labels.json"), r#"["AGENT","THEME","LOCATION"]"#).unwrap();
        let train = [
            r#"{"tok": ["Mary", "sold", "books"], "verbnet": [[0], [], [1]]}"#,
            r#"{"tok": ["John", "ran", "home"], "verbnet": [[0], [], [2]]}"#,
            r#"{"tok": ["Sue", "didn't", "go"], "verbnet": [[0], [], []]}"#,
            r#"{"tok": ["Ann", "put", "it", "there"], "verbnet": [[0], [], [1], [2]]}"#,
        ];
        let test = [
            r#"{"tok": ["Mary", "ran", "home"], "verbnet": [[0], [], [2]]}"#,
            r#"{"tok": ["John", "sold", "it"], "verbnet": [[0], [], [1]]}"#,
        ];
        fs::write(dir.join("train.jsonl"), train.join("\n")).unwrap();
        fs::write(dir.join("test.jsonl"), test.join("\n")).unwrap();
    }

    pub(crate) fn tiny_config(data: &Path, models: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:   data.display().to_string(),
            models_dir: models.display().to_string(),
            model_name: "tiny".to_string(),
            epochs:     2,
            lr:         1e-3,
            max_seq_len: 16,
            d_model:    8,
            num_heads:  2,
            num_layers: 1,
            d_ff:       16,
            dropout:    0.0,
            vocab_size: 200,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_training_writes_the_model_directory() {
        let data   = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        write_corpus(data.path());

        let mut cfg = tiny_config(data.path(), models.path());
        cfg.weighted = true;

        let summary = TrainUseCase::new(cfg.clone())
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap();

        assert_eq!(summary.history.len(), 2);
        assert_eq!(summary.model_dir, models.path().join("srl-classifier").join("tiny"));
        for file in ["encoder_config.json", "model.mpk", "tokenizer.json", "train_config.json", "metrics.csv"] {
            assert!(summary.model_dir.join(file).exists(), "missing {file}");
        }
        assert_eq!(cfg.checkpoint_manager().load_config().unwrap(), cfg);
    }

    #[test]
    fn test_base_checkpoint_seeds_a_new_run() {
        let data   = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        write_corpus(data.path());

        let base_cfg = tiny_config(data.path(), models.path());
        let base = TrainUseCase::new(base_cfg.clone())
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap();

        let cfg = TrainConfig {
            model_name:      "tuned".to_string(),
            base_checkpoint: Some(base.model_dir.display().to_string()),
            epochs:          1,
            // Ignored: the architecture comes from the base encoder
            d_model:         32,
            ..base_cfg
        };
        let tuned = TrainUseCase::new(cfg)
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap();

        let encoder = CheckpointManager::at(&tuned.model_dir).load_encoder_config().unwrap();
        assert_eq!(encoder.d_model, 8);
        assert_eq!(encoder.num_labels(), 3);
    }

    #[test]
    fn test_tokenizer_larger_than_the_base_embedding_is_rejected() {
        let data   = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        let other  = tempfile::tempdir().unwrap();
        write_corpus(data.path());

        let base_cfg = tiny_config(data.path(), models.path());
        let base = TrainUseCase::new(base_cfg.clone())
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap();
        let base_rows = CheckpointManager::at(&base.model_dir).load_encoder_config().unwrap().vocab_size;

        let words: Vec<String> = (0..base_rows).map(|i| format!("word{i}")).collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let big = TokenizerStore::new(other.path()).load_or_build(&words, 10_000, 16).unwrap();
        assert!(embedding_rows(&big) > base_rows);

        let cfg = TrainConfig {
            model_name:      "tuned".to_string(),
            base_checkpoint: Some(base.model_dir.display().to_string()),
            tokenizer:       Some(other.path().join("tokenizer.json").display().to_string()),
            epochs:          1,
            ..base_cfg
        };
        let err = TrainUseCase::new(cfg)
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap_err();
        assert!(format!("{err:#}").contains("embedding rows"));
    }
}
