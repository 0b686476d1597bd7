// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `evaluate` and `tag` and all
// their flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{evaluate_use_case::EvaluateConfig, train_use_case::TrainConfig};
use crate::data::{alignment::ContinuationPolicy, class_weights::ClassWeightStrategy};
use crate::eval::classification_report::ZeroDivision;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the token classifier on a labelled corpus
    Train(TrainArgs),

    /// Score a trained model on the corpus's test split
    Evaluate(EvaluateArgs),

    /// Tag the words of one sentence with semantic roles
    Tag(TagArgs),
}

/// How per-label positive weights are derived from label counts
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Weighting {
    Uniform,
    InverseFreq,
    SqrtInverse,
}

impl From<Weighting> for ClassWeightStrategy {
    fn from(w: Weighting) -> Self {
        match w {
            Weighting::Uniform     => ClassWeightStrategy::Uniform,
            Weighting::InverseFreq => ClassWeightStrategy::InverseFreq,
            Weighting::SqrtInverse => ClassWeightStrategy::SqrtInverse,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with labels.json, train.jsonl and optionally test.jsonl
    #[arg(long, default_value = "data/verbnet")]
    pub data_dir: String,

    /// Root directory for trained models
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// Name of this model under <models-dir>/srl-classifier/
    #[arg(long, default_value = "srl-encoder")]
    pub model_name: String,

    /// Use this tokenizer.json instead of building one from the corpus
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Model directory whose encoder body initialises this run
    #[arg(long)]
    pub base_checkpoint: Option<String>,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Steps of linear warm-up before the linear decay
    #[arg(long, default_value_t = 0)]
    pub warmup_steps: usize,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f32,

    /// Seed for the data shuffle and the fallback test split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Up-weight rare labels in the loss
    #[arg(long)]
    pub weighted: bool,

    /// Strategy used by --weighted
    #[arg(long, value_enum, default_value_t = Weighting::InverseFreq)]
    pub weighting: Weighting,

    /// Score only the first subword piece of each word
    #[arg(long)]
    pub first_token_only: bool,

    /// Maximum number of tokens per sentence, [CLS] and [SEP] included
    #[arg(long, default_value_t = 256)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Upper bound on the size of a tokenizer built from the corpus
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            models_dir:      a.models_dir,
            model_name:      a.model_name,
            tokenizer:       a.tokenizer,
            base_checkpoint: a.base_checkpoint,
            epochs:          a.epochs,
            lr:              a.lr,
            warmup_steps:    a.warmup_steps,
            weight_decay:    a.weight_decay,
            seed:            a.seed,
            weighted:        a.weighted,
            class_weighting: a.weighting.into(),
            continuation:    if a.first_token_only {
                ContinuationPolicy::FirstTokenOnly
            } else {
                ContinuationPolicy::LabelAllTokens
            },
            max_seq_len:     a.max_seq_len,
            d_model:         a.d_model,
            num_heads:       a.num_heads,
            num_layers:      a.num_layers,
            d_ff:            a.d_ff,
            dropout:         a.dropout,
            vocab_size:      a.vocab_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "data/verbnet")]
    pub data_dir: String,

    #[arg(long, default_value = "models")]
    pub models_dir: String,

    #[arg(long, default_value = "srl-encoder")]
    pub model_name: String,

    /// Where to write predictions.jsonl and report.json (default: the model directory)
    #[arg(long)]
    pub report_dir: Option<String>,

    /// Score 0/0 as 1.0 instead of 0.0
    #[arg(long)]
    pub zero_division_one: bool,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_dir:      a.data_dir,
            models_dir:    a.models_dir,
            model_name:    a.model_name,
            report_dir:    a.report_dir,
            zero_division: if a.zero_division_one { ZeroDivision::One } else { ZeroDivision::Zero },
        }
    }
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Sentence to tag; words are separated by whitespace
    #[arg(long)]
    pub sentence: String,

    #[arg(long, default_value = "models")]
    pub models_dir: String,

    #[arg(long, default_value = "srl-encoder")]
    pub model_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_flags_reach_the_config() {
        let cli = Cli::try_parse_from([
            "srl-classifier", "train",
            "--weighted", "--weighting", "sqrt-inverse",
            "--first-token-only", "--epochs", "5",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert!(cfg.weighted);
        assert_eq!(cfg.class_weighting, ClassWeightStrategy::SqrtInverse);
        assert_eq!(cfg.continuation, ContinuationPolicy::FirstTokenOnly);
        assert_eq!(cfg.epochs, 5);
        assert_eq!(cfg.lr, 2e-5);
    }

    #[test]
    fn test_train_defaults_match_the_config_defaults() {
        let cli = Cli::try_parse_from(["srl-classifier", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(TrainConfig::from(args), TrainConfig::default());
    }

    #[test]
    fn test_evaluate_zero_division_flag() {
        let cli = Cli::try_parse_from(["srl-classifier", "evaluate", "--zero-division-one"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(EvaluateConfig::from(args).zero_division, ZeroDivision::One);
    }
}
