// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands off to Layer 2.
//
// Three commands are supported:
//   1. `train`    — fine-tunes the classifier on a labelled corpus
//   2. `evaluate` — scores a trained model on the test split
//   3. `tag`      — tags one sentence with semantic roles
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TagArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "srl-classifier",
    version,
    about = "Fine-tune a multi-label semantic-role token classifier, evaluate it, and tag sentences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case for the chosen subcommand.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Tag(args)      => run_tag(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.data_dir);
    let summary = TrainUseCase::new(args.into()).execute()?;

    if let Some(last) = summary.history.last() {
        println!(
            "Final epoch: loss={:.4} micro_f1={:.4} macro_f1={:.4} weighted_f1={:.4} samples_f1={:.4}",
            last.train_loss, last.micro_f1, last.macro_f1, last.weighted_f1, last.samples_f1,
        );
    }
    println!("Training complete. Model saved to '{}'.", summary.model_dir.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.into()).execute()?;
    println!("\n{report}");
    Ok(())
}

fn run_tag(args: TagArgs) -> Result<()> {
    use crate::application::tag_use_case::TagUseCase;

    let use_case = TagUseCase::new(&args.models_dir, &args.model_name)?;
    for tagged in use_case.tag(&args.sentence)? {
        if tagged.labels.is_empty() {
            println!("{}", tagged.word);
        } else {
            println!("{}\t{}", tagged.word, tagged.labels.join(", "));
        }
    }
    Ok(())
}
