// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One optimisation step per sentence (batch size 1), for a fixed
// number of epochs, with an evaluation pass after every epoch.
//
// One step:
//   batch ─► scored positions from the TokenRows
//         ─► forward: logits [1, S, L] ─► [S, L]
//         ─► select the scored rows        [N, L]
//         ─► weighted BCE against targets  [N, L]
//         ─► backward, optimiser step at the schedule's LR
//   schedule.step()
//
// A sentence with no scored token is SKIPPED: no loss, no
// backward, no parameter update. The schedule still advances so it
// stays keyed to the total step count.
//
// Burn backends:
//   - Training runs on the AutodiffBackend B
//   - Evaluation runs on model.valid(), the B::InnerBackend copy
//     of the model (no autodiff graph, dropout off)
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{Context, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::data::{
    batcher::{SrlBatch, SrlBatcher},
    dataset::AlignedDataset,
};
use crate::domain::label::LabelVocabulary;
use crate::domain::token_row::{scored_positions, scored_targets};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluator::Evaluator;
use crate::ml::loss::MultiLabelBceLoss;
use crate::ml::model::TokenEncoder;
use crate::ml::schedule::LrSchedule;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// What happened to one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The optimiser ran; carries the step's loss
    Trained(f64),

    /// Every token of the sentence was ignored
    Skipped,
}

/// Running totals for one epoch.
#[derive(Debug, Clone, Copy, Default)]
struct EpochLoss {
    sum:     f64,
    trained: usize,
    skipped: usize,
}

impl EpochLoss {
    fn record(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Trained(loss) => {
                self.sum     += loss;
                self.trained += 1;
            }
            StepOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Mean over the steps that produced a loss
    fn mean(&self) -> f64 {
        if self.trained > 0 { self.sum / self.trained as f64 } else { f64::NAN }
    }
}

pub struct TrainingLoop<B: AutodiffBackend> {
    epochs:        usize,
    seed:          u64,
    loss:          MultiLabelBceLoss<B>,
    evaluator:     Evaluator<B::InnerBackend>,
    device:        B::Device,
    metrics:       Option<MetricsLogger>,
    show_progress: bool,
}

impl<B: AutodiffBackend> TrainingLoop<B> {
    /// `class_weights` is the loss's pos_weight; it must hold one weight per label.
    pub fn new(
        epochs:        usize,
        seed:          u64,
        labels:        LabelVocabulary,
        class_weights: &[f32],
        device:        B::Device,
    ) -> Result<Self> {
        if class_weights.len() != labels.len() {
            anyhow::bail!(
                "{} class weights for {} labels",
                class_weights.len(),
                labels.len()
            );
        }
        let loss = MultiLabelBceLoss::new(class_weights, &device)
            .context("Invalid class weights")?;

        Ok(Self {
            epochs,
            seed,
            loss,
            evaluator: Evaluator::new(labels, device.clone()),
            device,
            metrics: None,
            show_progress: true,
        })
    }

    pub fn with_metrics(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Total optimisation steps for a training set of `train_len` sentences.
    pub fn total_steps(&self, train_len: usize) -> usize {
        self.epochs * train_len
    }

    /// One optimisation step on one sentence.
    pub fn step<M, O>(
        &self,
        model: M,
        optim: &mut O,
        lr:    f64,
        batch: SrlBatch<B>,
    ) -> Result<(M, StepOutcome)>
    where
        M: TokenEncoder<B> + AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let num_labels = self.loss.num_labels();
        batch.check_rows(num_labels)?;

        let positions  = scored_positions(&batch.rows);
        if positions.is_empty() {
            return Ok((model, StepOutcome::Skipped));
        }
        let targets = scored_targets(&batch.rows, num_labels)?;

        let seq_len = batch.seq_len();
        let logits  = model.forward_logits(batch.input_ids, batch.attention_mask);
        let [_, _, width] = logits.dims();
        if width != num_labels {
            anyhow::bail!("Model predicts {width} labels, the loss expects {num_labels}");
        }

        let index: Vec<i32> = positions.iter().map(|&p| p as i32).collect();
        let index   = Tensor::<B, 1, Int>::from_ints(index.as_slice(), &self.device);
        let scored  = logits.reshape([seq_len, num_labels]).select(0, index);
        let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device)
            .reshape([positions.len(), num_labels]);

        let loss     = self.loss.forward(scored, targets);
        let loss_val = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        let model = optim.step(lr, model, grads);

        Ok((model, StepOutcome::Trained(loss_val)))
    }

    /// Train for the configured number of epochs and return the trained
    /// model with one metrics row per epoch.
    pub fn fit<M, O, S>(
        &self,
        mut model:    M,
        mut optim:    O,
        mut schedule: S,
        train:        AlignedDataset,
        eval:         &AlignedDataset,
    ) -> Result<(M, Vec<EpochMetrics>)>
    where
        M: TokenEncoder<B> + AutodiffModule<B>,
        M::InnerModule: TokenEncoder<B::InnerBackend>,
        O: Optimizer<M, B>,
        S: LrSchedule,
    {
        let num_labels = self.loss.num_labels();
        for (i, sample) in train.samples().iter().enumerate() {
            sample
                .check_rows(num_labels)
                .with_context(|| format!("Training sentence {i}"))?;
        }

        let steps_per_epoch = train.sample_count();
        let train_loader = DataLoaderBuilder::new(SrlBatcher::<B>::new(self.device.clone()))
            .batch_size(1)
            .shuffle(self.seed)
            .num_workers(1)
            .build(train);

        let pb = self.progress_bar(self.total_steps(steps_per_epoch))?;
        let mut history = Vec::with_capacity(self.epochs);
        let mut best_micro_f1 = f64::NEG_INFINITY;

        for epoch in 1..=self.epochs {
            let mut epoch_loss = EpochLoss::default();

            for (i, batch) in train_loader.iter().enumerate() {
                let (next, outcome) = self
                    .step(model, &mut optim, schedule.get_lr(), batch)
                    .with_context(|| format!("Epoch {epoch}, step {i}"))?;
                model = next;
                schedule.step();
                epoch_loss.record(outcome);
                pb.inc(1);
            }

            let evaluation = self.evaluator.evaluate(&model.valid(), eval)?;
            let metrics = EpochMetrics::new(
                epoch,
                epoch_loss.mean(),
                epoch_loss.trained,
                epoch_loss.skipped,
                &evaluation.report,
            );

            pb.println(format!(
                "Epoch {:>3}/{} | loss={:.4} | skipped={} | micro_f1={:.4} | macro_f1={:.4}",
                epoch, self.epochs, metrics.train_loss, metrics.skipped_steps,
                metrics.micro_f1, metrics.macro_f1,
            ));
            tracing::info!(
                epoch,
                train_loss = metrics.train_loss,
                micro_f1 = metrics.micro_f1,
                "epoch finished"
            );

            if metrics.is_improvement(best_micro_f1) {
                best_micro_f1 = metrics.micro_f1;
                tracing::info!(epoch, micro_f1 = best_micro_f1, "best epoch so far");
            }
            if let Some(logger) = &self.metrics {
                logger.log(&metrics)?;
            }
            history.push(metrics);
        }

        pb.finish_and_clear();
        tracing::info!("Training complete!");
        Ok((model, history))
    }

    fn progress_bar(&self, total: usize) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Ok(pb)
    }
}
