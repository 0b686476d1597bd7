// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch.
//
// Columns:
//   epoch          epoch number (starts at 1)
//   train_loss     mean loss over the steps that produced a loss
//   trained_steps  sentences with at least one scored token
//   skipped_steps  sentences whose tokens were all ignored
//   micro_f1 … samples_f1   evaluation F1 after the epoch
//
// Output file: <model_dir>/metrics.csv
//
//   epoch,train_loss,trained_steps,skipped_steps,micro_f1,macro_f1,weighted_f1,samples_f1
//   1,0.412300,980,20,0.512000,0.301000,0.498000,0.455000
//
// The file is appended to across runs; the header is only written
// when the file is created.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::eval::classification_report::ClassificationReport;

const HEADER: &str = "epoch,train_loss,trained_steps,skipped_steps,micro_f1,macro_f1,weighted_f1,samples_f1";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// NaN when every step of the epoch was skipped
    pub train_loss: f64,

    pub trained_steps: usize,
    pub skipped_steps: usize,

    pub micro_f1:    f64,
    pub macro_f1:    f64,
    pub weighted_f1: f64,
    pub samples_f1:  f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:         usize,
        train_loss:    f64,
        trained_steps: usize,
        skipped_steps: usize,
        report:        &ClassificationReport,
    ) -> Self {
        Self {
            epoch,
            train_loss,
            trained_steps,
            skipped_steps,
            micro_f1:    report.micro_avg.f1,
            macro_f1:    report.macro_avg.f1,
            weighted_f1: report.weighted_avg.f1,
            samples_f1:  report.samples_avg.f1,
        }
    }

    /// Returns true if this epoch beats the best micro F1 so far
    pub fn is_improvement(&self, best_micro_f1: f64) -> bool {
        self.micro_f1 > best_micro_f1
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{},{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.trained_steps,
            m.skipped_steps,
            m.micro_f1,
            m.macro_f1,
            m.weighted_f1,
            m.samples_f1,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, micro_f1={:.4}",
            m.epoch,
            m.train_loss,
            m.micro_f1,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
