// ============================================================
// Multi-label Classification Report
// ============================================================
// Precision / recall / F1 for every label, plus the four usual
// summaries, computed from (gold, predicted) multi-hot row pairs.
//
// For label i, counting over all rows:
//   tp = gold[i] && pred[i]     fp = !gold[i] && pred[i]
//   fn = gold[i] && !pred[i]    support = tp + fn
//
//   precision = tp / (tp + fp)
//   recall    = tp / (tp + fn)
//   f1        = 2·tp / (2·tp + fp + fn)
//
// Summaries:
//   micro    — pool tp/fp/fn over all labels, then score once
//   macro    — unweighted mean of the per-label scores
//   weighted — per-label scores weighted by support
//   samples  — score every ROW as a set comparison, then average
//
// Any 0/0 is replaced by the ZeroDivision value (0.0 by default)
// instead of failing. Every label with such a score gets one
// tracing warning naming which of precision/recall/F1 fell back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::AlignmentError;
use crate::domain::label::LabelVocabulary;

/// Value used whenever a score has a zero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroDivision {
    #[default]
    Zero,
    One,
}

impl ZeroDivision {
    fn value(self) -> f64 {
        match self {
            ZeroDivision::Zero => 0.0,
            ZeroDivision::One  => 1.0,
        }
    }
}

/// Precision / recall / F1 and the number of gold occurrences behind them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScores {
    pub label:  String,
    #[serde(flatten)]
    pub scores: Scores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_label:    Vec<LabelScores>,
    pub micro_avg:    Scores,
    pub macro_avg:    Scores,
    pub weighted_avg: Scores,
    pub samples_avg:  Scores,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Counts {
    fn scores(self, zd: ZeroDivision) -> Scores {
        Scores {
            precision: ratio(self.tp, self.tp + self.fp, zd),
            recall:    ratio(self.tp, self.tp + self.fn_, zd),
            f1:        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_, zd),
            support:   self.tp + self.fn_,
        }
    }

    /// The scores of these counts that have a zero denominator.
    fn undefined_scores(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.tp + self.fp == 0 {
            names.push("precision");
        }
        if self.tp + self.fn_ == 0 {
            names.push("recall");
        }
        if 2 * self.tp + self.fp + self.fn_ == 0 {
            names.push("F1");
        }
        names
    }
}

fn ratio(num: usize, den: usize, zd: ZeroDivision) -> f64 {
    if den == 0 { zd.value() } else { num as f64 / den as f64 }
}

impl ClassificationReport {
    /// Score every `(gold, predicted)` row pair against the vocabulary.
    ///
    /// Fails only if a row's width differs from the vocabulary size.
    pub fn compute(
        rows:          &[(Vec<bool>, Vec<bool>)],
        labels:        &LabelVocabulary,
        zero_division: ZeroDivision,
    ) -> Result<Self, AlignmentError> {
        let num_labels = labels.len();
        let mut counts = vec![Counts::default(); num_labels];

        // Per-row (samples) accumulators
        let mut sample_p  = 0.0f64;
        let mut sample_r  = 0.0f64;
        let mut sample_f1 = 0.0f64;

        for (token, (gold, pred)) in rows.iter().enumerate() {
            for width in [gold.len(), pred.len()] {
                if width != num_labels {
                    return Err(AlignmentError::RowWidthMismatch { token, width, num_labels });
                }
            }

            let mut row = Counts::default();
            for (i, (&g, &p)) in gold.iter().zip(pred).enumerate() {
                match (g, p) {
                    (true, true)   => { counts[i].tp  += 1; row.tp  += 1; }
                    (false, true)  => { counts[i].fp  += 1; row.fp  += 1; }
                    (true, false)  => { counts[i].fn_ += 1; row.fn_ += 1; }
                    (false, false) => {}
                }
            }
            let s = row.scores(zero_division);
            sample_p  += s.precision;
            sample_r  += s.recall;
            sample_f1 += s.f1;
        }

        let per_label: Vec<LabelScores> = labels
            .names()
            .iter()
            .zip(&counts)
            .map(|(name, c)| LabelScores { label: name.clone(), scores: c.scores(zero_division) })
            .collect();

        for (name, c) in labels.names().iter().zip(&counts) {
            let undefined = c.undefined_scores();
            if !undefined.is_empty() {
                tracing::warn!(
                    "label '{}' has {} gold and {} predicted occurrences, {} set to {}",
                    name,
                    c.tp + c.fn_,
                    c.tp + c.fp,
                    undefined.join("/"),
                    zero_division.value()
                );
            }
        }

        let total_support: usize = per_label.iter().map(|l| l.scores.support).sum();

        // ── micro: pool the counts ───────────────────────────────────────────
        let pooled = counts.iter().fold(Counts::default(), |acc, c| Counts {
            tp:  acc.tp + c.tp,
            fp:  acc.fp + c.fp,
            fn_: acc.fn_ + c.fn_,
        });
        let micro_avg = pooled.scores(zero_division);

        // ── macro: plain mean over labels ────────────────────────────────────
        let n = num_labels as f64;
        let macro_avg = Scores {
            precision: per_label.iter().map(|l| l.scores.precision).sum::<f64>() / n,
            recall:    per_label.iter().map(|l| l.scores.recall).sum::<f64>() / n,
            f1:        per_label.iter().map(|l| l.scores.f1).sum::<f64>() / n,
            support:   total_support,
        };

        // ── weighted: mean weighted by support ───────────────────────────────
        let weighted = |f: fn(&Scores) -> f64| -> f64 {
            if total_support == 0 {
                return zero_division.value();
            }
            per_label
                .iter()
                .map(|l| f(&l.scores) * l.scores.support as f64)
                .sum::<f64>()
                / total_support as f64
        };
        let weighted_avg = Scores {
            precision: weighted(|s| s.precision),
            recall:    weighted(|s| s.recall),
            f1:        weighted(|s| s.f1),
            support:   total_support,
        };

        // ── samples: mean of per-row scores ──────────────────────────────────
        let samples_avg = if rows.is_empty() {
            Scores {
                precision: zero_division.value(),
                recall:    zero_division.value(),
                f1:        zero_division.value(),
                support:   0,
            }
        } else {
            let m = rows.len() as f64;
            Scores {
                precision: sample_p / m,
                recall:    sample_r / m,
                f1:        sample_f1 / m,
                support:   total_support,
            }
        };

        Ok(Self { per_label, micro_avg, macro_avg, weighted_avg, samples_avg })
    }

    #[cfg(test)]
    pub fn label(&self, name: &str) -> Option<&Scores> {
        self.per_label.iter().find(|l| l.label == name).map(|l| &l.scores)
    }
}

impl fmt::Display for Scores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>9.4} {:>9.4} {:>9.4} {:>9}",
            self.precision, self.recall, self.f1, self.support
        )
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .per_label
            .iter()
            .map(|l| l.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for l in &self.per_label {
            writeln!(f, "{:>width$} {}", l.label, l.scores)?;
        }
        writeln!(f)?;
        writeln!(f, "{:>width$} {}", "micro avg", self.micro_avg)?;
        writeln!(f, "{:>width$} {}", "macro avg", self.macro_avg)?;
        writeln!(f, "{:>width$} {}", "weighted avg", self.weighted_avg)?;
        write!(f, "{:>width$} {}", "samples avg", self.samples_avg)
    }
}
