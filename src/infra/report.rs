// ============================================================
// Layer 6 — Evaluation Report Writer
// ============================================================
// Writes the result of a reporting-mode evaluation to disk:
//
//   predictions.jsonl — one line per sentence
//     {"text": "Mary sold books",
//      "gold":      [["AGENT"], [], ["THEME"]],
//      "predicted": [["AGENT"], [], []],
//      "exact_matches": 2}
//
//   report.json       — the full ClassificationReport
//
// Label sets are written by NAME so the file can be read without
// the vocabulary at hand.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};

use crate::domain::label::LabelVocabulary;
use crate::domain::prediction::SentencePrediction;
use crate::domain::traits::EvaluationReporter;
use crate::eval::classification_report::ClassificationReport;

#[derive(Serialize)]
struct PredictionLine<'a> {
    text:          &'a str,
    gold:          Vec<Vec<&'a str>>,
    predicted:     Vec<Vec<&'a str>>,
    exact_matches: usize,
}

pub struct JsonlReporter {
    dir: PathBuf,
}

impl JsonlReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.dir.join("predictions.jsonl")
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join("report.json")
    }
}

impl EvaluationReporter for JsonlReporter {
    fn report(
        &self,
        sentences: &[SentencePrediction],
        labels:    &LabelVocabulary,
        metrics:   &ClassificationReport,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create report directory '{}'", self.dir.display()))?;

        let path = self.predictions_path();
        let file = fs::File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        let mut out = BufWriter::new(file);

        for sentence in sentences {
            let line = PredictionLine {
                text:          &sentence.text,
                gold:          sentence.gold.iter().map(|s| labels.names_of(s)).collect(),
                predicted:     sentence.predicted.iter().map(|s| labels.names_of(s)).collect(),
                exact_matches: sentence.exact_matches(),
            };
            serde_json::to_writer(&mut out, &line)?;
            writeln!(out)?;
        }
        out.flush()?;

        let report_path = self.report_path();
        fs::write(&report_path, serde_json::to_string_pretty(metrics)?)
            .with_context(|| format!("Cannot write '{}'", report_path.display()))?;

        tracing::info!(
            "Wrote {} sentence predictions to '{}'",
            sentences.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::classification_report::ZeroDivision;
    use std::collections::BTreeSet;

    #[test]
    fn test_writes_named_label_sets_and_report() {
        let dir    = tempfile::tempdir().unwrap();
        let labels = LabelVocabulary::new(vec!["AGENT".into(), "THEME".into(), "LOCATION".into()]).unwrap();
        let sentences = vec![SentencePrediction::new(
            "Mary sold books",
            vec![BTreeSet::from([0]), BTreeSet::new(), BTreeSet::from([1])],
            vec![BTreeSet::from([0]), BTreeSet::new(), BTreeSet::new()],
        )];
        let metrics = ClassificationReport::compute(
            &[
                (vec![true, false, false], vec![true, false, false]),
                (vec![false, true, false], vec![false, false, false]),
            ],
            &labels,
            ZeroDivision::Zero,
        )
        .unwrap();

        let reporter = JsonlReporter::new(dir.path());
        reporter.report(&sentences, &labels, &metrics).unwrap();

        let jsonl = fs::read_to_string(reporter.predictions_path()).unwrap();
        let line: serde_json::Value = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();
        assert_eq!(line["text"], "Mary sold books");
        assert_eq!(line["gold"][2][0], "THEME");
        assert_eq!(line["predicted"][2].as_array().unwrap().len(), 0);
        assert_eq!(line["exact_matches"], 2);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(reporter.report_path()).unwrap()).unwrap();
        assert_eq!(report["per_label"][0]["label"], "AGENT");
        assert_eq!(report["micro_avg"]["precision"], 1.0);
    }
}
