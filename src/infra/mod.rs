// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the use cases:
//
//   checkpoint.rs      — model directory layout; saves and loads
//                        the classifier (CompactRecorder), its
//                        encoder config and the run's TrainConfig
//
//   tokenizer_store.rs — tokenizer.json persistence; builds a
//                        word-level tokenizer when none exists and
//                        implements WordTokenizer for it
//
//   metrics.rs         — one CSV row per training epoch
//
//   report.rs          — per-sentence predictions and the final
//                        classification report of an evaluation
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Evaluation report writer
pub mod report;
