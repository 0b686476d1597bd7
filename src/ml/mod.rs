// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here.
//
//   model.rs      — transformer encoder + multi-label head,
//                   TokenEncoder trait, from_pretrained
//
//   loss.rs       — weighted BCE-with-logits over scored rows
//
//   schedule.rs   — step-keyed learning-rate schedule
//
//   trainer.rs    — the training loop: one sentence per step,
//                   skip sentences with nothing to score,
//                   evaluate after every epoch
//
//   evaluator.rs  — threshold logits at 0, collect scored
//                   (gold, predicted) rows, classification report
//
//   inferencer.rs — tag a single sentence with label names
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Transformer token classifier
pub mod model;

/// Multi-label BCE loss with per-label positive weights
pub mod loss;

/// Learning-rate schedules
pub mod schedule;

/// Training loop with per-epoch evaluation
pub mod trainer;

/// Scores predictions against gold rows
pub mod evaluator;

/// Word-level tagging of one sentence
pub mod inferencer;
