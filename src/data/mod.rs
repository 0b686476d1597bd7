// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the annotated corpus on disk to device tensors.
//
//   labels.json + *.jsonl
//       │
//       ▼
//   JsonlCorpusLoader  → vocabulary + train/test sentences
//       │
//       ▼
//   Tokenizer          → subword ids + word_ids per token
//       │
//       ▼
//   LabelAligner       → one TokenRow per subword token
//       │
//       ▼
//   AlignedDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   SrlBatcher         → one sentence per batch, as tensors
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Class weights are computed from the training sentences on the
// side and handed to the loss.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads labels.json, train.jsonl and test.jsonl
pub mod loader;

/// Word labels → subword token rows
pub mod alignment;

/// Implements Burn's Dataset trait for aligned sentences
pub mod dataset;

/// Implements Burn's Batcher trait, one sentence per batch
pub mod batcher;

/// Per-label positive weights for the loss
pub mod class_weights;

/// Seeded train/held-out split
pub mod splitter;
