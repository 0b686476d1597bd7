// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one user goal each.
//
// Rules for this layer:
//   - No tensor code here
//   - No printing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// Fine-tune the token classifier on a corpus
pub mod train_use_case;

// Score a trained model on the test split
pub mod evaluate_use_case;

// Tag one sentence with a trained model
pub mod tag_use_case;
