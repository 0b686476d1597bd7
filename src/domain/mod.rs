// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, functions and traits
//
// Everything here is unit-testable without a device.

// Typed fatal errors (alignment and configuration)
pub mod error;

// The ordered label vocabulary
pub mod label;

// Word-level annotated sentences and corpora
pub mod annotation;

// Scored / ignored token label rows
pub mod token_row;

// Multi-hot vector <-> label-index set conversion
pub mod multi_hot;

// Per-sentence (text, gold, predicted) triples for reports
pub mod prediction;

// Core abstractions (traits) that other layers implement
pub mod traits;
