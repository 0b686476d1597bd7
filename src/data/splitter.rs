// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Used when a corpus ships without its own test split: the
// training sentences are shuffled and a tail is held out.
//
// The shuffle is seeded, so the same seed always holds out the
// same sentences. A fresh `thread_rng` here would let the test
// set drift between a train run and a later evaluate run.
//
// Split ratio: 80% training, 20% held out (configurable)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, held_out).
///
/// # Example
/// ```ignore
/// let (train, test) = split_train_val(sentences, 0.8, 42);
/// ```
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = split_at.min(total);

    let held_out = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} held out ({}% / {}%)",
        samples.len(),
        held_out.len(),
        (samples.len()  * 100) / total.max(1),
        (held_out.len() * 100) / total.max(1),
    );

    (samples, held_out)
}
