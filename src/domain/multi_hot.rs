// ============================================================
// Layer 3 — Multi-hot <-> Class-Set Converter
// ============================================================
// The loss works on fixed-width indicator vectors; reports want
// the explicit set of active labels. These two functions are
// exact inverses of each other:
//
//   to_class_set([true, false, true])      → {0, 2}
//   to_vector({0, 2}, 3)                   → [true, false, true]
//
// Applied per scored token, never per sentence.

use std::collections::BTreeSet;

use crate::domain::error::AlignmentError;

/// The indices whose indicator is set.
pub fn to_class_set(vector: &[bool]) -> BTreeSet<usize> {
    vector
        .iter()
        .enumerate()
        .filter_map(|(i, &active)| active.then_some(i))
        .collect()
}

/// Indicator vector of width `num_labels` with exactly the given indices set.
pub fn to_vector(set: &BTreeSet<usize>, num_labels: usize) -> Result<Vec<bool>, AlignmentError> {
    let mut vector = vec![false; num_labels];
    for &label in set {
        let slot = vector
            .get_mut(label)
            .ok_or(AlignmentError::LabelOutOfRange { label, num_labels })?;
        *slot = true;
    }
    Ok(vector)
}
