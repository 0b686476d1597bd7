// ============================================================
// Layer 3 — Token Label Row
// ============================================================
// One row of the token label matrix, i.e. the gold labels for one
// subword token.
//
// A row is EITHER scored (a full multi-hot vector of width L that
// takes part in the loss and the metrics) OR ignored (the token is
// a structural token such as <s>/</s>, or a continuation piece
// under the first-token-only policy). The enum makes a half-ignored
// row impossible to construct, and whether a row is ignored is
// read from its tag, never from its values.

use serde::{Deserialize, Serialize};

use crate::domain::error::AlignmentError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenRow {
    Scored(Vec<bool>),
    Ignored,
}

impl TokenRow {
    pub fn is_scored(&self) -> bool {
        matches!(self, TokenRow::Scored(_))
    }

    /// The multi-hot vector, if this row is scored.
    pub fn labels(&self) -> Option<&[bool]> {
        match self {
            TokenRow::Scored(v) => Some(v),
            TokenRow::Ignored   => None,
        }
    }

    /// Fail if a scored row does not have exactly `num_labels` entries.
    pub fn check_width(&self, token: usize, num_labels: usize) -> Result<(), AlignmentError> {
        match self {
            TokenRow::Scored(v) if v.len() != num_labels => Err(AlignmentError::RowWidthMismatch {
                token,
                width: v.len(),
                num_labels,
            }),
            _ => Ok(()),
        }
    }
}

/// Indices of the rows that take part in loss and metrics.
pub fn scored_positions(rows: &[TokenRow]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, r)| r.is_scored().then_some(i))
        .collect()
}

/// Flattened 0.0/1.0 targets for the scored rows, in row order,
/// after checking every scored row has width `num_labels`.
pub fn scored_targets(rows: &[TokenRow], num_labels: usize) -> Result<Vec<f32>, AlignmentError> {
    let mut flat = Vec::with_capacity(rows.len() * num_labels);
    for (token, row) in rows.iter().enumerate() {
        row.check_width(token, num_labels)?;
        if let TokenRow::Scored(v) = row {
            flat.extend(v.iter().map(|&b| if b { 1.0f32 } else { 0.0 }));
        }
    }
    Ok(flat)
}
