// ============================================================
// Evaluation Statistics
// ============================================================
// Pure scoring code shared by the per-epoch monitoring pass and
// the final reporting pass. No Burn types: it works on plain
// Vec<bool> rows so it can be tested without a device.
//
//   classification_report.rs — per-label precision/recall/F1 and
//                              micro/macro/weighted/samples averages

pub mod classification_report;
