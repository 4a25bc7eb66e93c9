//! Normalizes raw rows into `(n, total)` values for charting.
//!
//! Two harness generations wrote different inorder-walk layouts: the legacy
//! one reported time per node, the current one reports the total time
//! followed by the per-node time. The layout is detected from the row width,
//! independently for every experiment kind, so a log from either generation
//! charts the same way.

use itertools::Itertools;
use tracing::trace;

use crate::matrix::{ExperimentKind, Method, Row};

/// Width above which an `inorder_comp` row holds `(total, per_node)` pairs.
const INTERLEAVED_COMPARISON_WIDTH: usize = 5;
/// Columns needed to read the last method's total from an interleaved row.
const MIN_INTERLEAVED_WIDTH: usize = 2 * Method::SHUFFLES.len();
const COMPARISON_WIDTH: usize = Method::SHUFFLES.len() + 1;

/// A reconciled row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Canonical {
    Single { n: f64, value: f64 },
    /// Values in [`Method::SHUFFLES`] order.
    Comparison { n: f64, values: [f64; 4] },
}

impl Canonical {
    pub fn n(&self) -> f64 {
        match self {
            Canonical::Single { n, .. } | Canonical::Comparison { n, .. } => *n,
        }
    }

    /// The value of `method`. Single rows answer for any method.
    pub fn value(&self, method: Method) -> Option<f64> {
        match self {
            Canonical::Single { value, .. } => Some(*value),
            Canonical::Comparison { values, .. } => method.position().map(|i| values[i]),
        }
    }
}

/// Reconciles one row, or returns `None` when it is too narrow for `kind`.
pub fn reconcile_row(kind: ExperimentKind, row: &[f64]) -> Option<Canonical> {
    let n = *row.first()?;
    match kind {
        ExperimentKind::Height | ExperimentKind::Build | ExperimentKind::Destroy => {
            let value = *row.get(1)?;
            Some(Canonical::Single { n, value })
        }
        ExperimentKind::Inorder => {
            let value = *row.get(1)?;
            let total = if row.len() > 2 { value } else { value * n };
            Some(Canonical::Single { n, value: total })
        }
        ExperimentKind::HeightComp | ExperimentKind::BuildComp | ExperimentKind::DestroyComp => {
            if row.len() < COMPARISON_WIDTH {
                return None;
            }
            Some(Canonical::Comparison {
                n,
                values: [row[1], row[2], row[3], row[4]],
            })
        }
        ExperimentKind::InorderComp => {
            if row.len() > INTERLEAVED_COMPARISON_WIDTH {
                if row.len() < MIN_INTERLEAVED_WIDTH {
                    return None;
                }
                Some(Canonical::Comparison {
                    n,
                    values: [row[1], row[3], row[5], row[7]],
                })
            } else if row.len() == COMPARISON_WIDTH {
                Some(Canonical::Comparison {
                    n,
                    values: [row[1] * n, row[2] * n, row[3] * n, row[4] * n],
                })
            } else {
                None
            }
        }
    }
}

/// Reconciles a sequence, dropping rows of an unexpected shape. Order is kept.
pub fn reconcile(kind: ExperimentKind, rows: &[Row]) -> Vec<Canonical> {
    rows.iter()
        .filter_map(|row| {
            let canonical = reconcile_row(kind, row);
            if canonical.is_none() {
                trace!("Dropping {kind} row of width {}", row.len());
            }
            canonical
        })
        .collect()
}

/// `(n, value)` points of one method, in row order.
pub fn method_series(rows: &[Canonical], method: Method) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|row| row.value(method).map(|v| (row.n(), v)))
        .collect()
}

/// Sorts points by `n`, keeping the last point seen for each `n`.
pub fn sorted_by_n(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut points = points.iter().rev().copied().collect::<Vec<_>>();
    // Stable sort on the reversed list keeps the last write first per `n`.
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points.into_iter().dedup_by(|a, b| a.0 == b.0).collect()
}
