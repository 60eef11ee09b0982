//! Distinct-label counting.

use std::collections::HashSet;

use rayon::prelude::*;

use super::grid::{Label, NO_LABEL};
use crate::mode::ExecutionMode;

/// Number of distinct nonzero labels in `labels`.
pub fn count_components(labels: &[Label]) -> usize {
    labels
        .iter()
        .copied()
        .filter(|&label| label != NO_LABEL)
        .collect::<HashSet<_>>()
        .len()
}

/// Parallel [`count_components`].
///
/// A component can span several workers' ranges, so each worker collects a
/// partial set and the sets are merged by union. Summing per-worker counts
/// would count such components more than once.
pub fn count_components_parallel(labels: &[Label]) -> usize {
    labels
        .par_iter()
        .copied()
        .filter(|&label| label != NO_LABEL)
        .fold(HashSet::new, |mut seen, label| {
            seen.insert(label);
            seen
        })
        .reduce(HashSet::new, |mut a, mut b| {
            if a.len() < b.len() {
                std::mem::swap(&mut a, &mut b);
            }
            a.extend(b);
            a
        })
        .len()
}

#[inline]
pub fn count_components_with(labels: &[Label], mode: ExecutionMode) -> usize {
    match mode {
        ExecutionMode::Sequential => count_components(labels),
        ExecutionMode::Parallel => count_components_parallel(labels),
    }
}
