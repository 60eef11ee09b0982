//! Initial labeling: occupied cells get `linear index + 1`, the rest get 0.

use rayon::prelude::*;

use super::grid::{Label, NO_LABEL, OccupancyGrid};
use crate::mode::ExecutionMode;

#[inline(always)]
fn initial_label(occupied: bool, idx: usize) -> Label {
    // Fits: grid construction caps the cell count at `Label::MAX`.
    if occupied { (idx + 1) as Label } else { NO_LABEL }
}

/// Write the initial labels of `grid` into `out`.
pub fn seed_labels(grid: &OccupancyGrid, out: &mut [Label], mode: ExecutionMode) {
    assert_eq!(out.len(), grid.len(), "label buffer shape mismatch");
    let cells = grid.cells();
    if mode.is_parallel() {
        out.par_iter_mut()
            .zip(cells.par_iter())
            .enumerate()
            .for_each(|(idx, (slot, &occupied))| *slot = initial_label(occupied, idx));
    } else {
        for (idx, (slot, &occupied)) in out.iter_mut().zip(cells).enumerate() {
            *slot = initial_label(occupied, idx);
        }
    }
}

pub fn initial_labels(grid: &OccupancyGrid) -> Vec<Label> {
    let mut labels = vec![NO_LABEL; grid.len()];
    seed_labels(grid, &mut labels, ExecutionMode::Sequential);
    labels
}
