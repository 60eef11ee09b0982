//! Jacobi-style minimum-label propagation.
//!
//! One sweep reads only `current` and writes every slot of `next` exactly
//! once. Workers own disjoint sets of `next` slots, so no locks are needed;
//! the per-worker "changed" bits are merged with a non-short-circuiting OR
//! (`reduce`, never `any`, which would stop before every slot is written).

use std::marker::PhantomData;

use rayon::prelude::*;

use super::grid::{Label, NO_LABEL, OccupancyGrid};

/// How the (row, col) space of a parallel sweep is split across workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decomposition {
    /// Blocks of `block` whole rows; each block is a contiguous slice of `next`.
    Rows { block: usize },
    /// Blocks of `block` whole columns, strided through `next`.
    Columns { block: usize },
    /// `height` x `width` tiles.
    Tiles { height: usize, width: usize },
}

impl Decomposition {
    pub fn name(self) -> &'static str {
        match self {
            Decomposition::Rows { .. } => "rows",
            Decomposition::Columns { .. } => "columns",
            Decomposition::Tiles { .. } => "tiles",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Schedule {
    Sequential,
    Parallel(Decomposition),
}

impl Schedule {
    pub fn name(self) -> &'static str {
        match self {
            Schedule::Sequential => "serial",
            Schedule::Parallel(decomposition) => decomposition.name(),
        }
    }
}

/// Write handle into `next` for decompositions whose write sets are not
/// contiguous (column blocks, tiles).
struct DisjointWriter<'a> {
    ptr: *mut Label,
    len: usize,
    _buf: PhantomData<&'a mut [Label]>,
}

unsafe impl Send for DisjointWriter<'_> {}
unsafe impl Sync for DisjointWriter<'_> {}

impl<'a> DisjointWriter<'a> {
    #[inline]
    fn new(buf: &'a mut [Label]) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
            _buf: PhantomData,
        }
    }

    /// Borrow `next[start..start + len]`.
    ///
    /// # Safety
    /// Spans that are alive at the same time must not overlap.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    unsafe fn span(&self, start: usize, len: usize) -> &mut [Label] {
        assert!(start + len <= self.len, "span out of range");
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(start), len) }
    }
}

/// Fold one neighbor into the running minimum. Unoccupied neighbors carry
/// `NO_LABEL` and never take part.
#[inline(always)]
fn merge(m: Label, neighbor: Label) -> Label {
    if neighbor == NO_LABEL { m } else { m.min(neighbor) }
}

/// Relax `next[row, col_start..col_start + out.len()]` into `out`.
/// Returns whether any label in the span changed.
#[inline(always)]
fn sweep_span(
    grid: &OccupancyGrid,
    current: &[Label],
    row: usize,
    col_start: usize,
    out: &mut [Label],
) -> bool {
    let rows = grid.rows();
    let cols = grid.cols();
    let occupied = grid.cells();
    let has_up = row > 0;
    let has_down = row + 1 < rows;
    let base = row * cols;

    let mut changed = false;
    for (offset, slot) in out.iter_mut().enumerate() {
        let col = col_start + offset;
        let idx = base + col;
        if !occupied[idx] {
            *slot = NO_LABEL;
            continue;
        }
        // Self-inclusive: the cell's own previous label is a candidate.
        let old = current[idx];
        let mut m = old;
        if has_up {
            m = merge(m, current[idx - cols]);
        }
        if has_down {
            m = merge(m, current[idx + cols]);
        }
        if col > 0 {
            m = merge(m, current[idx - 1]);
        }
        if col + 1 < cols {
            m = merge(m, current[idx + 1]);
        }
        *slot = m;
        changed |= m != old;
    }
    changed
}

#[inline]
fn check_shapes(grid: &OccupancyGrid, current: &[Label], next: &[Label]) {
    assert_eq!(current.len(), grid.len(), "current buffer shape mismatch");
    assert_eq!(next.len(), grid.len(), "next buffer shape mismatch");
}

/// One sweep on the calling thread.
pub fn sweep_sequential(grid: &OccupancyGrid, current: &[Label], next: &mut [Label]) -> bool {
    check_shapes(grid, current, next);
    if grid.is_empty() {
        return false;
    }
    let cols = grid.cols();
    let mut changed = false;
    for (row, out) in next.chunks_mut(cols).enumerate() {
        changed |= sweep_span(grid, current, row, 0, out);
    }
    changed
}

/// One sweep split across the current rayon pool.
///
/// Produces the same `next` and the same result as [`sweep_sequential`] for
/// every decomposition and block size. Returns only after all workers are
/// done, which is the barrier the driver relies on before flipping buffers.
pub fn sweep_parallel(
    grid: &OccupancyGrid,
    current: &[Label],
    next: &mut [Label],
    decomposition: Decomposition,
) -> bool {
    check_shapes(grid, current, next);
    if grid.is_empty() {
        return false;
    }
    let rows = grid.rows();
    let cols = grid.cols();

    match decomposition {
        Decomposition::Rows { block } => {
            let block = block.clamp(1, rows);
            next.par_chunks_mut(block * cols)
                .enumerate()
                .map(|(chunk, rows_out)| {
                    let first_row = chunk * block;
                    let mut changed = false;
                    for (offset, out) in rows_out.chunks_mut(cols).enumerate() {
                        changed |= sweep_span(grid, current, first_row + offset, 0, out);
                    }
                    changed
                })
                .reduce(|| false, |a, b| a | b)
        }
        Decomposition::Columns { block } => {
            let block = block.clamp(1, cols);
            let writer = DisjointWriter::new(next);
            (0..cols.div_ceil(block))
                .into_par_iter()
                .map(|band| {
                    let col_start = band * block;
                    let width = block.min(cols - col_start);
                    let mut changed = false;
                    for row in 0..rows {
                        // SAFETY: column bands are disjoint, so spans from
                        // different workers never overlap.
                        let out = unsafe { writer.span(row * cols + col_start, width) };
                        changed |= sweep_span(grid, current, row, col_start, out);
                    }
                    changed
                })
                .reduce(|| false, |a, b| a | b)
        }
        Decomposition::Tiles { height, width } => {
            let height = height.clamp(1, rows);
            let width = width.clamp(1, cols);
            let tiles_across = cols.div_ceil(width);
            let tiles_down = rows.div_ceil(height);
            let writer = DisjointWriter::new(next);
            (0..tiles_down * tiles_across)
                .into_par_iter()
                .map(|tile| {
                    let row_start = (tile / tiles_across) * height;
                    let col_start = (tile % tiles_across) * width;
                    let row_end = (row_start + height).min(rows);
                    let span_width = width.min(cols - col_start);
                    let mut changed = false;
                    for row in row_start..row_end {
                        // SAFETY: tiles partition the grid, so spans from
                        // different workers never overlap.
                        let out = unsafe { writer.span(row * cols + col_start, span_width) };
                        changed |= sweep_span(grid, current, row, col_start, out);
                    }
                    changed
                })
                .reduce(|| false, |a, b| a | b)
        }
    }
}

#[inline]
pub fn sweep(
    grid: &OccupancyGrid,
    current: &[Label],
    next: &mut [Label],
    schedule: Schedule,
) -> bool {
    match schedule {
        Schedule::Sequential => sweep_sequential(grid, current, next),
        Schedule::Parallel(decomposition) => sweep_parallel(grid, current, next, decomposition),
    }
}
