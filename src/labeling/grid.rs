//! Grid storage for connected-component labeling.
//!
//! Everything is flat and row-major (`index = row * cols + col`):
//! - `OccupancyGrid`: immutable binary input
//! - `LabelBuffers`: double-buffered labels with a phase bit, so a sweep
//!   reads `bufs[phase]` and writes `bufs[1 - phase]`

use crate::error::{Error, Result};

/// Component tag. `0` marks an unoccupied cell.
pub type Label = u32;

/// Label of unoccupied cells.
pub const NO_LABEL: Label = 0;

/// Largest grid whose linear indices all map to distinct nonzero labels.
pub const MAX_CELLS: usize = Label::MAX as usize;

#[inline]
fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    let cells = rows.checked_mul(cols).ok_or(Error::InvalidDimension {
        rows,
        cols,
        reason: "cell count overflows usize",
    })?;
    if cells > MAX_CELLS {
        return Err(Error::GridTooLarge {
            cells,
            max: MAX_CELLS,
        });
    }
    Ok(cells)
}

/// Binary occupancy grid. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// An all-unoccupied grid. Either dimension may be zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            cells: vec![false; len],
        })
    }

    pub fn from_cells(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        if cells.len() != len {
            return Err(Error::InvalidDimension {
                rows,
                cols,
                reason: "cell count does not match rows * cols",
            });
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let len = checked_len(rows, cols)?;
        let mut cells = Vec::with_capacity(len);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Ok(Self { rows, cols, cells })
    }

    /// Parse rows of `#`/`1` (occupied) and `.`/`0` (unoccupied).
    ///
    /// Blank lines and surrounding whitespace are ignored, which lets tests
    /// write grids as indented string literals.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        let lines: Vec<&str> = pattern
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let rows = lines.len();
        let cols = lines.first().map_or(0, |line| line.chars().count());

        let mut cells = Vec::with_capacity(rows * cols);
        for line in &lines {
            if line.chars().count() != cols {
                return Err(Error::InvalidDimension {
                    rows,
                    cols,
                    reason: "ragged pattern rows",
                });
            }
            for ch in line.chars() {
                match ch {
                    '#' | '1' => cells.push(true),
                    '.' | '0' => cells.push(false),
                    _ => {
                        return Err(Error::InvalidDimension {
                            rows,
                            cols,
                            reason: "pattern cells must be one of '#', '1', '.', '0'",
                        });
                    }
                }
            }
        }
        Self::from_cells(rows, cols, cells)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    #[inline(always)]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(row, col)]
    }

    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }
}

/// Two same-shaped label buffers with a driver-owned phase bit.
///
/// `bufs[phase]` is current (read), `bufs[1 - phase]` is next (write).
/// `flip` swaps the roles without copying.
#[derive(Clone, Debug)]
pub struct LabelBuffers {
    bufs: [Vec<Label>; 2],
    phase: usize,
    rows: usize,
    cols: usize,
}

impl LabelBuffers {
    pub fn new(rows: usize, cols: usize) -> Self {
        let len = rows * cols;
        Self {
            bufs: [vec![NO_LABEL; len], vec![NO_LABEL; len]],
            phase: 0,
            rows,
            cols,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn current(&self) -> &[Label] {
        &self.bufs[self.phase]
    }

    #[inline(always)]
    pub fn current_mut(&mut self) -> &mut [Label] {
        &mut self.bufs[self.phase]
    }

    /// Split borrow: read-only current, write-only next.
    #[inline]
    pub fn current_and_next_mut(&mut self) -> (&[Label], &mut [Label]) {
        let (a, b) = self.bufs.split_at_mut(1);
        if self.phase == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    #[inline(always)]
    pub fn flip(&mut self) {
        self.phase ^= 1;
    }

    #[inline]
    pub fn phase(&self) -> usize {
        self.phase
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Label {
        self.current()[row * self.cols + col]
    }

    pub fn into_current(self) -> Vec<Label> {
        let [a, b] = self.bufs;
        if self.phase == 0 { a } else { b }
    }
}
