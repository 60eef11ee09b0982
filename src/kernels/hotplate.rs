//! Jacobi relaxation of a square heat plate with a fixed boundary.
//!
//! Same double-buffering scheme as the labeling kernel: each sweep reads the
//! frozen current plate and writes the interior of the next one. The
//! convergence measure is a max-reduction of per-cell change instead of an OR.

use log::{debug, warn};
use rayon::prelude::*;

use crate::mode::{ExecutionMode, Termination};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelaxationReport {
    pub iterations: u64,
    /// Largest per-cell change in the last sweep.
    pub max_diff: f64,
    pub termination: Termination,
}

#[derive(Clone, Debug)]
pub struct HotPlate {
    n: usize,
    temps: [Vec<f64>; 2],
    phase: usize,
}

#[inline(always)]
fn relax_row(current: &[f64], n: usize, i: usize, out: &mut [f64]) -> f64 {
    let mut max_diff = 0.0f64;
    for j in 1..n - 1 {
        let idx = i * n + j;
        let here = current[idx];
        let val = (current[idx + n] + current[idx - n] + current[idx + 1] + current[idx - 1]
            + 4.0 * here)
            / 8.0;
        max_diff = max_diff.max((val - here).abs());
        out[j] = val;
    }
    max_diff
}

#[inline(always)]
fn hot_in_row(temps: &[f64], n: usize, i: usize, threshold: f64) -> usize {
    (1..n - 1)
        .filter(|&j| {
            let idx = i * n + j;
            let avg = 0.25 * (temps[idx + n] + temps[idx - n] + temps[idx + 1] + temps[idx - 1]);
            (temps[idx] - avg).abs() > threshold
        })
        .count()
}

impl HotPlate {
    /// An `n x n` plate at temperature zero everywhere.
    pub fn new(n: usize) -> Self {
        Self::from_fn(n, |_, _| 0.0)
    }

    /// Initial temperatures from `f(row, col)`. Boundary values stay fixed.
    pub fn from_fn<F>(n: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut temps = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                temps.push(f(i, j));
            }
        }
        Self {
            n,
            temps: [temps.clone(), temps],
            phase: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn temperatures(&self) -> &[f64] {
        &self.temps[self.phase]
    }

    #[inline]
    pub fn temperature(&self, i: usize, j: usize) -> f64 {
        self.temperatures()[i * self.n + j]
    }

    /// One sweep over the interior. Returns the largest per-cell change.
    pub fn sweep(&mut self, mode: ExecutionMode) -> f64 {
        let n = self.n;
        if n < 3 {
            return 0.0;
        }
        let (a, b) = self.temps.split_at_mut(1);
        let (current, next) = if self.phase == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        };

        let interior = &mut next[n..n * (n - 1)];
        let max_diff = match mode {
            ExecutionMode::Sequential => interior
                .chunks_mut(n)
                .enumerate()
                .map(|(offset, out)| relax_row(current, n, offset + 1, out))
                .fold(0.0, f64::max),
            ExecutionMode::Parallel => interior
                .par_chunks_mut(n)
                .enumerate()
                .map(|(offset, out)| relax_row(current, n, offset + 1, out))
                .reduce(|| 0.0, f64::max),
        };
        self.phase ^= 1;
        max_diff
    }

    /// Sweep until the largest change drops below `tolerance` or
    /// `max_iters` sweeps have run. Always runs at least one sweep.
    pub fn relax(
        &mut self,
        tolerance: f64,
        max_iters: u64,
        mode: ExecutionMode,
    ) -> RelaxationReport {
        let mut iterations = 0u64;
        loop {
            let max_diff = self.sweep(mode);
            iterations += 1;
            if max_diff < tolerance {
                debug!("hot plate {0}x{0} converged after {iterations} sweeps", self.n);
                return RelaxationReport {
                    iterations,
                    max_diff,
                    termination: Termination::Converged,
                };
            }
            if iterations >= max_iters {
                warn!(
                    "hot plate {0}x{0} stopped at {iterations} sweeps (max diff {max_diff:.4})",
                    self.n
                );
                return RelaxationReport {
                    iterations,
                    max_diff,
                    termination: Termination::Capped,
                };
            }
        }
    }

    /// Interior cells whose temperature differs from the mean of their four
    /// neighbors by more than `threshold`.
    pub fn hot_cells(&self, threshold: f64, mode: ExecutionMode) -> usize {
        let n = self.n;
        if n < 3 {
            return 0;
        }
        let temps = self.temperatures();
        match mode {
            ExecutionMode::Sequential => {
                (1..n - 1).map(|i| hot_in_row(temps, n, i, threshold)).sum()
            }
            ExecutionMode::Parallel => (1..n - 1)
                .into_par_iter()
                .map(|i| hot_in_row(temps, n, i, threshold))
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HotPlate;
    use crate::mode::{ExecutionMode, Termination};

    fn hot_top_edge(n: usize) -> HotPlate {
        HotPlate::from_fn(n, |i, _| if i == 0 { 100.0 } else { 0.0 })
    }

    #[test]
    fn cold_plate_converges_in_one_sweep() {
        let mut plate = HotPlate::new(16);
        let report = plate.relax(0.1, 10_000, ExecutionMode::Parallel);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.max_diff, 0.0);
        assert_eq!(report.termination, Termination::Converged);
        assert_eq!(plate.hot_cells(0.1, ExecutionMode::Sequential), 0);
    }

    #[test]
    fn boundary_stays_fixed() {
        let mut plate = hot_top_edge(10);
        plate.relax(1e-3, 500, ExecutionMode::Sequential);
        for j in 0..10 {
            assert_eq!(plate.temperature(0, j), 100.0);
            assert_eq!(plate.temperature(9, j), 0.0);
        }
        for i in 1..9 {
            assert_eq!(plate.temperature(i, 0), 0.0);
            assert_eq!(plate.temperature(i, 9), 0.0);
        }
    }

    #[test]
    fn first_sweep_by_hand() {
        let mut plate = hot_top_edge(4);
        let diff = plate.sweep(ExecutionMode::Sequential);
        assert_eq!(diff, 12.5);
        assert_eq!(plate.temperature(1, 1), 12.5);
        assert_eq!(plate.temperature(1, 2), 12.5);
        assert_eq!(plate.temperature(2, 1), 0.0);
    }

    #[test]
    fn hot_cells_by_hand() {
        // Interior of the 4x4 plate is (1,1) (1,2) (2,1) (2,2).
        // (1,1) = 8 with neighbors 4, 0, 0, 0: |8 - 1| = 7.
        // (1,2) = 0 with neighbors 4, 0, 8, 0: |0 - 3| = 3.
        // (2,1) = 0 with neighbors 8, 0, 0, 0: |0 - 2| = 2.
        // (2,2) = 0 with neighbors all 0: 0.
        let plate = HotPlate::from_fn(4, |i, j| match (i, j) {
            (0, 1) => 4.0,
            (0, 2) => 4.0,
            (1, 1) => 8.0,
            _ => 0.0,
        });
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            assert_eq!(plate.hot_cells(6.5, mode), 1);
            assert_eq!(plate.hot_cells(2.5, mode), 2);
            assert_eq!(plate.hot_cells(2.0, mode), 2);
            assert_eq!(plate.hot_cells(1.5, mode), 3);
            assert_eq!(plate.hot_cells(0.0, mode), 3);
        }
    }

    #[test]
    fn tiny_plates_have_no_interior() {
        for n in 0..3 {
            let mut plate = HotPlate::from_fn(n, |_, _| 1.0);
            assert_eq!(plate.sweep(ExecutionMode::Parallel), 0.0);
            assert_eq!(plate.hot_cells(0.0, ExecutionMode::Parallel), 0);
        }
    }

    #[test]
    fn zero_tolerance_hits_the_cap() {
        let mut plate = hot_top_edge(12);
        let report = plate.relax(0.0, 7, ExecutionMode::Parallel);
        assert_eq!(report.termination, Termination::Capped);
        assert_eq!(report.iterations, 7);
        assert!(report.max_diff > 0.0);
    }

    #[test]
    fn parallel_relaxation_matches_sequential() {
        let mut seq = hot_top_edge(33);
        let mut par = hot_top_edge(33);
        let seq_report = seq.relax(0.05, 2_000, ExecutionMode::Sequential);
        let par_report = par.relax(0.05, 2_000, ExecutionMode::Parallel);
        assert_eq!(seq_report, par_report);
        assert_eq!(seq.temperatures(), par.temperatures());
        assert_eq!(
            seq.hot_cells(0.1, ExecutionMode::Sequential),
            par.hot_cells(0.1, ExecutionMode::Parallel)
        );
    }
}
