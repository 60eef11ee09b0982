//! Dense matrix-vector product, split across workers by rows.

use rayon::prelude::*;

use super::matrix::DenseMatrix;
use crate::error::{Error, Result};
use crate::mode::ExecutionMode;

#[inline(always)]
fn dot(row: &[f64], x: &[f64]) -> f64 {
    row.iter().zip(x).map(|(a, b)| a * b).sum()
}

/// `y = A x`.
///
/// Each output element depends on one row only, so the parallel path simply
/// hands rows to workers and is bit-identical to the sequential one.
pub fn matvec(a: &DenseMatrix, x: &[f64], mode: ExecutionMode) -> Result<Vec<f64>> {
    if x.len() != a.cols() {
        return Err(Error::ShapeMismatch {
            op: "matvec",
            expected: (a.cols(), 1),
            got: (x.len(), 1),
        });
    }

    let mut y = vec![0.0; a.rows()];
    if a.cols() == 0 {
        return Ok(y);
    }
    match mode {
        ExecutionMode::Sequential => {
            for (out, row) in y.iter_mut().zip(a.as_slice().chunks_exact(a.cols())) {
                *out = dot(row, x);
            }
        }
        ExecutionMode::Parallel => {
            y.par_iter_mut()
                .zip(a.as_slice().par_chunks_exact(a.cols()))
                .for_each(|(out, row)| *out = dot(row, x));
        }
    }
    Ok(y)
}
