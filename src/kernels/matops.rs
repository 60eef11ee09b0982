//! Matrix add, multiply and transpose.
//!
//! Each operation has a data-parallel form (rows of the output handed to
//! workers). [`add_multiply_transpose`] instead shows functional
//! decomposition: the three operations run as independent tasks.

use rayon::prelude::*;

use super::matrix::DenseMatrix;
use crate::error::{Error, Result};
use crate::mode::ExecutionMode;

fn same_shape(op: &'static str, a: &DenseMatrix, b: &DenseMatrix) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch {
            op,
            expected: a.shape(),
            got: b.shape(),
        });
    }
    Ok(())
}

fn inner_dims_agree(a: &DenseMatrix, b: &DenseMatrix) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(Error::ShapeMismatch {
            op: "multiply",
            expected: (a.cols(), b.cols()),
            got: b.shape(),
        });
    }
    Ok(())
}

/// `C = A + B`.
pub fn add(a: &DenseMatrix, b: &DenseMatrix, mode: ExecutionMode) -> Result<DenseMatrix> {
    same_shape("add", a, b)?;
    let mut c = DenseMatrix::new(a.rows(), a.cols());
    let (lhs, rhs) = (a.as_slice(), b.as_slice());
    match mode {
        ExecutionMode::Sequential => {
            for ((out, x), y) in c.as_mut_slice().iter_mut().zip(lhs).zip(rhs) {
                *out = x + y;
            }
        }
        ExecutionMode::Parallel => {
            c.as_mut_slice()
                .par_iter_mut()
                .zip(lhs.par_iter().zip(rhs.par_iter()))
                .for_each(|(out, (x, y))| *out = x + y);
        }
    }
    Ok(c)
}

/// Accumulate row `i` of `A * B` into `out` in i-k-j order.
#[inline(always)]
fn multiply_row(a: &DenseMatrix, b: &DenseMatrix, i: usize, out: &mut [f64]) {
    for k in 0..a.cols() {
        let aik = a.get(i, k);
        for (slot, bkj) in out.iter_mut().zip(b.row(k)) {
            *slot += aik * bkj;
        }
    }
}

/// `C = A * B` with the classic triple loop, i-k-j order.
///
/// The output starts zeroed; every row accumulates in the same order in
/// both modes, so results are bit-identical.
pub fn multiply(a: &DenseMatrix, b: &DenseMatrix, mode: ExecutionMode) -> Result<DenseMatrix> {
    inner_dims_agree(a, b)?;
    let mut c = DenseMatrix::new(a.rows(), b.cols());
    if b.cols() == 0 {
        return Ok(c);
    }
    match mode {
        ExecutionMode::Sequential => {
            for (i, out) in c.as_mut_slice().chunks_mut(b.cols()).enumerate() {
                multiply_row(a, b, i, out);
            }
        }
        ExecutionMode::Parallel => {
            c.as_mut_slice()
                .par_chunks_mut(b.cols())
                .enumerate()
                .for_each(|(i, out)| multiply_row(a, b, i, out));
        }
    }
    Ok(c)
}

#[inline(always)]
fn transpose_column(a: &DenseMatrix, j: usize, out: &mut [f64]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = a.get(i, j);
    }
}

/// `Aᵀ`. Row `j` of the output is column `j` of `A`.
pub fn transpose(a: &DenseMatrix, mode: ExecutionMode) -> DenseMatrix {
    let mut t = DenseMatrix::new(a.cols(), a.rows());
    if a.rows() == 0 {
        return t;
    }
    match mode {
        ExecutionMode::Sequential => {
            for (j, out) in t.as_mut_slice().chunks_mut(a.rows()).enumerate() {
                transpose_column(a, j, out);
            }
        }
        ExecutionMode::Parallel => {
            t.as_mut_slice()
                .par_chunks_mut(a.rows())
                .enumerate()
                .for_each(|(j, out)| transpose_column(a, j, out));
        }
    }
    t
}

/// Results of [`add_multiply_transpose`].
#[derive(Clone, Debug, PartialEq)]
pub struct MatOpsOutput {
    pub sum: DenseMatrix,
    pub product: DenseMatrix,
    pub transpose: DenseMatrix,
}

/// Compute `A + B`, `A * B` and `Aᵀ`.
///
/// In parallel mode the three operations are independent tasks (one
/// `rayon::join` per split), each running its sequential form.
pub fn add_multiply_transpose(
    a: &DenseMatrix,
    b: &DenseMatrix,
    mode: ExecutionMode,
) -> Result<MatOpsOutput> {
    same_shape("add", a, b)?;
    inner_dims_agree(a, b)?;
    let serial = ExecutionMode::Sequential;

    let (sum, (product, transpose)) = match mode {
        ExecutionMode::Sequential => (
            add(a, b, serial)?,
            (multiply(a, b, serial)?, transpose(a, serial)),
        ),
        ExecutionMode::Parallel => {
            let (sum, (product, t)) = rayon::join(
                || add(a, b, serial),
                || rayon::join(|| multiply(a, b, serial), || transpose(a, serial)),
            );
            (sum?, (product?, t))
        }
    };
    Ok(MatOpsOutput {
        sum,
        product,
        transpose,
    })
}

#[cfg(test)]
mod tests {
    use super::{add, add_multiply_transpose, multiply, transpose};
    use crate::error::Error;
    use crate::kernels::matrix::DenseMatrix;
    use crate::mode::ExecutionMode;

    fn sample(rows: usize, cols: usize, salt: usize) -> DenseMatrix {
        DenseMatrix::from_fn(rows, cols, |i, j| ((i * 13 + j * 7 + salt) % 11) as f64 - 5.0)
    }

    #[test]
    fn two_by_two_by_hand() {
        let a = DenseMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = DenseMatrix::from_vec(2, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        let out = add_multiply_transpose(&a, &b, ExecutionMode::Sequential).unwrap();
        assert_eq!(out.sum.as_slice(), &[1.0, 3.0, 4.0, 4.0]);
        assert_eq!(out.product.as_slice(), &[2.0, 1.0, 4.0, 3.0]);
        assert_eq!(out.transpose.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn identity_is_neutral_for_multiply() {
        let a = sample(9, 9, 3);
        let id = DenseMatrix::identity(9);
        assert_eq!(multiply(&a, &id, ExecutionMode::Parallel).unwrap(), a);
        assert_eq!(multiply(&id, &a, ExecutionMode::Sequential).unwrap(), a);
    }

    #[test]
    fn rectangular_transpose_swaps_indices() {
        let a = sample(3, 5, 1);
        let t = transpose(&a, ExecutionMode::Parallel);
        assert_eq!(t.shape(), (5, 3));
        for i in 0..3 {
            for j in 0..5 {
                assert_eq!(t.get(j, i), a.get(i, j));
            }
        }
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let a = sample(2, 3, 0);
        let b = sample(2, 3, 1);
        assert!(matches!(
            multiply(&a, &b, ExecutionMode::Sequential),
            Err(Error::ShapeMismatch { op: "multiply", .. })
        ));
        assert!(matches!(
            add(&a, &sample(3, 2, 0), ExecutionMode::Parallel),
            Err(Error::ShapeMismatch { op: "add", .. })
        ));
    }

    #[test]
    fn task_parallel_matches_sequential() {
        let a = sample(48, 48, 2);
        let b = sample(48, 48, 5);
        let seq = add_multiply_transpose(&a, &b, ExecutionMode::Sequential).unwrap();
        let par = add_multiply_transpose(&a, &b, ExecutionMode::Parallel).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn data_parallel_forms_match_sequential() {
        let a = sample(33, 20, 4);
        let b = sample(20, 17, 8);
        let c = sample(33, 20, 9);
        assert_eq!(
            multiply(&a, &b, ExecutionMode::Sequential).unwrap(),
            multiply(&a, &b, ExecutionMode::Parallel).unwrap()
        );
        assert_eq!(
            add(&a, &c, ExecutionMode::Sequential).unwrap(),
            add(&a, &c, ExecutionMode::Parallel).unwrap()
        );
        assert_eq!(
            transpose(&a, ExecutionMode::Sequential),
            transpose(&a, ExecutionMode::Parallel)
        );
    }
}
