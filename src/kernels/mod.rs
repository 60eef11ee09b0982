//! Comparison kernels: the same sequential/parallel split applied to
//! embarrassingly parallel matrix work and to heat-plate relaxation.

mod hotplate;
mod matops;
mod matrix;
mod matvec;

pub use hotplate::{HotPlate, RelaxationReport};
pub use matops::{MatOpsOutput, add, add_multiply_transpose, multiply, transpose};
pub use matrix::DenseMatrix;
pub use matvec::matvec;
