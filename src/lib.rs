//! Data-parallel grid kernels: connected-component labeling by Jacobi-style
//! minimum propagation, plus matrix and heat-plate comparison kernels.

pub mod error;
pub mod kernels;
pub mod labeling;
pub mod mode;

pub use error::{Error, Result};
pub use labeling::{ComponentLabeler, LabelingConfig, LabelingReport, OccupancyGrid};
pub use mode::{ExecutionMode, Termination};
