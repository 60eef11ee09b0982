//! Connected-component labeling by iterated minimum-label propagation.

mod count;
mod engine;
mod grid;
mod init;
mod sweep;

pub use count::{count_components, count_components_parallel, count_components_with};
pub use engine::{
    ComponentLabeler, DEFAULT_MAX_SWEEPS, Labeling, LabelingConfig, LabelingReport,
    SCHEDULE_ENV, ScheduleKind, resolve_schedule,
};
pub use grid::{Label, LabelBuffers, MAX_CELLS, NO_LABEL, OccupancyGrid};
pub use init::{initial_labels, seed_labels};
pub use sweep::{Decomposition, Schedule, sweep, sweep_parallel, sweep_sequential};
