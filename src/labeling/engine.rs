use std::str::FromStr;
use std::sync::OnceLock;

use log::{debug, trace, warn};

use super::count::count_components_with;
use super::grid::{Label, LabelBuffers, OccupancyGrid};
use super::init::seed_labels;
use super::sweep::{Decomposition, Schedule, sweep};
use crate::error::{Error, Result};
use crate::mode::{ExecutionMode, Termination};

/// Safety cap on sweeps when the config does not set one.
pub const DEFAULT_MAX_SWEEPS: u64 = 1_000_000;

/// Environment override for the automatic schedule policy.
pub const SCHEDULE_ENV: &str = "GRID_KERNELS_SCHEDULE";

const PARALLEL_MIN_CELLS: usize = 16_384;
const ROW_BLOCKS_PER_WORKER: usize = 4;
const COLUMN_BLOCKS_PER_WORKER: usize = 4;
const TILE_SIDE: usize = 64;

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

/// Decomposition family, without block sizes. Resolved against a concrete
/// grid and worker count by [`ComponentLabeler::schedule_for`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    Sequential,
    Rows,
    Columns,
    Tiles,
}

impl FromStr for ScheduleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "serial" | "seq" => Ok(ScheduleKind::Sequential),
            "rows" | "row" | "parallel" => Ok(ScheduleKind::Rows),
            "columns" | "cols" | "column" => Ok(ScheduleKind::Columns),
            "tiles" | "tile" => Ok(ScheduleKind::Tiles),
            _ => Err(Error::UnknownSchedule(s.to_string())),
        }
    }
}

#[inline]
fn blocks_of(extent: usize, workers: usize, per_worker: usize) -> usize {
    extent
        .div_ceil(workers.max(1).saturating_mul(per_worker))
        .max(1)
}

/// Concrete schedule for a `rows x cols` grid on `workers` threads.
pub fn resolve_schedule(kind: ScheduleKind, rows: usize, cols: usize, workers: usize) -> Schedule {
    match kind {
        ScheduleKind::Sequential => Schedule::Sequential,
        ScheduleKind::Rows => Schedule::Parallel(Decomposition::Rows {
            block: blocks_of(rows, workers, ROW_BLOCKS_PER_WORKER),
        }),
        ScheduleKind::Columns => Schedule::Parallel(Decomposition::Columns {
            block: blocks_of(cols, workers, COLUMN_BLOCKS_PER_WORKER),
        }),
        ScheduleKind::Tiles => Schedule::Parallel(Decomposition::Tiles {
            height: TILE_SIDE,
            width: TILE_SIDE,
        }),
    }
}

#[inline]
fn auto_schedule_kind(cells: usize, workers: usize) -> ScheduleKind {
    if workers <= 1 || cells < PARALLEL_MIN_CELLS {
        ScheduleKind::Sequential
    } else {
        ScheduleKind::Rows
    }
}

/// Interpret a `GRID_KERNELS_SCHEDULE` value. Blank values mean "unset";
/// unknown names are logged and ignored.
fn parse_schedule_override(value: Option<&str>) -> Option<ScheduleKind> {
    let value = value?;
    if value.trim().is_empty() {
        return None;
    }
    match value.parse() {
        Ok(kind) => Some(kind),
        Err(err) => {
            warn!("ignoring {SCHEDULE_ENV}: {err}");
            None
        }
    }
}

/// An explicit config schedule wins over the environment override.
fn configured_schedule(
    explicit: Option<ScheduleKind>,
    env_value: Option<&str>,
) -> Option<ScheduleKind> {
    explicit.or_else(|| parse_schedule_override(env_value))
}

/// Resolve the thread count from a config, falling back to auto-detect.
fn resolve_thread_count(config: &LabelingConfig) -> usize {
    let mut threads = config.thread_count.unwrap_or_else(physical_core_count);
    if let Some(cap) = config.max_threads {
        threads = threads.min(cap);
    }
    threads.max(1)
}

/// Configuration for a [`ComponentLabeler`].
///
/// Use `LabelingConfig::default()` for auto-tuned defaults, or customise
/// individual knobs via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct LabelingConfig {
    /// Number of threads for the compute pool.
    /// `None` means one per physical core.
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of auto-detection.
    pub max_threads: Option<usize>,
    /// Decomposition family.
    /// `None` means `GRID_KERNELS_SCHEDULE` if set, otherwise sequential for
    /// small grids and row blocks for large ones.
    pub schedule: Option<ScheduleKind>,
    /// Sweep cap. `None` means [`DEFAULT_MAX_SWEEPS`].
    pub max_sweeps: Option<u64>,
}

impl LabelingConfig {
    /// Set an explicit thread count for the compute pool.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Set a hard upper bound on threads.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    /// Force a decomposition family.
    pub fn schedule(mut self, kind: ScheduleKind) -> Self {
        self.schedule = Some(kind);
        self
    }

    pub fn max_sweeps(mut self, cap: u64) -> Self {
        self.max_sweeps = Some(cap);
        self
    }
}

/// Double-buffered labeling state for one grid.
///
/// Owns both label buffers and the current/next role assignment; each
/// [`sweep`](Labeling::sweep) reads one buffer, writes the other, then flips.
pub struct Labeling<'g> {
    grid: &'g OccupancyGrid,
    buffers: LabelBuffers,
    sweeps: u64,
    changing_sweeps: u64,
}

impl<'g> Labeling<'g> {
    pub fn new(grid: &'g OccupancyGrid) -> Self {
        Self::with_seed_mode(grid, ExecutionMode::Sequential)
    }

    pub fn with_seed_mode(grid: &'g OccupancyGrid, mode: ExecutionMode) -> Self {
        let mut buffers = LabelBuffers::new(grid.rows(), grid.cols());
        seed_labels(grid, buffers.current_mut(), mode);
        Self {
            grid,
            buffers,
            sweeps: 0,
            changing_sweeps: 0,
        }
    }

    /// Run one sweep, flip buffers, and report whether any label changed.
    pub fn sweep(&mut self, schedule: Schedule) -> bool {
        let (current, next) = self.buffers.current_and_next_mut();
        let changed = sweep(self.grid, current, next, schedule);
        self.buffers.flip();
        self.sweeps += 1;
        if changed {
            self.changing_sweeps += 1;
        }
        trace!("sweep {} ({}): changed={changed}", self.sweeps, schedule.name());
        changed
    }

    /// Sweep until a sweep changes nothing or more than `max_sweeps` sweeps
    /// have run in this call.
    pub fn run(&mut self, schedule: Schedule, max_sweeps: u64) -> Termination {
        let start = self.sweeps;
        loop {
            let changed = self.sweep(schedule);
            if self.sweeps - start > max_sweeps {
                warn!(
                    "labeling {}x{} hit the sweep cap ({max_sweeps}); labels are best-effort",
                    self.grid.rows(),
                    self.grid.cols()
                );
                return Termination::Capped;
            }
            if !changed {
                return Termination::Converged;
            }
        }
    }

    #[inline]
    pub fn grid(&self) -> &OccupancyGrid {
        self.grid
    }

    #[inline]
    pub fn labels(&self) -> &[Label] {
        self.buffers.current()
    }

    #[inline]
    pub fn label(&self, row: usize, col: usize) -> Label {
        self.buffers.get(row, col)
    }

    /// Sweeps run so far, including the final one that detected convergence.
    #[inline]
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Sweeps that changed at least one label.
    #[inline]
    pub fn changing_sweeps(&self) -> u64 {
        self.changing_sweeps
    }

    pub fn into_labels(self) -> Vec<Label> {
        self.buffers.into_current()
    }
}

/// Result of a full labeling run.
#[derive(Clone, Debug)]
pub struct LabelingReport {
    pub termination: Termination,
    pub sweeps: u64,
    pub changing_sweeps: u64,
    pub components: usize,
    pub schedule: Schedule,
    pub rows: usize,
    pub cols: usize,
    pub labels: Vec<Label>,
}

impl LabelingReport {
    /// `true` when the labels are a proven fixed point, `false` when capped.
    #[inline]
    pub fn is_fixed_point(&self) -> bool {
        self.termination == Termination::Converged
    }

    #[inline]
    pub fn label(&self, row: usize, col: usize) -> Label {
        self.labels[row * self.cols + col]
    }
}

/// Configured connected-component labeler with its own worker pool.
pub struct ComponentLabeler {
    pool: rayon::ThreadPool,
    threads: usize,
    schedule: Option<ScheduleKind>,
    max_sweeps: u64,
}

impl ComponentLabeler {
    pub fn new() -> Result<Self> {
        Self::with_config(LabelingConfig::default())
    }

    /// Create a labeler with explicit configuration.
    pub fn with_config(config: LabelingConfig) -> Result<Self> {
        let threads = resolve_thread_count(&config);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("grid-kernels-{i}"))
            .build()?;
        let env_value = std::env::var(SCHEDULE_ENV).ok();
        let schedule = configured_schedule(config.schedule, env_value.as_deref());
        debug!("labeler: threads={threads} schedule={schedule:?}");

        Ok(Self {
            pool,
            threads,
            schedule,
            max_sweeps: config.max_sweeps.unwrap_or(DEFAULT_MAX_SWEEPS),
        })
    }

    #[inline]
    pub fn thread_count(&self) -> usize {
        self.threads
    }

    #[inline]
    pub fn max_sweeps(&self) -> u64 {
        self.max_sweeps
    }

    /// The concrete schedule this labeler uses for `grid`.
    pub fn schedule_for(&self, grid: &OccupancyGrid) -> Schedule {
        let kind = self
            .schedule
            .unwrap_or_else(|| auto_schedule_kind(grid.len(), self.threads));
        resolve_schedule(kind, grid.rows(), grid.cols(), self.threads)
    }

    /// Seed, propagate to a fixed point (or the cap), and count components.
    pub fn label(&self, grid: &OccupancyGrid) -> LabelingReport {
        let schedule = self.schedule_for(grid);
        let mode = match schedule {
            Schedule::Sequential => ExecutionMode::Sequential,
            Schedule::Parallel(_) => ExecutionMode::Parallel,
        };
        debug!(
            "labeling {}x{} grid ({} occupied) with {schedule:?}",
            grid.rows(),
            grid.cols(),
            grid.occupied_count()
        );

        self.pool.install(|| {
            let mut labeling = Labeling::with_seed_mode(grid, mode);
            let termination = labeling.run(schedule, self.max_sweeps);
            let sweeps = labeling.sweeps();
            let changing_sweeps = labeling.changing_sweeps();
            let labels = labeling.into_labels();
            let components = count_components_with(&labels, mode);
            debug!(
                "labeling {}: sweeps={sweeps} changing={changing_sweeps} components={components}",
                termination.name()
            );

            LabelingReport {
                termination,
                sweeps,
                changing_sweeps,
                components,
                schedule,
                rows: grid.rows(),
                cols: grid.cols(),
                labels,
            }
        })
    }
}
