//! Execution mode shared by every kernel.

/// Whether a kernel runs on the calling thread or fans out on the current
/// rayon pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

impl ExecutionMode {
    #[inline]
    pub fn is_parallel(self) -> bool {
        self == ExecutionMode::Parallel
    }

    pub fn name(self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "serial",
            ExecutionMode::Parallel => "parallel",
        }
    }
}

/// Terminal state of an iterate-until-stable loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The last sweep met the stopping test; the state is a fixed point.
    Converged,
    /// The iteration cap was reached; results are best-effort.
    Capped,
}

impl Termination {
    pub fn name(self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::Capped => "capped",
        }
    }
}
