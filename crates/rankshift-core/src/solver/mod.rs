//! Ports through which experiments reach the external tools.
//!
//! The hierarchy solver, the MIP script and the graph generators are opaque
//! programs that communicate only through files in a shared scratch
//! directory. Experiments talk to them through two narrow synchronous traits:
//!
//! - [`HierarchySolver`]: compute a level assignment for a graph file (batch
//!   or incremental), then read the penalty and elapsed time the last run
//!   left behind.
//! - [`GraphSource`]: produce a fresh random graph file, or a mutated copy of
//!   an existing one.
//!
//! The process-backed implementations live in [`process`]. Tests substitute
//! in-memory implementations without touching the experiment drivers.
//!
//! Every call blocks until the external program exits. The scratch files are
//! a single-writer handoff channel, so calls must never overlap; both traits
//! take `&mut self` to make that explicit.

pub mod process;

use std::path::Path;

use crate::error::ErrorCode;
use crate::graph::GraphError;
use crate::levels::{Level, LevelAssignment, LevelError};
use crate::solution::SolutionError;

pub use process::{ProcessGraphSource, ProcessSolver, ToolCommand, reset_work_dir};

/// Which solver produced a solution file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveKind {
    /// Full re-solve of the graph from scratch.
    Batch,
    /// Partial re-solve seeded with a previous assignment.
    Incremental,
}

/// Inputs for an incremental solve.
#[derive(Debug, Clone, Copy)]
pub struct IncrementalRequest<'a> {
    /// Graph to rank.
    pub graph: &'a Path,
    /// Graph the previous assignment was computed for.
    pub previous_graph: &'a Path,
    /// Assignment to start from.
    pub previous: &'a LevelAssignment,
    pub levels: Level,
    /// Neighbourhood radius re-ranked around changed edges.
    pub neighborhood: u32,
    /// Largest level change allowed for a single node.
    pub max_level_change: Level,
}

/// Errors raised by solver and graph-source adapters.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The external program could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program exited unsuccessfully.
    #[error("`{command}` exited with status {status}")]
    ExitStatus { command: String, status: i32 },

    /// An expected output file was not produced.
    #[error("`{command}` did not produce {path}")]
    MissingOutput { command: String, path: String },

    /// Filesystem failure around a tool invocation.
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Levels(#[from] LevelError),

    #[error(transparent)]
    Solution(#[from] SolutionError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SolverError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Spawn { .. } => ErrorCode::SolverSpawnFailed,
            Self::ExitStatus { .. } => ErrorCode::SolverExitFailure,
            Self::MissingOutput { .. } => ErrorCode::SolverOutputMissing,
            Self::Io { .. } => ErrorCode::FileMissing,
            Self::Levels(e) => e.code(),
            Self::Solution(e) => e.code(),
            Self::Graph(e) => e.code(),
        }
    }
}

/// Synchronous port to the external hierarchy solver.
pub trait HierarchySolver {
    /// Rank `graph` from scratch into `levels` levels.
    ///
    /// # Errors
    ///
    /// Fails if a tool cannot run or an expected output file is missing.
    fn compute_levels(
        &mut self,
        graph: &Path,
        levels: Level,
        node_count: usize,
    ) -> Result<LevelAssignment, SolverError>;

    /// Re-rank `request.graph` starting from a previous assignment.
    ///
    /// # Errors
    ///
    /// Fails if a tool cannot run or an expected output file is missing.
    fn compute_levels_incremental(
        &mut self,
        request: &IncrementalRequest<'_>,
    ) -> Result<LevelAssignment, SolverError>;

    /// Penalty of the last solution of the given kind.
    ///
    /// # Errors
    ///
    /// Fails if the solution file is missing or malformed.
    fn read_penalty(&self, kind: SolveKind) -> Result<i64, SolverError>;

    /// Wall-clock seconds of the last MIP run. Consumes the measurement.
    ///
    /// # Errors
    ///
    /// Fails if no measurement is pending or it is malformed.
    fn read_elapsed_seconds(&mut self) -> Result<f64, SolverError>;

    /// Copy the last solution file of the given kind to `dest`.
    ///
    /// # Errors
    ///
    /// Fails if the copy cannot be made.
    fn archive_solution(&self, kind: SolveKind, dest: &Path) -> Result<(), SolverError>;
}

/// Synchronous port to the graph generator and mutator programs.
pub trait GraphSource {
    /// Write a fresh random graph to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Fails if the generator cannot run or produces no file.
    fn generate(&mut self, dest: &Path) -> Result<(), SolverError>;

    /// Write a copy of `src` with `count` random edge changes to `dst`.
    ///
    /// # Errors
    ///
    /// Fails if the mutator cannot run or produces no file.
    fn mutate(&mut self, src: &Path, dst: &Path, count: usize) -> Result<(), SolverError>;
}
