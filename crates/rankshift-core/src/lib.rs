//! rankshift-core library.
//!
//! File contracts and process adapters shared by the rankshift experiments:
//! the edge-list graph store, the level-assignment parser, the solution and
//! timing readers, and the ports through which the external hierarchy solver
//! and graph generators are invoked.
//!
//! # Conventions
//!
//! - **Errors**: each file contract has its own `thiserror` enum with a
//!   machine-readable code; configuration uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod graph;
pub mod levels;
pub mod solution;
pub mod solver;

pub use error::ErrorCode;
pub use graph::{Edge, Graph, GraphCounts, GraphError, count_file};
pub use levels::{Level, LevelAssignment, LevelError, LevelIndex};
pub use solver::{
    GraphSource, HierarchySolver, IncrementalRequest, ProcessGraphSource, ProcessSolver,
    SolveKind, SolverError,
};
