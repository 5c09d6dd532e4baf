//! rankshift-sim library.
//!
//! Experiment drivers built on the `rankshift-core` ports: the single-edge
//! perturbation experiment with its movement tables and trace log, and the
//! batch-versus-incremental solver comparison with its ratio plots.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types; selection failures
//!   carry a `thiserror` enum with a machine-readable code.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod compare;
pub mod neighbors;
pub mod perturb;
pub mod plot;
pub mod report;
pub mod scenario;
pub mod stats;
pub mod trace;

pub use compare::{ComparisonExperiment, ComparisonReport, IterationSample};
pub use neighbors::NeighborSets;
pub use perturb::{IterationRecord, PerturbationExperiment, experiment_rng};
pub use report::PerturbationReport;
pub use scenario::{EdgePick, Mode, Scenario, Schedule, SelectionError};
pub use stats::{Movement, MovementStats, RelativePosition};
pub use trace::TraceLog;
