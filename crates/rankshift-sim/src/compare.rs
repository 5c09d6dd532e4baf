//! Batch-versus-incremental solver comparison.
//!
//! Each trial starts from a freshly generated graph. The batch solver ranks
//! it once; that assignment seeds the incremental solver. The graph is then
//! mutated step by step, and at every step both solvers rank the same
//! mutated graph:
//!
//! - the incremental solver starts from its own previous assignment and the
//!   previous graph;
//! - the batch solver ranks from scratch.
//!
//! Per iteration the experiment records the penalty ratio
//! `incremental / batch` and the ratio of cumulative MIP running times since
//! the start of the trial. Ratios are summed across trials and divided by
//! the trial count at the end.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use rankshift_core::config::CompareConfig;
use rankshift_core::solver::reset_work_dir;
use rankshift_core::{GraphSource, HierarchySolver, IncrementalRequest, SolveKind, count_file};

use crate::plot::ScatterPlot;

/// One iteration of one trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSample {
    pub trial: u32,
    pub iteration: u32,
    pub incremental_penalty: i64,
    pub batch_penalty: i64,
    /// Cumulative incremental MIP seconds since the start of the trial.
    pub incremental_seconds: f64,
    /// Cumulative batch MIP seconds since the start of the trial.
    pub batch_seconds: f64,
}

impl IterationSample {
    /// `incremental / batch` penalty, or the incremental penalty when the
    /// batch penalty is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn penalty_ratio(&self) -> f64 {
        if self.batch_penalty == 0 {
            self.incremental_penalty as f64
        } else {
            self.incremental_penalty as f64 / self.batch_penalty as f64
        }
    }

    /// `incremental / batch` cumulative time, or the incremental time when no
    /// batch time has been measured.
    #[must_use]
    pub fn time_ratio(&self) -> f64 {
        if self.batch_seconds > 0.0 {
            self.incremental_seconds / self.batch_seconds
        } else {
            self.incremental_seconds
        }
    }
}

/// Trial-averaged ratio series. Index `i` holds iteration `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub trials: u32,
    pub iterations_per_trial: u32,
    pub penalty_ratio: Vec<f64>,
    pub time_ratio: Vec<f64>,
    pub samples: Vec<IterationSample>,
}

impl ComparisonReport {
    /// Iteration numbers matching the ratio series.
    #[must_use]
    pub fn iterations(&self) -> Vec<f64> {
        (1..=self.iterations_per_trial).map(f64::from).collect()
    }

    /// Write the penalty and time plots to the configured paths.
    ///
    /// # Errors
    ///
    /// Fails if either plot cannot be rendered.
    pub fn write_plots(&self, config: &CompareConfig) -> Result<(PathBuf, PathBuf)> {
        let xs = self.iterations();
        let penalty_path = config.penalty_plot_path();
        let time_path = config.time_plot_path();

        ScatterPlot {
            caption: "Incremental vs batch penalty",
            x_label: "Iteration #",
            y_label: "sum(DHD)/sum(Hiden) penalties",
        }
        .render(&penalty_path, &xs, &self.penalty_ratio)
        .with_context(|| format!("Failed to plot {}", penalty_path.display()))?;

        ScatterPlot {
            caption: "Incremental vs batch running time",
            x_label: "Iteration #",
            y_label: "sum(DHD)/sum(Hiden) cumulative run time per iteration",
        }
        .render(&time_path, &xs, &self.time_ratio)
        .with_context(|| format!("Failed to plot {}", time_path.display()))?;

        Ok((penalty_path, time_path))
    }
}

/// Edge changes per mutation step: half of `mutation_rate` of the edges,
/// rounded up.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn perturbations_per_step(edges: usize, mutation_rate: f64) -> usize {
    (edges as f64 * mutation_rate / 2.0).ceil() as usize
}

/// Path of the `step`-th mutated copy of `graph` (`<graph>.mutate.<step>`).
#[must_use]
pub fn mutated_path(graph: &Path, step: u32) -> PathBuf {
    let mut name = OsString::from(graph.as_os_str());
    name.push(format!(".mutate.{step}"));
    PathBuf::from(name)
}

/// Driver for the comparison experiment.
#[derive(Debug)]
pub struct ComparisonExperiment<S, G> {
    config: CompareConfig,
    work_dir: PathBuf,
    solver: S,
    source: G,
}

impl<S: HierarchySolver, G: GraphSource> ComparisonExperiment<S, G> {
    pub const fn new(config: CompareConfig, work_dir: PathBuf, solver: S, source: G) -> Self {
        Self {
            config,
            work_dir,
            solver,
            source,
        }
    }

    /// Run every trial and return the averaged series.
    ///
    /// The work directory and the per-iteration output files are cleared
    /// first.
    ///
    /// # Errors
    ///
    /// Any tool or file failure aborts the run.
    pub fn run(&mut self) -> Result<ComparisonReport> {
        reset_work_dir(&self.work_dir).context("Failed to reset the work directory")?;
        for path in self.series_paths() {
            remove_if_present(path)?;
        }

        let n = self.config.iterations_per_trial as usize;
        let mut penalty_sum = vec![0.0; n];
        let mut time_sum = vec![0.0; n];
        let mut samples = Vec::with_capacity(n * self.config.trials as usize);

        for trial in 1..=self.config.trials {
            for sample in self.run_trial(trial)? {
                let idx = (sample.iteration - 1) as usize;
                penalty_sum[idx] += sample.penalty_ratio();
                time_sum[idx] += sample.time_ratio();
                samples.push(sample);
            }
        }

        let trials = f64::from(self.config.trials);
        Ok(ComparisonReport {
            trials: self.config.trials,
            iterations_per_trial: self.config.iterations_per_trial,
            penalty_ratio: penalty_sum.into_iter().map(|s| s / trials).collect(),
            time_ratio: time_sum.into_iter().map(|s| s / trials).collect(),
            samples,
        })
    }

    fn series_paths(&self) -> [&Path; 4] {
        [
            self.config.incremental_time_out.as_path(),
            self.config.batch_time_out.as_path(),
            self.config.incremental_penalty_out.as_path(),
            self.config.batch_penalty_out.as_path(),
        ]
    }

    fn run_trial(&mut self, trial: u32) -> Result<Vec<IterationSample>> {
        let graph = self.config.graph.clone();
        let levels = self.config.levels;
        let iterations = self.config.iterations_per_trial;

        self.source
            .generate(&graph)
            .context("Failed to generate trial graph")?;
        let trial_dir = self.work_dir.join(format!("trial{trial}"));
        fs::create_dir_all(&trial_dir)
            .with_context(|| format!("Failed to create {}", trial_dir.display()))?;
        if let Some(name) = graph.file_name() {
            fs::copy(&graph, trial_dir.join(name))
                .with_context(|| format!("Failed to archive {}", graph.display()))?;
        }

        let counts = count_file(&graph)?;
        let perturbations = perturbations_per_step(counts.edges, self.config.mutation_rate);
        info!(
            trial,
            nodes = counts.nodes,
            edges = counts.edges,
            perturbations,
            "starting trial"
        );

        let mut previous_state = self
            .solver
            .compute_levels(&graph, levels, counts.nodes)
            .context("Failed to compute the initial hierarchy")?;
        let mut previous_graph = graph.clone();
        self.source
            .mutate(&graph, &mutated_path(&graph, 1), perturbations)
            .context("Failed to mutate the original graph")?;

        let mut incremental_seconds = 0.0;
        let mut batch_seconds = 0.0;
        let mut samples = Vec::with_capacity(iterations as usize);

        for iteration in 1..=iterations {
            info!(trial, iteration, iterations, "starting iteration");
            let current = mutated_path(&graph, iteration);
            let iter_dir = trial_dir.join(format!("iter{iteration}"));
            fs::create_dir_all(&iter_dir)
                .with_context(|| format!("Failed to create {}", iter_dir.display()))?;

            let request = IncrementalRequest {
                graph: &current,
                previous_graph: &previous_graph,
                previous: &previous_state,
                levels,
                neighborhood: self.config.neighborhood,
                max_level_change: self.config.effective_max_level_change(),
            };
            let incremental = self
                .solver
                .compute_levels_incremental(&request)
                .context("Incremental solve failed")?;
            incremental_seconds += self.solver.read_elapsed_seconds()?;
            self.solver
                .archive_solution(SolveKind::Incremental, &iter_dir.join("dhd_state"))?;
            let incremental_penalty = self.solver.read_penalty(SolveKind::Incremental)?;

            self.solver
                .compute_levels(&current, levels, counts.nodes)
                .context("Batch solve failed")?;
            batch_seconds += self.solver.read_elapsed_seconds()?;
            self.solver
                .archive_solution(SolveKind::Batch, &iter_dir.join("hid_state"))?;
            let batch_penalty = self.solver.read_penalty(SolveKind::Batch)?;

            if iteration < iterations {
                self.source
                    .mutate(&current, &mutated_path(&graph, iteration + 1), perturbations)
                    .context("Failed to mutate graph")?;
            }
            previous_state = incremental;
            previous_graph = current;

            let sample = IterationSample {
                trial,
                iteration,
                incremental_penalty,
                batch_penalty,
                incremental_seconds,
                batch_seconds,
            };
            debug!(
                penalty_ratio = sample.penalty_ratio(),
                time_ratio = sample.time_ratio(),
                "iteration finished"
            );
            self.append_series(&sample)?;
            samples.push(sample);
        }

        Ok(samples)
    }

    /// Append `trial iteration value` lines to the four series files.
    fn append_series(&self, sample: &IterationSample) -> Result<()> {
        let values = [
            sample.incremental_seconds.to_string(),
            sample.batch_seconds.to_string(),
            sample.incremental_penalty.to_string(),
            sample.batch_penalty.to_string(),
        ];
        for (path, value) in self.series_paths().into_iter().zip(values) {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            writeln!(file, "{} {} {value}", sample.trial, sample.iteration)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => {
            Err(e).with_context(|| format!("Failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(incremental_penalty: i64, batch_penalty: i64, inc: f64, batch: f64) -> IterationSample {
        IterationSample {
            trial: 1,
            iteration: 1,
            incremental_penalty,
            batch_penalty,
            incremental_seconds: inc,
            batch_seconds: batch,
        }
    }

    #[test]
    fn penalty_ratio_falls_back_to_incremental_penalty() {
        assert!((sample(6, 4, 1.0, 1.0).penalty_ratio() - 1.5).abs() < 1e-9);
        assert!((sample(3, 0, 1.0, 1.0).penalty_ratio() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn time_ratio_falls_back_to_incremental_time() {
        assert!((sample(1, 1, 1.0, 4.0).time_ratio() - 0.25).abs() < 1e-9);
        assert!((sample(1, 1, 2.0, 0.0).time_ratio() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn perturbations_round_up_half_the_rate() {
        assert_eq!(perturbations_per_step(150, 0.025), 2);
        assert_eq!(perturbations_per_step(80, 0.025), 1);
        assert_eq!(perturbations_per_step(0, 0.025), 0);
    }

    #[test]
    fn mutated_paths_number_each_step() {
        assert_eq!(
            mutated_path(Path::new("data/sf_75_2_1"), 3),
            PathBuf::from("data/sf_75_2_1.mutate.3")
        );
    }
}
