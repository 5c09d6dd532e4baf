//! `rankshift compare`: batch-versus-incremental solver comparison.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use rankshift_core::config::Config;
use rankshift_core::{ProcessGraphSource, ProcessSolver};
use rankshift_sim::{ComparisonExperiment, ComparisonReport};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `rankshift compare`.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Number of trials (overrides `compare.trials`).
    #[arg(long)]
    pub trials: Option<u32>,

    /// Mutation steps per trial (overrides `compare.iterations_per_trial`).
    #[arg(long)]
    pub iterations: Option<u32>,
}

/// JSON output for `rankshift compare`.
#[derive(Debug, Serialize)]
struct CompareOutput<'a> {
    #[serde(flatten)]
    report: &'a ComparisonReport,
    penalty_plot: PathBuf,
    time_plot: PathBuf,
}

fn effective_config(args: &CompareArgs, config: &Config) -> Result<Config> {
    let mut config = config.clone();
    if let Some(trials) = args.trials {
        config.compare.trials = trials;
    }
    if let Some(iterations) = args.iterations {
        config.compare.iterations_per_trial = iterations;
    }
    config.validate()?;
    Ok(config)
}

/// Execute `rankshift compare`.
pub fn run_compare(args: &CompareArgs, config: &Config, output: OutputMode) -> Result<()> {
    let config = effective_config(args, config)?;
    let tools = &config.tools;

    let solver = ProcessSolver::new(tools);
    let source = ProcessGraphSource::new(tools, &tools.generator);
    let mut experiment =
        ComparisonExperiment::new(config.compare.clone(), tools.work_dir.clone(), solver, source);
    let report = experiment.run()?;
    let (penalty_plot, time_plot) = report
        .write_plots(&config.compare)
        .context("Failed to write comparison plots")?;

    let out = CompareOutput {
        report: &report,
        penalty_plot,
        time_plot,
    };
    render_mode(output, &out, render_text, render_pretty)
}

fn render_series(report: &ComparisonReport, w: &mut dyn Write) -> std::io::Result<()> {
    for (i, (penalty, time)) in report
        .penalty_ratio
        .iter()
        .zip(&report.time_ratio)
        .enumerate()
    {
        writeln!(w, "{} {penalty:.6} {time:.6}", i + 1)?;
    }
    Ok(())
}

fn render_text(out: &CompareOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "compare trials={} iterations={} penalty_plot={} time_plot={}",
        out.report.trials,
        out.report.iterations_per_trial,
        out.penalty_plot.display(),
        out.time_plot.display()
    )?;
    render_series(out.report, w)
}

fn render_pretty(out: &CompareOutput<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Solver Comparison")?;
    pretty_kv(w, "Trials", out.report.trials.to_string())?;
    pretty_kv(w, "Iterations", out.report.iterations_per_trial.to_string())?;
    pretty_kv(w, "Penalty plot", out.penalty_plot.display().to_string())?;
    pretty_kv(w, "Time plot", out.time_plot.display().to_string())?;
    writeln!(w)?;
    writeln!(w, "iteration penalty_ratio time_ratio")?;
    render_series(out.report, w)
}
