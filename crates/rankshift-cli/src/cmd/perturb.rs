//! `rankshift perturb`: single-edge perturbation experiment.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use rankshift_core::config::Config;
use rankshift_core::solver::reset_work_dir;
use rankshift_core::{ProcessGraphSource, ProcessSolver};
use rankshift_sim::{PerturbationExperiment, PerturbationReport, TraceLog, experiment_rng};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `rankshift perturb`.
#[derive(Args, Debug)]
pub struct PerturbArgs {
    /// Number of iterations (overrides `perturb.iterations`).
    #[arg(long)]
    pub iterations: Option<u64>,

    /// RNG seed for a reproducible run (overrides `perturb.seed`).
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Apply command-line overrides on top of the loaded configuration.
fn effective_config(args: &PerturbArgs, config: &Config) -> Result<Config> {
    let mut config = config.clone();
    if let Some(iterations) = args.iterations {
        config.perturb.iterations = iterations;
    }
    if args.seed.is_some() {
        config.perturb.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Execute `rankshift perturb`.
pub fn run_perturb(args: &PerturbArgs, config: &Config, output: OutputMode) -> Result<()> {
    let config = effective_config(args, config)?;
    let tools = &config.tools;
    reset_work_dir(&tools.work_dir).context("Failed to prepare the work directory")?;

    let solver = ProcessSolver::new(tools);
    let source = ProcessGraphSource::new(tools, &tools.move_generator);
    let rng = experiment_rng(config.perturb.seed);
    let mut trace = TraceLog::create(&config.perturb.trace_log)?;

    let mut experiment = PerturbationExperiment::new(config.perturb.clone(), solver, source, rng);
    let report = experiment.run(&mut trace)?;

    render_mode(
        output,
        &report,
        |r, w| w.write_all(r.render_text().as_bytes()),
        |r, w| render_pretty(r, &config, w),
    )
}

fn render_pretty(
    report: &PerturbationReport,
    config: &Config,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    pretty_section(w, "Perturbation Experiment")?;
    pretty_kv(w, "Iterations", report.iterations.to_string())?;
    pretty_kv(w, "Levels", report.levels.to_string())?;
    pretty_kv(w, "Trace log", config.perturb.trace_log.display().to_string())?;
    pretty_kv(
        w,
        "Seed",
        config
            .perturb
            .seed
            .map_or_else(|| "random".to_string(), |s| s.to_string()),
    )?;
    writeln!(w)?;
    w.write_all(report.render_text().as_bytes())
}
