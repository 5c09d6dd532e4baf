use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::levels::Level;

/// Full experiment configuration, usually read from `rankshift.toml`.
///
/// Every field has a default matching the values the experiments were
/// historically run with, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub perturb: PerturbConfig,
    #[serde(default)]
    pub compare: CompareConfig,
}

/// Locations of the external programs and of the shared scratch directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_java")]
    pub java: PathBuf,
    #[serde(default = "default_solver_jar")]
    pub solver_jar: PathBuf,
    #[serde(default = "default_mip_script")]
    pub mip_script: PathBuf,
    /// Random graph generator for the comparison experiment.
    #[serde(default = "default_generator")]
    pub generator: PathBuf,
    /// Random graph generator for the perturbation experiment.
    #[serde(default = "default_move_generator")]
    pub move_generator: PathBuf,
    /// Scratch directory shared with the solver (`__state`, `out.sol`, `time`).
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            solver_jar: default_solver_jar(),
            mip_script: default_mip_script(),
            generator: default_generator(),
            move_generator: default_move_generator(),
            work_dir: default_work_dir(),
        }
    }
}

/// Parameters of the single-edge perturbation experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerturbConfig {
    #[serde(default = "default_move_graph")]
    pub graph: PathBuf,
    #[serde(default = "default_new_move_graph")]
    pub mutated_graph: PathBuf,
    #[serde(default = "default_perturb_levels")]
    pub levels: Level,
    #[serde(default = "default_perturb_iterations")]
    pub iterations: u64,
    #[serde(default = "default_trace_log")]
    pub trace_log: PathBuf,
    /// Fixed RNG seed; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PerturbConfig {
    fn default() -> Self {
        Self {
            graph: default_move_graph(),
            mutated_graph: default_new_move_graph(),
            levels: default_perturb_levels(),
            iterations: default_perturb_iterations(),
            trace_log: default_trace_log(),
            seed: None,
        }
    }
}

/// Parameters of the batch-versus-incremental comparison experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    #[serde(default = "default_compare_graph")]
    pub graph: PathBuf,
    #[serde(default = "default_compare_levels")]
    pub levels: Level,
    /// Fraction of edges touched per mutation step (halved per direction).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Largest level change the incremental solver may apply; defaults to `levels`.
    #[serde(default)]
    pub max_level_change: Option<Level>,
    /// Neighbourhood radius the incremental solver re-ranks around changes.
    #[serde(default = "default_neighborhood")]
    pub neighborhood: u32,
    #[serde(default = "default_trials")]
    pub trials: u32,
    #[serde(default = "default_iterations_per_trial")]
    pub iterations_per_trial: u32,
    #[serde(default = "default_incremental_time_out")]
    pub incremental_time_out: PathBuf,
    #[serde(default = "default_batch_time_out")]
    pub batch_time_out: PathBuf,
    #[serde(default = "default_incremental_penalty_out")]
    pub incremental_penalty_out: PathBuf,
    #[serde(default = "default_batch_penalty_out")]
    pub batch_penalty_out: PathBuf,
    /// Directory the penalty and time plots are written to.
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            graph: default_compare_graph(),
            levels: default_compare_levels(),
            mutation_rate: default_mutation_rate(),
            max_level_change: None,
            neighborhood: default_neighborhood(),
            trials: default_trials(),
            iterations_per_trial: default_iterations_per_trial(),
            incremental_time_out: default_incremental_time_out(),
            batch_time_out: default_batch_time_out(),
            incremental_penalty_out: default_incremental_penalty_out(),
            batch_penalty_out: default_batch_penalty_out(),
            plot_dir: default_plot_dir(),
        }
    }
}

impl CompareConfig {
    #[must_use]
    pub fn effective_max_level_change(&self) -> Level {
        self.max_level_change.unwrap_or(self.levels)
    }

    /// Stem shared by both plot files, e.g. `sf_75_2_1_trials_10_mut_0.025_ld_17`.
    #[must_use]
    pub fn plot_stem(&self) -> String {
        let name = self
            .graph
            .file_name()
            .map_or_else(|| "graph".to_string(), |n| n.to_string_lossy().into_owned());
        format!(
            "{name}_trials_{}_mut_{}_ld_{}",
            self.trials,
            self.mutation_rate,
            self.effective_max_level_change()
        )
    }

    #[must_use]
    pub fn penalty_plot_path(&self) -> PathBuf {
        self.plot_dir.join(format!("{}_penalty.svg", self.plot_stem()))
    }

    #[must_use]
    pub fn time_plot_path(&self) -> PathBuf {
        self.plot_dir.join(format!("{}_time.svg", self.plot_stem()))
    }
}

impl Config {
    /// Load a configuration file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialise config")
    }

    /// Validate configuration before running.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.perturb.levels < 2 {
            bail!("perturb.levels must be >= 2");
        }
        if self.perturb.iterations == 0 {
            bail!("perturb.iterations must be > 0");
        }
        if self.compare.levels == 0 {
            bail!("compare.levels must be > 0");
        }
        if self.compare.trials == 0 {
            bail!("compare.trials must be > 0");
        }
        if self.compare.iterations_per_trial == 0 {
            bail!("compare.iterations_per_trial must be > 0");
        }
        if !(self.compare.mutation_rate > 0.0 && self.compare.mutation_rate <= 1.0) {
            bail!("compare.mutation_rate must be in (0, 1]");
        }
        Ok(())
    }
}

fn default_java() -> PathBuf {
    PathBuf::from("java")
}

fn default_solver_jar() -> PathBuf {
    PathBuf::from("DHD.jar")
}

fn default_mip_script() -> PathBuf {
    PathBuf::from("./scip_script")
}

fn default_generator() -> PathBuf {
    PathBuf::from("./new_graph")
}

fn default_move_generator() -> PathBuf {
    PathBuf::from("./new_graph_move")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_move_graph() -> PathBuf {
    PathBuf::from("move_graph")
}

fn default_new_move_graph() -> PathBuf {
    PathBuf::from("new_move_graph")
}

const fn default_perturb_levels() -> Level {
    9
}

const fn default_perturb_iterations() -> u64 {
    1000
}

fn default_trace_log() -> PathBuf {
    PathBuf::from("try_log")
}

fn default_compare_graph() -> PathBuf {
    PathBuf::from("sf_75_2_1")
}

const fn default_compare_levels() -> Level {
    17
}

const fn default_mutation_rate() -> f64 {
    0.025
}

const fn default_neighborhood() -> u32 {
    1
}

const fn default_trials() -> u32 {
    10
}

const fn default_iterations_per_trial() -> u32 {
    50
}

fn default_incremental_time_out() -> PathBuf {
    PathBuf::from("dhd_time.txt")
}

fn default_batch_time_out() -> PathBuf {
    PathBuf::from("hid_time.txt")
}

fn default_incremental_penalty_out() -> PathBuf {
    PathBuf::from("dhd_pen.txt")
}

fn default_batch_penalty_out() -> PathBuf {
    PathBuf::from("hid_pen.txt")
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from(".")
}
