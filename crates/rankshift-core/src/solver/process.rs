//! Subprocess-backed implementations of the solver ports.
//!
//! Scratch layout inside the work directory:
//!
//! | file | written by | meaning |
//! |---|---|---|
//! | `__state` | solver finalize step | level assignment of the last solve |
//! | `__mstate` | this adapter | previous assignment for incremental solves |
//! | `out.sol` | MIP script | solution of the last batch solve |
//! | `mut_sol.sol` | MIP script | solution of the last incremental solve |
//! | `time` | MIP script | seconds spent by the last MIP run |

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use super::{GraphSource, HierarchySolver, IncrementalRequest, SolveKind, SolverError};
use crate::config::ToolsConfig;
use crate::levels::{Level, LevelAssignment};
use crate::solution;

const STATE_FILE: &str = "__state";
const PREVIOUS_STATE_FILE: &str = "__mstate";
const BATCH_SOLUTION_FILE: &str = "out.sol";
const INCREMENTAL_SOLUTION_FILE: &str = "mut_sol.sol";
const TIME_FILE: &str = "time";

// ---------------------------------------------------------------------------
// ToolCommand
// ---------------------------------------------------------------------------

/// One blocking invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Human-readable command line for logs and errors.
    #[must_use]
    pub fn display(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }

    /// Run to completion, inheriting stdio.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Spawn`] if the program cannot start and
    /// [`SolverError::ExitStatus`] if it exits unsuccessfully.
    pub fn run(&self) -> Result<(), SolverError> {
        debug!(command = %self.display(), "running external tool");
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|source| SolverError::Spawn {
                command: self.display(),
                source,
            })?;
        if !status.success() {
            return Err(SolverError::ExitStatus {
                command: self.display(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    /// Run, then require that `output` exists.
    ///
    /// # Errors
    ///
    /// As [`ToolCommand::run`], plus [`SolverError::MissingOutput`].
    pub fn run_expecting(&self, output: &Path) -> Result<(), SolverError> {
        self.run()?;
        if !output.exists() {
            return Err(SolverError::MissingOutput {
                command: self.display(),
                path: output.display().to_string(),
            });
        }
        Ok(())
    }
}

fn remove_stale(path: &Path) -> Result<(), SolverError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(SolverError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// Delete and recreate the scratch directory.
///
/// # Errors
///
/// Returns [`SolverError::Io`] if the directory cannot be removed or created.
pub fn reset_work_dir(dir: &Path) -> Result<(), SolverError> {
    let io = |source| SolverError::Io {
        path: dir.display().to_string(),
        source,
    };
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(io(e)),
        _ => {}
    }
    fs::create_dir_all(dir).map_err(io)
}

// ---------------------------------------------------------------------------
// ProcessSolver
// ---------------------------------------------------------------------------

/// [`HierarchySolver`] backed by the solver jar and the MIP script.
#[derive(Debug, Clone)]
pub struct ProcessSolver {
    java: PathBuf,
    jar: PathBuf,
    mip_script: PathBuf,
    work_dir: PathBuf,
}

impl ProcessSolver {
    #[must_use]
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            java: tools.java.clone(),
            jar: tools.solver_jar.clone(),
            mip_script: tools.mip_script.clone(),
            work_dir: tools.work_dir.clone(),
        }
    }

    fn scratch(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    fn solution_path(&self, kind: SolveKind) -> PathBuf {
        match kind {
            SolveKind::Batch => self.scratch(BATCH_SOLUTION_FILE),
            SolveKind::Incremental => self.scratch(INCREMENTAL_SOLUTION_FILE),
        }
    }

    /// `java -jar <jar> -i <graph> -l <levels> -n <nodes>`
    fn formulate_command(&self, graph: &Path, levels: Level, node_count: usize) -> ToolCommand {
        ToolCommand::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .arg("-i")
            .arg(graph)
            .arg("-l")
            .arg(levels.to_string())
            .arg("-n")
            .arg(node_count.to_string())
    }

    /// `java -cp <jar> DHD.PartialSolver -i <graph> -p <prev state> -d <prev graph> -k <k> -c <c> -l <levels>`
    fn formulate_incremental_command(
        &self,
        request: &IncrementalRequest<'_>,
        previous_state: &Path,
    ) -> ToolCommand {
        ToolCommand::new(&self.java)
            .arg("-cp")
            .arg(&self.jar)
            .arg("DHD.PartialSolver")
            .arg("-i")
            .arg(request.graph)
            .arg("-p")
            .arg(previous_state)
            .arg("-d")
            .arg(request.previous_graph)
            .arg("-k")
            .arg(request.neighborhood.to_string())
            .arg("-c")
            .arg(request.max_level_change.to_string())
            .arg("-l")
            .arg(request.levels.to_string())
    }

    /// Solve the formulated MIP, then let the solver turn the solution into `__state`.
    fn solve_and_finalize(&self, kind: SolveKind) -> Result<LevelAssignment, SolverError> {
        let solution = self.solution_path(kind);
        let state = self.scratch(STATE_FILE);
        remove_stale(&solution)?;
        remove_stale(&state)?;

        ToolCommand::new(&self.mip_script)
            .arg(&solution)
            .run_expecting(&solution)?;

        ToolCommand::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .arg("-f")
            .arg(&solution)
            .run_expecting(&state)?;

        Ok(LevelAssignment::load(&state)?)
    }
}

impl HierarchySolver for ProcessSolver {
    #[instrument(skip(self))]
    fn compute_levels(
        &mut self,
        graph: &Path,
        levels: Level,
        node_count: usize,
    ) -> Result<LevelAssignment, SolverError> {
        self.formulate_command(graph, levels, node_count).run()?;
        self.solve_and_finalize(SolveKind::Batch)
    }

    #[instrument(skip(self, request), fields(graph = %request.graph.display()))]
    fn compute_levels_incremental(
        &mut self,
        request: &IncrementalRequest<'_>,
    ) -> Result<LevelAssignment, SolverError> {
        let previous_state = self.scratch(PREVIOUS_STATE_FILE);
        request.previous.write(&previous_state)?;
        self.formulate_incremental_command(request, &previous_state)
            .run()?;
        self.solve_and_finalize(SolveKind::Incremental)
    }

    fn read_penalty(&self, kind: SolveKind) -> Result<i64, SolverError> {
        Ok(solution::read_penalty(&self.solution_path(kind))?)
    }

    fn read_elapsed_seconds(&mut self) -> Result<f64, SolverError> {
        Ok(solution::take_elapsed_seconds(&self.scratch(TIME_FILE))?)
    }

    fn archive_solution(&self, kind: SolveKind, dest: &Path) -> Result<(), SolverError> {
        let src = self.solution_path(kind);
        fs::copy(&src, dest).map_err(|source| SolverError::Io {
            path: dest.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProcessGraphSource
// ---------------------------------------------------------------------------

/// [`GraphSource`] backed by a generator executable and the solver jar's mutator.
#[derive(Debug, Clone)]
pub struct ProcessGraphSource {
    generator: PathBuf,
    java: PathBuf,
    jar: PathBuf,
}

impl ProcessGraphSource {
    /// Graph source using `generator` to create fresh graphs.
    #[must_use]
    pub fn new(tools: &ToolsConfig, generator: &Path) -> Self {
        Self {
            generator: generator.to_path_buf(),
            java: tools.java.clone(),
            jar: tools.solver_jar.clone(),
        }
    }
}

impl GraphSource for ProcessGraphSource {
    fn generate(&mut self, dest: &Path) -> Result<(), SolverError> {
        remove_stale(dest)?;
        ToolCommand::new(&self.generator)
            .arg(dest)
            .run_expecting(dest)
    }

    fn mutate(&mut self, src: &Path, dst: &Path, count: usize) -> Result<(), SolverError> {
        remove_stale(dst)?;
        ToolCommand::new(&self.java)
            .arg("-cp")
            .arg(&self.jar)
            .arg("DHD.Mutator")
            .arg("-i")
            .arg(src)
            .arg("-o")
            .arg(dst)
            .arg("-n")
            .arg(count.to_string())
            .run_expecting(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn solver_in(dir: &Path) -> ProcessSolver {
        ProcessSolver::new(&ToolsConfig {
            work_dir: dir.to_path_buf(),
            ..ToolsConfig::default()
        })
    }

    #[test]
    fn batch_command_line_matches_solver_flags() {
        let solver = solver_in(Path::new("tmp"));
        let cmd = solver.formulate_command(Path::new("g"), 9, 40);
        assert_eq!(cmd.display(), "java -jar DHD.jar -i g -l 9 -n 40");
    }

    #[test]
    fn incremental_command_line_matches_solver_flags() {
        let solver = solver_in(Path::new("tmp"));
        let previous = LevelAssignment::default();
        let request = IncrementalRequest {
            graph: Path::new("g.mutate.1"),
            previous_graph: Path::new("g"),
            previous: &previous,
            levels: 17,
            neighborhood: 1,
            max_level_change: 3,
        };
        let cmd = solver.formulate_incremental_command(&request, Path::new("tmp/__mstate"));
        assert_eq!(
            cmd.display(),
            "java -cp DHD.jar DHD.PartialSolver -i g.mutate.1 -p tmp/__mstate -d g -k 1 -c 3 -l 17"
        );
    }

    #[test]
    fn spawn_failure_is_reported() {
        let err = ToolCommand::new("/definitely/not/a/program")
            .run()
            .expect_err("spawn should fail");
        assert_eq!(err.code(), crate::ErrorCode::SolverSpawnFailed);
    }

    #[test]
    fn reading_time_consumes_the_scratch_file() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(TIME_FILE), "0.5\n").expect("write");
        let mut solver = solver_in(dir.path());
        let seconds = solver.read_elapsed_seconds().expect("seconds");
        assert!((seconds - 0.5).abs() < f64::EPSILON);
        assert!(solver.read_elapsed_seconds().is_err());
    }

    #[test]
    fn penalty_is_read_per_solve_kind() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(BATCH_SOLUTION_FILE), "h\nobjective value: 4\n")
            .expect("write");
        fs::write(
            dir.path().join(INCREMENTAL_SOLUTION_FILE),
            "h\nobjective value: 9.0000002\n",
        )
        .expect("write");
        let solver = solver_in(dir.path());
        assert_eq!(solver.read_penalty(SolveKind::Batch).expect("batch"), 4);
        assert_eq!(
            solver.read_penalty(SolveKind::Incremental).expect("incremental"),
            9
        );
    }

    #[test]
    fn reset_work_dir_clears_previous_contents() {
        let dir = TempDir::new().expect("tempdir");
        let work = dir.path().join("tmp");
        fs::create_dir_all(work.join("trial1")).expect("mkdir");
        fs::write(work.join(STATE_FILE), "a 1\n").expect("write");

        reset_work_dir(&work).expect("reset");
        assert!(work.is_dir());
        assert_eq!(fs::read_dir(&work).expect("read_dir").count(), 0);
    }
}
