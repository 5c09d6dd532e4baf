//! Single-edge perturbation experiment.
//!
//! Each iteration generates a fresh random graph, ranks it, inserts one edge
//! chosen by the current [`Scenario`], ranks the mutated copy, and counts how
//! the edge's endpoints and their immediate neighbours moved between levels.
//! The `(scenario, mode)` pair advances through the fixed [`Schedule`] after
//! every iteration; there is no early exit.

use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use rankshift_core::config::PerturbConfig;
use rankshift_core::{Graph, GraphSource, HierarchySolver, LevelAssignment};

use crate::neighbors::NeighborSets;
use crate::report::PerturbationReport;
use crate::scenario::{Mode, Scenario, Schedule, select_pair};
use crate::stats::{Movement, MovementStats, RelativePosition, Side};
use crate::trace::{TraceEntry, TraceLog};

/// RNG for an experiment: seeded when `seed` is set, from the OS otherwise.
#[must_use]
pub fn experiment_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// Outcome of one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationRecord {
    pub iteration: u64,
    pub scenario: Scenario,
    pub mode: Mode,
    pub row: usize,
    pub head: String,
    pub tail: String,
    pub head_movement: Movement,
    pub tail_movement: Movement,
    /// Neighbour observations counted this iteration.
    pub neighbors_observed: usize,
}

/// A neighbour observation waiting to be counted.
#[derive(Debug, Clone, Copy)]
struct NeighborObservation {
    side: Side,
    position: RelativePosition,
    endpoint: Movement,
    neighbor: Movement,
}

/// Driver for the perturbation experiment.
#[derive(Debug)]
pub struct PerturbationExperiment<S, G, R> {
    config: PerturbConfig,
    solver: S,
    source: G,
    rng: R,
    schedule: Schedule,
    stats: MovementStats,
    iterations_run: u64,
}

impl<S, G, R> PerturbationExperiment<S, G, R>
where
    S: HierarchySolver,
    G: GraphSource,
    R: Rng,
{
    pub fn new(config: PerturbConfig, solver: S, source: G, rng: R) -> Self {
        Self {
            config,
            solver,
            source,
            rng,
            schedule: Schedule::default(),
            stats: MovementStats::default(),
            iterations_run: 0,
        }
    }

    #[must_use]
    pub const fn schedule(&self) -> Schedule {
        self.schedule
    }

    #[must_use]
    pub const fn stats(&self) -> &MovementStats {
        &self.stats
    }

    /// Run all configured iterations and return the aggregated report.
    ///
    /// # Errors
    ///
    /// Any solver, file or selection failure aborts the run; statistics
    /// gathered so far are discarded with it.
    pub fn run<W: Write>(&mut self, trace: &mut TraceLog<W>) -> Result<PerturbationReport> {
        for _ in 0..self.config.iterations {
            self.step(trace)?;
        }
        Ok(self.report())
    }

    /// Snapshot of the statistics gathered so far.
    #[must_use]
    pub fn report(&self) -> PerturbationReport {
        PerturbationReport {
            iterations: self.iterations_run,
            levels: self.config.levels,
            stats: self.stats.clone(),
        }
    }

    /// Run one iteration.
    ///
    /// # Errors
    ///
    /// Fails if a tool fails, a file is missing or malformed, no edge fits
    /// the current scenario, or a node involved has no level.
    pub fn step<W: Write>(&mut self, trace: &mut TraceLog<W>) -> Result<IterationRecord> {
        let iteration = self.iterations_run;
        let scenario = self.schedule.scenario();
        let mode = self.schedule.mode();
        let row = self.schedule.row();
        let levels = self.config.levels;
        info!(iteration, ?scenario, ?mode, "starting iteration");

        let graph_path = self.config.graph.clone();
        let mutated_path = self.config.mutated_graph.clone();

        self.source
            .generate(&graph_path)
            .context("Failed to generate random graph")?;
        let graph_text = fs::read_to_string(&graph_path)
            .with_context(|| format!("Failed to read {}", graph_path.display()))?;
        let graph = Graph::parse(&graph_text)
            .with_context(|| format!("Failed to parse {}", graph_path.display()))?;
        let counts = graph.counts();
        debug!(nodes = counts.nodes, edges = counts.edges, "generated graph");

        let orig = self
            .solver
            .compute_levels(&graph_path, levels, counts.nodes)
            .context("Failed to rank the original graph")?;

        let pick = select_pair(scenario, &orig.index(), levels, &mut self.rng)
            .with_context(|| format!("Failed to select an edge for {scenario:?}"))?;
        debug!(
            head = %pick.head,
            tail = %pick.tail,
            head_level = pick.head_level,
            tail_level = pick.tail_level,
            "selected edge"
        );

        let neighbors = NeighborSets::collect(&graph, &pick.head, &pick.tail);

        Graph::append_edge(&graph_path, &mutated_path, &pick.head, &pick.tail)?;
        let mutated = self
            .solver
            .compute_levels(&mutated_path, levels, counts.nodes)
            .context("Failed to rank the mutated graph")?;

        let (old, new) = match mode {
            Mode::Addition => (&orig, &mutated),
            Mode::Deletion => (&mutated, &orig),
        };

        let head_movement = movement_of(old, new, &pick.head)?;
        let tail_movement = movement_of(old, new, &pick.tail)?;
        let observations = observe_neighbors(
            old,
            new,
            &neighbors,
            (&pick.head, head_movement),
            (&pick.tail, tail_movement),
        )?;

        self.stats
            .record_endpoints(row, head_movement, tail_movement);
        for obs in &observations {
            self.stats
                .record_neighbor(obs.side, obs.position, obs.endpoint, obs.neighbor);
        }

        trace
            .record(&TraceEntry {
                head: &pick.head,
                tail: &pick.tail,
                mode,
                graph_text: &graph_text,
                graph: &graph,
                orig: &orig,
                mutated: &mutated,
            })
            .context("Failed to write trace log")?;

        self.schedule.advance();
        self.iterations_run += 1;

        Ok(IterationRecord {
            iteration,
            scenario,
            mode,
            row,
            head: pick.head,
            tail: pick.tail,
            head_movement,
            tail_movement,
            neighbors_observed: observations.len(),
        })
    }
}

fn movement_of(old: &LevelAssignment, new: &LevelAssignment, node: &str) -> Result<Movement> {
    Ok(Movement::classify(old.level(node)?, new.level(node)?))
}

/// Classify every neighbour before anything is counted, so a missing level
/// leaves the tables untouched.
fn observe_neighbors(
    old: &LevelAssignment,
    new: &LevelAssignment,
    neighbors: &NeighborSets,
    head: (&str, Movement),
    tail: (&str, Movement),
) -> Result<Vec<NeighborObservation>> {
    let mut observations = Vec::with_capacity(neighbors.len());
    let sides = [
        (Side::Head, head, neighbors.head_side().collect::<Vec<_>>()),
        (Side::Tail, tail, neighbors.tail_side().collect::<Vec<_>>()),
    ];
    for (side, (endpoint, endpoint_movement), members) in sides {
        let anchor = old.level(endpoint)?;
        for node in members {
            let before = old.level(node)?;
            observations.push(NeighborObservation {
                side,
                position: RelativePosition::classify(before, anchor),
                endpoint: endpoint_movement,
                neighbor: Movement::classify(before, new.level(node)?),
            });
        }
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rngs_agree() {
        let mut a = experiment_rng(Some(5));
        let mut b = experiment_rng(Some(5));
        let xs: Vec<u32> = (0..8).map(|_| a.gen_range(0..1000)).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen_range(0..1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn neighbour_observations_follow_the_endpoint_sides() {
        let graph = Graph::parse("A B\nB C\nC D\n").expect("graph");
        let neighbors = NeighborSets::collect(&graph, "B", "C");
        let old = LevelAssignment::parse("A 0\nB 1\nC 1\nD 2\n").expect("old");
        let new = LevelAssignment::parse("A 1\nB 1\nC 0\nD 2\n").expect("new");

        let observations = observe_neighbors(
            &old,
            &new,
            &neighbors,
            ("B", Movement::Same),
            ("C", Movement::Down),
        )
        .expect("observe");

        // Head side: A -> B (to_head). Tail side: C -> D (from_tail), B -> C (to_tail).
        assert_eq!(observations.len(), 3);
        let head: Vec<_> = observations
            .iter()
            .filter(|o| o.side == Side::Head)
            .collect();
        assert_eq!(head.len(), 1);
        assert_eq!(head[0].position, RelativePosition::Lesser);
        assert_eq!(head[0].neighbor, Movement::Up);

        let tail: Vec<_> = observations
            .iter()
            .filter(|o| o.side == Side::Tail)
            .map(|o| (o.position, o.endpoint, o.neighbor))
            .collect();
        assert_eq!(
            tail,
            vec![
                (RelativePosition::Greater, Movement::Down, Movement::Same),
                (RelativePosition::Equal, Movement::Down, Movement::Same),
            ]
        );
    }

    #[test]
    fn missing_neighbour_level_is_an_error() {
        let graph = Graph::parse("X B\n").expect("graph");
        let neighbors = NeighborSets::collect(&graph, "B", "C");
        let old = LevelAssignment::parse("B 1\nC 1\n").expect("old");
        let new = old.clone();
        let err = observe_neighbors(
            &old,
            &new,
            &neighbors,
            ("B", Movement::Same),
            ("C", Movement::Same),
        )
        .expect_err("X has no level");
        assert!(err.to_string().contains("\"X\""), "{err}");
    }
}
