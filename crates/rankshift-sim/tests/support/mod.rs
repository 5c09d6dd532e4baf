//! In-memory solver and graph source for driving the experiments without
//! the external tools.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use rankshift_core::{
    Graph, GraphSource, HierarchySolver, IncrementalRequest, LevelAssignment, SolveKind,
    SolverError,
};

type Rank = Box<dyn FnMut(&Graph) -> LevelAssignment>;

/// Ranks graph files with a closure and reports fixed penalties and times.
pub struct ScriptedSolver {
    rank: Rank,
    last: Option<SolveKind>,
    pub batch_penalty: i64,
    pub incremental_penalty: i64,
    pub batch_seconds: f64,
    pub incremental_seconds: f64,
    pub batch_calls: usize,
    pub incremental_calls: usize,
    pub previous_graphs: Vec<String>,
}

impl ScriptedSolver {
    pub fn new(rank: impl FnMut(&Graph) -> LevelAssignment + 'static) -> Self {
        Self {
            rank: Box::new(rank),
            last: None,
            batch_penalty: 0,
            incremental_penalty: 0,
            batch_seconds: 0.0,
            incremental_seconds: 0.0,
            batch_calls: 0,
            incremental_calls: 0,
            previous_graphs: Vec::new(),
        }
    }
}

impl HierarchySolver for ScriptedSolver {
    fn compute_levels(
        &mut self,
        graph: &Path,
        _levels: u32,
        _node_count: usize,
    ) -> Result<LevelAssignment, SolverError> {
        self.batch_calls += 1;
        self.last = Some(SolveKind::Batch);
        let graph = Graph::load(graph)?;
        Ok((self.rank)(&graph))
    }

    fn compute_levels_incremental(
        &mut self,
        request: &IncrementalRequest<'_>,
    ) -> Result<LevelAssignment, SolverError> {
        self.incremental_calls += 1;
        self.last = Some(SolveKind::Incremental);
        self.previous_graphs
            .push(request.previous_graph.display().to_string());
        let graph = Graph::load(request.graph)?;
        Ok((self.rank)(&graph))
    }

    fn read_penalty(&self, kind: SolveKind) -> Result<i64, SolverError> {
        Ok(match kind {
            SolveKind::Batch => self.batch_penalty,
            SolveKind::Incremental => self.incremental_penalty,
        })
    }

    fn read_elapsed_seconds(&mut self) -> Result<f64, SolverError> {
        Ok(match self.last.take() {
            Some(SolveKind::Batch) => self.batch_seconds,
            Some(SolveKind::Incremental) => self.incremental_seconds,
            None => 0.0,
        })
    }

    fn archive_solution(&self, kind: SolveKind, dest: &Path) -> Result<(), SolverError> {
        fs::write(dest, format!("{kind:?}\n")).map_err(|source| SolverError::Io {
            path: dest.display().to_string(),
            source,
        })
    }
}

/// Writes the same graph on every `generate`; `mutate` copies the file and
/// appends one `m<k> m<k+1>` edge per change.
pub struct FixedGraphSource {
    text: String,
    pub generated: usize,
    pub mutations: Vec<(String, String, usize)>,
}

impl FixedGraphSource {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            generated: 0,
            mutations: Vec::new(),
        }
    }
}

impl GraphSource for FixedGraphSource {
    fn generate(&mut self, dest: &Path) -> Result<(), SolverError> {
        self.generated += 1;
        fs::write(dest, &self.text).map_err(|source| SolverError::Io {
            path: dest.display().to_string(),
            source,
        })
    }

    fn mutate(&mut self, src: &Path, dst: &Path, count: usize) -> Result<(), SolverError> {
        let io = |path: &Path, source| SolverError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut text = fs::read_to_string(src).map_err(|e| io(src, e))?;
        for k in 0..count {
            text.push_str(&format!("m{k} m{}\n", k + 1));
        }
        fs::write(dst, text).map_err(|e| io(dst, e))?;
        self.mutations.push((
            src.display().to_string(),
            dst.display().to_string(),
            count,
        ));
        Ok(())
    }
}

/// Assignment from inline `node level` text.
pub fn levels(text: &str) -> LevelAssignment {
    LevelAssignment::parse(text).expect("levels")
}

/// Level = node number modulo 3 for nodes named `n<k>`; the tail of the last
/// edge moves up one level when the graph has more than `base_edges` edges.
pub fn modulo_rank(base_edges: usize) -> impl FnMut(&Graph) -> LevelAssignment {
    move |graph: &Graph| {
        let mut out = LevelAssignment::default();
        for node in graph.nodes() {
            let k: u32 = node.trim_start_matches(|c: char| !c.is_ascii_digit())
                .parse()
                .unwrap_or(0);
            out.insert(node, k % 3);
        }
        if graph.edge_count() > base_edges {
            if let Some((_, tail)) = graph.edges().last() {
                let level = out.get(tail).unwrap_or(0);
                out.insert(tail, level + 1);
            }
        }
        out
    }
}

/// A ten-node chain `n0 -> n1 -> ... -> n9`.
pub fn chain_graph() -> String {
    (0..9).map(|k| format!("n{k} n{}\n", k + 1)).collect()
}
