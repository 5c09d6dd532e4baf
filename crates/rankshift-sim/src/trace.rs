//! Human-readable per-iteration trace of the perturbation experiment.
//!
//! ```text
//! Adding edge <head> - <tail>
//! <unmutated graph file, verbatim>
//! ----
//! <node> <old level> <new level>
//! ...
//! ===
//! ```
//!
//! The two level columns follow the iteration's mode: `(orig, mutated)` for
//! additions, `(mutated, orig)` for deletions. A node missing from an
//! assignment is written as `-`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use rankshift_core::{Graph, LevelAssignment};

use crate::scenario::Mode;

/// Separator between the graph and the level listing.
pub const GRAPH_SEPARATOR: &str = "----";
/// Separator closing an iteration.
pub const ITERATION_SEPARATOR: &str = "===";

/// One iteration's worth of trace data.
#[derive(Debug, Clone, Copy)]
pub struct TraceEntry<'a> {
    pub head: &'a str,
    pub tail: &'a str,
    pub mode: Mode,
    /// Raw text of the unmutated graph file.
    pub graph_text: &'a str,
    pub graph: &'a Graph,
    pub orig: &'a LevelAssignment,
    pub mutated: &'a LevelAssignment,
}

/// Append-only trace writer.
#[derive(Debug)]
pub struct TraceLog<W: Write> {
    out: W,
}

impl TraceLog<BufWriter<File>> {
    /// Create (truncating) the trace file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create trace log {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TraceLog<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Append one iteration and flush, so a crash keeps every finished entry.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn record(&mut self, entry: &TraceEntry<'_>) -> io::Result<()> {
        writeln!(self.out, "Adding edge {} - {}", entry.head, entry.tail)?;
        self.out.write_all(entry.graph_text.as_bytes())?;
        if !entry.graph_text.is_empty() && !entry.graph_text.ends_with('\n') {
            writeln!(self.out)?;
        }
        writeln!(self.out, "{GRAPH_SEPARATOR}")?;

        let (first, second) = match entry.mode {
            Mode::Addition => (entry.orig, entry.mutated),
            Mode::Deletion => (entry.mutated, entry.orig),
        };
        for node in entry.graph.nodes() {
            writeln!(
                self.out,
                "{node} {} {}",
                level_or_dash(first, node),
                level_or_dash(second, node)
            )?;
        }
        writeln!(self.out, "{ITERATION_SEPARATOR}")?;
        self.out.flush()
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn level_or_dash(levels: &LevelAssignment, node: &str) -> String {
    levels
        .get(node)
        .map_or_else(|| "-".to_string(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(mode: Mode) -> String {
        let text = "A B\nB C\n";
        let graph = Graph::parse(text).expect("graph");
        let orig = LevelAssignment::parse("A 0\nB 1\nC 1\n").expect("orig");
        let mutated = LevelAssignment::parse("A 0\nB 1\n").expect("mutated");
        let mut log = TraceLog::new(Vec::new());
        log.record(&TraceEntry {
            head: "B",
            tail: "C",
            mode,
            graph_text: text,
            graph: &graph,
            orig: &orig,
            mutated: &mutated,
        })
        .expect("record");
        String::from_utf8(log.into_inner()).expect("utf8")
    }

    #[test]
    fn addition_lists_orig_then_mutated() {
        assert_eq!(
            render(Mode::Addition),
            "Adding edge B - C\nA B\nB C\n----\nA 0 0\nB 1 1\nC 1 -\n===\n"
        );
    }

    #[test]
    fn deletion_lists_mutated_then_orig() {
        assert_eq!(
            render(Mode::Deletion),
            "Adding edge B - C\nA B\nB C\n----\nA 0 0\nB 1 1\nC - 1\n===\n"
        );
    }
}
