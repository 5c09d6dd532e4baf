//! Edge-list graph store.
//!
//! # File format
//!
//! One edge per line, whitespace separated. The first token is the head
//! (source) node, the second the tail (destination) node; any further tokens
//! are ignored. Blank lines are skipped. Duplicate edges are kept, so a graph
//! is an ordered multiset of edges plus the set of their endpoints.
//!
//! A loaded [`Graph`] is never mutated in place. A perturbed copy is produced
//! on disk with [`Graph::append_edge`], which leaves the source file untouched
//! and writes a new file with exactly one extra trailing edge line.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// A directed edge `head -> tail`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node.
    pub head: String,
    /// Destination node.
    pub tail: String,
}

impl Edge {
    #[must_use]
    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
        }
    }
}

/// Node and edge totals of a graph file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub edges: usize,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from reading or writing graph files.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The graph file is absent or could not be read/written.
    #[error("failed to access graph file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A non-blank line has fewer than two tokens.
    #[error("{path}:{line}: expected `head tail`, found {content:?}")]
    MalformedLine {
        path: String,
        line: usize,
        content: String,
    },
}

impl GraphError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::FileMissing,
            Self::MalformedLine { .. } => ErrorCode::MalformedGraphLine,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A directed multigraph read from an edge-list file.
///
/// Edges keep their file order: petgraph assigns edge indices in insertion
/// order and every scan below walks `edge_references()` in that order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl Graph {
    /// Load a graph from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Io`] if the file cannot be read and
    /// [`GraphError::MalformedLine`] for a line with fewer than two tokens.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let text = fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
        Self::parse_from(&text, &path.display().to_string())
    }

    /// Parse a graph from edge-list text.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MalformedLine`] for a line with fewer than two tokens.
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        Self::parse_from(text, "<inline>")
    }

    fn parse_from(text: &str, origin: &str) -> Result<Self, GraphError> {
        let mut graph = Self::default();
        for (idx, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(head) = tokens.next() else {
                continue;
            };
            let Some(tail) = tokens.next() else {
                return Err(GraphError::MalformedLine {
                    path: origin.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            graph.push_edge(head, tail);
        }
        Ok(graph)
    }

    fn push_edge(&mut self, head: &str, tail: &str) {
        let h = self.intern(head);
        let t = self.intern(tail);
        self.graph.add_edge(h, t, ());
    }

    fn intern(&mut self, node: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(node) {
            return idx;
        }
        let idx = self.graph.add_node(node.to_string());
        self.node_map.insert(node.to_string(), idx);
        idx
    }

    /// Number of distinct nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges, duplicates included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn counts(&self) -> GraphCounts {
        GraphCounts {
            nodes: self.node_count(),
            edges: self.edge_count(),
        }
    }

    /// All nodes, sorted.
    #[must_use]
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.node_map.keys().map(String::as_str).collect()
    }

    /// Edges as `(head, tail)` pairs in file order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
            )
        })
    }

    /// Outbound and inbound neighbours of `node`, in edge order.
    ///
    /// Parallel edges repeat the neighbour; a self-loop lists the node on
    /// both sides. Unknown nodes have no neighbours.
    #[must_use]
    pub fn neighbors(&self, node: &str) -> (Vec<&str>, Vec<&str>) {
        let mut outbound = Vec::new();
        let mut inbound = Vec::new();
        for (head, tail) in self.edges() {
            if head == node {
                outbound.push(tail);
            }
            if tail == node {
                inbound.push(head);
            }
        }
        (outbound, inbound)
    }

    /// Copy the graph file at `src` to `dst` with one extra `head tail` line.
    ///
    /// The source file is not modified. No deduplication happens: appending
    /// an edge that already exists yields a parallel edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Io`] if `src` cannot be read or `dst` written.
    pub fn append_edge(src: &Path, dst: &Path, head: &str, tail: &str) -> Result<(), GraphError> {
        let mut content = fs::read_to_string(src).map_err(|e| GraphError::io(src, e))?;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(head);
        content.push(' ');
        content.push_str(tail);
        content.push('\n');
        fs::write(dst, content).map_err(|e| GraphError::io(dst, e))
    }
}

/// Node and edge totals of the graph file at `path`.
///
/// # Errors
///
/// Same as [`Graph::load`].
pub fn count_file(path: &Path) -> Result<GraphCounts, GraphError> {
    Graph::load(path).map(|graph| graph.counts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_keeps_duplicates_and_ignores_extra_tokens() {
        let graph = Graph::parse("a b\nb c 7\n\na b\n").expect("parse");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![("a", "b"), ("b", "c"), ("a", "b")]);
    }

    #[test]
    fn parse_rejects_single_token_line() {
        let err = Graph::parse("a b\nlonely\n").expect_err("should fail");
        match &err {
            GraphError::MalformedLine { line, content, .. } => {
                assert_eq!(*line, 2);
                assert_eq!(content, "lonely");
            }
            GraphError::Io { .. } => panic!("unexpected io error"),
        }
        assert_eq!(err.code(), ErrorCode::MalformedGraphLine);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = Graph::load(&dir.path().join("nope")).expect_err("should fail");
        assert_eq!(err.code(), ErrorCode::FileMissing);
    }

    #[test]
    fn neighbors_scan_in_edge_order() {
        let graph = Graph::parse("a b\nc b\nb d\nb b\n").expect("parse");
        let (out, inb) = graph.neighbors("b");
        assert_eq!(out, vec!["d", "b"]);
        assert_eq!(inb, vec!["a", "c", "b"]);
        let (out, inb) = graph.neighbors("zz");
        assert!(out.is_empty() && inb.is_empty());
    }

    #[test]
    fn nodes_are_sorted_union_of_endpoints() {
        let graph = Graph::parse("z a\nm z\n").expect("parse");
        let nodes: Vec<_> = graph.nodes().into_iter().collect();
        assert_eq!(nodes, vec!["a", "m", "z"]);
    }

    #[test]
    fn append_edge_writes_new_file_and_keeps_source() {
        let dir = TempDir::new().expect("tempdir");
        let src = dir.path().join("g");
        let dst = dir.path().join("g2");
        fs::write(&src, "a b\nb c\n").expect("write");

        Graph::append_edge(&src, &dst, "a", "b").expect("append");

        assert_eq!(fs::read_to_string(&src).expect("read"), "a b\nb c\n");
        assert_eq!(fs::read_to_string(&dst).expect("read"), "a b\nb c\na b\n");
        let mutated = Graph::load(&dst).expect("load");
        assert_eq!(mutated.edge_count(), 3);
        assert_eq!(mutated.node_count(), 3);
    }

    #[test]
    fn append_edge_terminates_unterminated_source() {
        let dir = TempDir::new().expect("tempdir");
        let src = dir.path().join("g");
        let dst = dir.path().join("g2");
        fs::write(&src, "a b").expect("write");

        Graph::append_edge(&src, &dst, "b", "c").expect("append");
        assert_eq!(fs::read_to_string(&dst).expect("read"), "a b\nb c\n");
    }

    #[test]
    fn count_file_counts_duplicate_edges() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("g");
        fs::write(&path, "a b\na b\n\nb c\n").expect("write");
        assert_eq!(
            count_file(&path).expect("count"),
            GraphCounts { nodes: 3, edges: 3 }
        );
    }
}
