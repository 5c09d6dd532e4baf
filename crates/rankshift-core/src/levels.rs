//! Level assignments produced by the external hierarchy solver.
//!
//! The solver persists its result as one `<node> <level>` line per node.
//! Levels are integral but may be written with decimal formatting (for
//! example `3.0` or `2.9999999` when the MIP solver returns a relaxed value),
//! so the level token is parsed as a float and rounded to the nearest
//! integer.
//!
//! A node the solver did not assign is an explicit [`LevelError::MissingNode`]
//! on lookup. Comparisons between levels never fall back to a default.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::ErrorCode;

/// Integer rank assigned to a node. Numbering is solver-defined.
pub type Level = u32;

/// Errors from reading level assignment files.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// The state file is absent or could not be read/written.
    #[error("failed to access level file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A non-blank line is not `node level` with a non-negative integral level.
    #[error("{path}:{line}: expected `node level`, found {content:?}")]
    MalformedLine {
        path: String,
        line: usize,
        content: String,
    },

    /// A node has no entry in the assignment.
    #[error("node {node:?} has no level assignment")]
    MissingNode { node: String },
}

impl LevelError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::FileMissing,
            Self::MalformedLine { .. } => ErrorCode::MalformedLevelLine,
            Self::MissingNode { .. } => ErrorCode::MissingLevel,
        }
    }
}

// ---------------------------------------------------------------------------
// LevelAssignment
// ---------------------------------------------------------------------------

/// Mapping from node to level, remembering the order nodes first appeared.
///
/// If a node is listed twice the later level wins, but the node keeps its
/// first position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelAssignment {
    order: Vec<String>,
    levels: HashMap<String, Level>,
}

impl LevelAssignment {
    /// Load an assignment from a solver state file.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Io`] if the file is missing and
    /// [`LevelError::MalformedLine`] for an unparseable line.
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_from(&text, &path.display().to_string())
    }

    /// Parse an assignment from state-file text.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::MalformedLine`] for an unparseable line.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        Self::parse_from(text, "<inline>")
    }

    fn parse_from(text: &str, origin: &str) -> Result<Self, LevelError> {
        let mut assignment = Self::default();
        for (idx, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(node) = tokens.next() else {
                continue;
            };
            let level = tokens
                .next()
                .and_then(parse_level)
                .ok_or_else(|| LevelError::MalformedLine {
                    path: origin.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                })?;
            assignment.insert(node, level);
        }
        Ok(assignment)
    }

    /// Set the level of `node`, keeping its first-seen position.
    pub fn insert(&mut self, node: &str, level: Level) {
        if self.levels.insert(node.to_string(), level).is_none() {
            self.order.push(node.to_string());
        }
    }

    #[must_use]
    pub fn get(&self, node: &str) -> Option<Level> {
        self.levels.get(node).copied()
    }

    /// Level of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::MissingNode`] if the node was not assigned.
    pub fn level(&self, node: &str) -> Result<Level, LevelError> {
        self.get(node).ok_or_else(|| LevelError::MissingNode {
            node: node.to_string(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(node, level)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Level)> + '_ {
        self.order
            .iter()
            .filter_map(|node| self.levels.get(node).map(|&level| (node.as_str(), level)))
    }

    /// Serialise as `node level` lines, the format the solver reads back.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Io`] if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), LevelError> {
        let mut out = String::new();
        for (node, level) in self.iter() {
            let _ = writeln!(out, "{node} {level}");
        }
        fs::write(path, out).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Build the reverse `level -> nodes` index.
    #[must_use]
    pub fn index(&self) -> LevelIndex {
        let mut by_level: BTreeMap<Level, Vec<String>> = BTreeMap::new();
        for (node, level) in self.iter() {
            by_level.entry(level).or_default().push(node.to_string());
        }
        LevelIndex { by_level }
    }
}

fn parse_level(token: &str) -> Option<Level> {
    let value: f64 = token.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < 0.0 || rounded > f64::from(Level::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(rounded as Level)
}

// ---------------------------------------------------------------------------
// LevelIndex
// ---------------------------------------------------------------------------

/// Reverse index from level to the nodes at that level, in assignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelIndex {
    by_level: BTreeMap<Level, Vec<String>>,
}

impl LevelIndex {
    /// Nodes at `level`; empty for a level with no members.
    #[must_use]
    pub fn nodes_at(&self, level: Level) -> &[String] {
        self.by_level.get(&level).map_or(&[], Vec::as_slice)
    }

    /// Levels below `limit` that hold at least one node, ascending.
    #[must_use]
    pub fn non_empty_levels(&self, limit: Level) -> Vec<Level> {
        self.by_level
            .range(..limit)
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(&level, _)| level)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_rounds_decimal_levels() {
        let levels = LevelAssignment::parse("a 0\nb 2.0\nc 2.9999999\n").expect("parse");
        assert_eq!(levels.level("a").expect("a"), 0);
        assert_eq!(levels.level("b").expect("b"), 2);
        assert_eq!(levels.level("c").expect("c"), 3);
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn parse_rejects_missing_or_negative_level() {
        for bad in ["a\n", "a x\n", "a -1\n", "a NaN\n"] {
            let err = LevelAssignment::parse(bad).expect_err(bad);
            assert_eq!(err.code(), ErrorCode::MalformedLevelLine, "{bad}");
        }
    }

    #[test]
    fn missing_node_is_an_error_not_a_default() {
        let levels = LevelAssignment::parse("a 1\n").expect("parse");
        let err = levels.level("ghost").expect_err("missing");
        assert_eq!(err.code(), ErrorCode::MissingLevel);
        assert!(levels.get("ghost").is_none());
    }

    #[test]
    fn reparsing_a_file_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("__state");
        fs::write(&path, "n1 4\nn2 0\nn3 4\n").expect("write");
        let first = LevelAssignment::load(&path).expect("first");
        let second = LevelAssignment::load(&path).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn write_then_load_preserves_order_and_levels() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("__mstate");
        let levels = LevelAssignment::parse("z 1\ny 0\n").expect("parse");
        levels.write(&path).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "z 1\ny 0\n");
    }

    #[test]
    fn duplicate_node_keeps_first_position_and_last_level() {
        let levels = LevelAssignment::parse("a 1\nb 2\na 3\n").expect("parse");
        let pairs: Vec<_> = levels.iter().collect();
        assert_eq!(pairs, vec![("a", 3), ("b", 2)]);
    }

    #[test]
    fn index_groups_nodes_in_file_order() {
        let levels = LevelAssignment::parse("a 1\nb 0\nc 1\nd 5\n").expect("parse");
        let index = levels.index();
        assert_eq!(index.nodes_at(1), ["a".to_string(), "c".to_string()]);
        assert_eq!(index.nodes_at(0), ["b".to_string()]);
        assert!(index.nodes_at(3).is_empty());
        assert_eq!(index.non_empty_levels(5), vec![0, 1]);
        assert_eq!(index.non_empty_levels(9), vec![0, 1, 5]);
    }
}
