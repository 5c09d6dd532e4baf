use serde::Serialize;

use rankshift_core::Graph;

/// Immediate neighbours of the test edge's endpoints in the unmutated graph.
///
/// Each edge `(a, b)` contributes at most one node, to the first set it
/// matches, testing the tail before the head:
///
/// 1. `a == tail`: `b` joins `from_tail`
/// 2. `b == tail`: `a` joins `to_tail`
/// 3. `a == head`: `b` joins `from_head`
/// 4. `b == head`: `a` joins `to_head`
///
/// So a pre-existing `head -> tail` edge files `head` under `to_tail` and
/// nowhere else. A node reached through several edges appears once per edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NeighborSets {
    /// Nodes the tail points to.
    pub from_tail: Vec<String>,
    /// Nodes that point to the tail.
    pub to_tail: Vec<String>,
    /// Nodes the head points to.
    pub from_head: Vec<String>,
    /// Nodes that point to the head.
    pub to_head: Vec<String>,
}

impl NeighborSets {
    #[must_use]
    pub fn collect(graph: &Graph, head: &str, tail: &str) -> Self {
        let mut sets = Self::default();
        for (a, b) in graph.edges() {
            if a == tail {
                sets.from_tail.push(b.to_string());
            } else if b == tail {
                sets.to_tail.push(a.to_string());
            } else if a == head {
                sets.from_head.push(b.to_string());
            } else if b == head {
                sets.to_head.push(a.to_string());
            }
        }
        sets
    }

    /// Neighbours filed against the head.
    pub fn head_side(&self) -> impl Iterator<Item = &str> + '_ {
        self.from_head
            .iter()
            .chain(&self.to_head)
            .map(String::as_str)
    }

    /// Neighbours filed against the tail.
    pub fn tail_side(&self) -> impl Iterator<Item = &str> + '_ {
        self.from_tail
            .iter()
            .chain(&self.to_tail)
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.from_tail.len() + self.to_tail.len() + self.from_head.len() + self.to_head.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
