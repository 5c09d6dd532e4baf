//! Movement classification and the four accumulation tables.
//!
//! # Tables
//!
//! - `head` / `tail`: one row per `(scenario, mode)` pair (see
//!   [`crate::scenario::row_for`]), one column per [`Movement`] of the
//!   endpoint.
//! - `edge_head` / `edge_tail`: row `3 * position + endpoint_movement`, where
//!   `position` is the neighbour's [`RelativePosition`] to the endpoint before
//!   the change; column is the neighbour's own [`Movement`].
//!
//! Counters only ever increase, one per observation, for the whole run.

use serde::Serialize;

use rankshift_core::Level;

/// Number of `(scenario, mode)` rows.
pub const ENDPOINT_ROWS: usize = 6;
/// Number of `(position, endpoint movement)` rows.
pub const NEIGHBOR_ROWS: usize = 9;

/// How a node's level changed between the "old" and "new" assignments.
///
/// This is the raw numeric comparison: `Down` means the level number
/// decreased. Whether that is "better" is the solver's convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Movement {
    Up = 0,
    Down = 1,
    Same = 2,
}

impl Movement {
    pub const ALL: [Self; 3] = [Self::Up, Self::Down, Self::Same];

    #[must_use]
    pub fn classify(old: Level, new: Level) -> Self {
        if old == new {
            Self::Same
        } else if old > new {
            Self::Down
        } else {
            Self::Up
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A neighbour's pre-change level relative to the endpoint's pre-change level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelativePosition {
    Equal = 0,
    Greater = 1,
    Lesser = 2,
}

impl RelativePosition {
    pub const ALL: [Self; 3] = [Self::Equal, Self::Greater, Self::Lesser];

    #[must_use]
    pub fn classify(neighbor: Level, anchor: Level) -> Self {
        if neighbor == anchor {
            Self::Equal
        } else if neighbor > anchor {
            Self::Greater
        } else {
            Self::Lesser
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Which endpoint a neighbour observation is filed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Head,
    Tail,
}

/// Row of a neighbour table.
#[must_use]
pub const fn neighbor_row(position: RelativePosition, endpoint: Movement) -> usize {
    3 * position.index() + endpoint.index()
}

/// Run-wide movement counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MovementStats {
    pub head: [[u64; 3]; ENDPOINT_ROWS],
    pub tail: [[u64; 3]; ENDPOINT_ROWS],
    pub edge_head: [[u64; 3]; NEIGHBOR_ROWS],
    pub edge_tail: [[u64; 3]; NEIGHBOR_ROWS],
}

impl MovementStats {
    /// Count one head and one tail movement under `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= ENDPOINT_ROWS`.
    pub fn record_endpoints(&mut self, row: usize, head: Movement, tail: Movement) {
        self.head[row][head.index()] += 1;
        self.tail[row][tail.index()] += 1;
    }

    /// Count one neighbour movement on `side`.
    pub fn record_neighbor(
        &mut self,
        side: Side,
        position: RelativePosition,
        endpoint: Movement,
        neighbor: Movement,
    ) {
        let table = match side {
            Side::Head => &mut self.edge_head,
            Side::Tail => &mut self.edge_tail,
        };
        table[neighbor_row(position, endpoint)][neighbor.index()] += 1;
    }

    /// Observations recorded for the head under `row`.
    #[must_use]
    pub fn head_row_total(&self, row: usize) -> u64 {
        self.head[row].iter().sum()
    }

    /// Observations recorded for the tail under `row`.
    #[must_use]
    pub fn tail_row_total(&self, row: usize) -> u64 {
        self.tail[row].iter().sum()
    }
}
