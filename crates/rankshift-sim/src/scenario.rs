//! Perturbation scenarios and the fixed schedule that cycles through them.
//!
//! Three structural scenarios decide where the test edge goes, relative to
//! the levels of the unmutated graph:
//!
//! | index | scenario | edge |
//! |---|---|---|
//! | 0 | [`Scenario::SameLevel`] | between two distinct nodes of one level |
//! | 1 | [`Scenario::HigherToLower`] | from a higher-numbered level to a lower one |
//! | 2 | [`Scenario::LowerToHigher`] | from a lower-numbered level to a higher one |
//!
//! Each full cycle of the three scenarios runs in one [`Mode`]; the mode
//! flips whenever the scenario wraps back to 0. Deletion is not an edge
//! removal: it is the same add-then-compare run read in reverse, with the
//! mutated graph's levels treated as the "before" state.

use rand::Rng;
use serde::Serialize;

use rankshift_core::{ErrorCode, Level, LevelIndex};

/// Where the test edge is inserted relative to the current levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scenario {
    SameLevel,
    HigherToLower,
    LowerToHigher,
}

impl Scenario {
    pub const ALL: [Self; 3] = [Self::SameLevel, Self::HigherToLower, Self::LowerToHigher];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::SameLevel => 0,
            Self::HigherToLower => 1,
            Self::LowerToHigher => 2,
        }
    }

    /// Comparison symbol used in the report legend (`=`, `>`, `<`).
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::SameLevel => "=",
            Self::HigherToLower => ">",
            Self::LowerToHigher => "<",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::SameLevel => Self::HigherToLower,
            Self::HigherToLower => Self::LowerToHigher,
            Self::LowerToHigher => Self::SameLevel,
        }
    }
}

/// Whether an iteration is read as an edge addition or an edge deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    Addition,
    Deletion,
}

impl Mode {
    pub const ALL: [Self; 2] = [Self::Addition, Self::Deletion];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Addition => "Add",
            Self::Deletion => "Del",
        }
    }

    const fn flip(self) -> Self {
        match self {
            Self::Addition => Self::Deletion,
            Self::Deletion => Self::Addition,
        }
    }
}

/// Deterministic `(scenario, mode)` state machine with period 6.
///
/// Sequence: `(0,add) (1,add) (2,add) (0,del) (1,del) (2,del) (0,add) ...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    scenario: Scenario,
    mode: Mode,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            scenario: Scenario::SameLevel,
            mode: Mode::Addition,
        }
    }
}

impl Schedule {
    #[must_use]
    pub const fn scenario(&self) -> Scenario {
        self.scenario
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Statistics row for the current state: the scenario index, plus 3 in
    /// deletion mode.
    #[must_use]
    pub const fn row(&self) -> usize {
        row_for(self.scenario, self.mode)
    }

    /// Move to the next scenario, flipping the mode when it wraps to 0.
    pub fn advance(&mut self) {
        self.scenario = self.scenario.next();
        if self.scenario == Scenario::SameLevel {
            self.mode = self.mode.flip();
        }
    }
}

/// Statistics row of a `(scenario, mode)` pair.
#[must_use]
pub const fn row_for(scenario: Scenario, mode: Mode) -> usize {
    match mode {
        Mode::Addition => scenario.index(),
        Mode::Deletion => scenario.index() + 3,
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// No edge fits the requested scenario in the current level assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no level below {levels} holds two or more nodes")]
    NoCrowdedLevel { levels: Level },

    #[error("need two non-empty levels below {levels}, found {non_empty}")]
    TooFewLevels { levels: Level, non_empty: usize },
}

impl SelectionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::SelectionImpossible
    }
}

/// The endpoints chosen for the test edge, with their pre-mutation levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgePick {
    pub head: String,
    pub tail: String,
    pub head_level: Level,
    pub tail_level: Level,
}

/// Choose `(head, tail)` for `scenario` from the levels in `index`.
///
/// Only levels `0..levels` are considered.
///
/// # Errors
///
/// [`SelectionError::NoCrowdedLevel`] if no level has two nodes (same-level
/// scenario); [`SelectionError::TooFewLevels`] if fewer than two levels are
/// populated (cross-level scenarios).
pub fn select_pair<R: Rng + ?Sized>(
    scenario: Scenario,
    index: &LevelIndex,
    levels: Level,
    rng: &mut R,
) -> Result<EdgePick, SelectionError> {
    match scenario {
        Scenario::SameLevel => select_same_level(index, levels, rng),
        Scenario::HigherToLower | Scenario::LowerToHigher => {
            let (high, low) = pick_two_levels(index, levels, rng)?;
            let high_node = pick_node(index.nodes_at(high), rng);
            let low_node = pick_node(index.nodes_at(low), rng);
            Ok(if scenario == Scenario::HigherToLower {
                EdgePick {
                    head: high_node,
                    tail: low_node,
                    head_level: high,
                    tail_level: low,
                }
            } else {
                EdgePick {
                    head: low_node,
                    tail: high_node,
                    head_level: low,
                    tail_level: high,
                }
            })
        }
    }
}

/// Random start level, then scan forward (wrapping) to the first level with
/// two or more nodes.
fn select_same_level<R: Rng + ?Sized>(
    index: &LevelIndex,
    levels: Level,
    rng: &mut R,
) -> Result<EdgePick, SelectionError> {
    if levels == 0 {
        return Err(SelectionError::NoCrowdedLevel { levels });
    }
    let start = rng.gen_range(0..levels);
    for offset in 0..levels {
        let level = (start + offset) % levels;
        let nodes = index.nodes_at(level);
        if nodes.len() < 2 {
            continue;
        }
        let (first, second) = distinct_pair(nodes.len(), rng);
        return Ok(EdgePick {
            head: nodes[first].clone(),
            tail: nodes[second].clone(),
            head_level: level,
            tail_level: level,
        });
    }
    Err(SelectionError::NoCrowdedLevel { levels })
}

/// Two distinct populated levels chosen uniformly, returned as `(high, low)`.
fn pick_two_levels<R: Rng + ?Sized>(
    index: &LevelIndex,
    levels: Level,
    rng: &mut R,
) -> Result<(Level, Level), SelectionError> {
    let populated = index.non_empty_levels(levels);
    if populated.len() < 2 {
        return Err(SelectionError::TooFewLevels {
            levels,
            non_empty: populated.len(),
        });
    }
    let (a, b) = distinct_pair(populated.len(), rng);
    let (a, b) = (populated[a], populated[b]);
    Ok((a.max(b), a.min(b)))
}

/// Two distinct positions in `0..len`, uniformly. `len` must be >= 2.
fn distinct_pair<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    let first = rng.gen_range(0..len);
    let mut second = rng.gen_range(0..len - 1);
    if second >= first {
        second += 1;
    }
    (first, second)
}

/// `nodes` must be non-empty.
fn pick_node<R: Rng + ?Sized>(nodes: &[String], rng: &mut R) -> String {
    nodes[rng.gen_range(0..nodes.len())].clone()
}
