//! Final report of the perturbation experiment.

use std::fmt::Write as _;

use serde::Serialize;

use rankshift_core::Level;

use crate::scenario::{Mode, Scenario, row_for};
use crate::stats::MovementStats;

/// Aggregated movement tables for a finished (or interrupted) run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerturbationReport {
    pub iterations: u64,
    pub levels: Level,
    pub stats: MovementStats,
}

impl PerturbationReport {
    /// Legend for the endpoint table rows, e.g. `0: Add =, 1: Add >, ...`.
    #[must_use]
    pub fn row_legend() -> String {
        let mut parts = Vec::with_capacity(6);
        for mode in Mode::ALL {
            for scenario in Scenario::ALL {
                parts.push(format!(
                    "{}: {} {}",
                    row_for(scenario, mode),
                    mode.label(),
                    scenario.symbol()
                ));
            }
        }
        parts.join(", ")
    }

    /// Plain-text rendering of all four tables with their legends.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", Self::row_legend());

        let _ = writeln!(out, "Head stats: UP, DOWN, SAME");
        write_table(&mut out, &self.stats.head);
        let _ = writeln!(out, "Tail stats");
        write_table(&mut out, &self.stats.tail);

        let _ = writeln!(
            out,
            "Neighbor rows: 3 * [Equal, Greater, Lesser] + [Up, Down, Same] \
             (neighbor level vs endpoint level before, endpoint movement)"
        );
        let _ = writeln!(out, "Neighbor columns: [Up, Down, Same] (neighbor movement)");
        let _ = writeln!(out, "Edge head stats");
        write_table(&mut out, &self.stats.edge_head);
        let _ = writeln!(out, "Edge tail stats");
        write_table(&mut out, &self.stats.edge_tail);
        out
    }
}

fn write_table(out: &mut String, rows: &[[u64; 3]]) {
    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(out, "{i} : [{}, {}, {}]", row[0], row[1], row[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Movement;

    #[test]
    fn legend_lists_six_rows_in_order() {
        assert_eq!(
            PerturbationReport::row_legend(),
            "0: Add =, 1: Add >, 2: Add <, 3: Del =, 4: Del >, 5: Del <"
        );
    }

    #[test]
    fn text_layout_has_every_table() {
        let mut stats = MovementStats::default();
        stats.record_endpoints(0, Movement::Same, Movement::Down);
        let report = PerturbationReport {
            iterations: 1,
            levels: 9,
            stats,
        };
        let text = report.render_text();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[1], "Head stats: UP, DOWN, SAME");
        assert_eq!(lines[2], "0 : [0, 0, 1]");
        assert_eq!(lines[8], "Tail stats");
        assert_eq!(lines[9], "0 : [0, 1, 0]");
        assert!(text.contains("Edge head stats\n0 : [0, 0, 0]"));
        assert!(text.contains("Edge tail stats\n"));
        assert!(text.ends_with("8 : [0, 0, 0]\n"));
        // legend + 2 * (heading + 6) + 2 legend lines + 2 * (heading + 9)
        assert_eq!(lines.len(), 1 + 14 + 2 + 20);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = PerturbationReport {
            iterations: 6,
            levels: 9,
            stats: MovementStats::default(),
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"iterations\":6"));
        assert!(json.contains("\"edge_tail\":[[0,0,0]"));
    }
}
