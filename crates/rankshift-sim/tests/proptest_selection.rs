use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rankshift_core::LevelAssignment;
use rankshift_sim::scenario::{Mode, Scenario, Schedule, select_pair};

/// Assignments of up to 12 nodes over levels `0..6`.
fn arb_assignment() -> impl Strategy<Value = LevelAssignment> {
    prop::collection::vec(0u32..6, 1..12).prop_map(|levels| {
        let mut out = LevelAssignment::default();
        for (i, level) in levels.into_iter().enumerate() {
            out.insert(&format!("v{i}"), level);
        }
        out
    })
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    prop::sample::select(Scenario::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn schedule_has_period_six(steps in 0usize..100) {
        let mut a = Schedule::default();
        for _ in 0..steps {
            a.advance();
        }
        let mut b = a;
        for _ in 0..6 {
            b.advance();
        }
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.row() >= 3, a.mode() == Mode::Deletion);
    }

    #[test]
    fn picks_match_the_scenario(
        assignment in arb_assignment(),
        scenario in arb_scenario(),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let levels = 6;
        let index = assignment.index();

        match select_pair(scenario, &index, levels, &mut rng) {
            Ok(pick) => {
                prop_assert_ne!(&pick.head, &pick.tail);
                prop_assert_eq!(assignment.get(&pick.head), Some(pick.head_level));
                prop_assert_eq!(assignment.get(&pick.tail), Some(pick.tail_level));
                match scenario {
                    Scenario::SameLevel => prop_assert_eq!(pick.head_level, pick.tail_level),
                    Scenario::HigherToLower => prop_assert!(pick.head_level > pick.tail_level),
                    Scenario::LowerToHigher => prop_assert!(pick.head_level < pick.tail_level),
                }
            }
            Err(_) => {
                let populated = index.non_empty_levels(levels);
                match scenario {
                    Scenario::SameLevel => prop_assert!(
                        populated.iter().all(|&l| index.nodes_at(l).len() < 2)
                    ),
                    _ => prop_assert!(populated.len() < 2),
                }
            }
        }
    }
}
