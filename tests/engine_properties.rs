use hoopsim_core::assumptions::{AssumptionName, AssumptionRegistry};
use hoopsim_core::calibration::CalibrationParams;
use hoopsim_core::config::SimulationConfig;
use hoopsim_core::game::{sample_possessions, GameResult};
use hoopsim_core::metrics::analyze;
use hoopsim_core::possession::{
    HeuristicModel, OutcomeProbabilities, PossessionContext, PossessionModel, PossessionOutcome,
};
use hoopsim_core::simulation::Simulation;
use hoopsim_core::team::{index_by_abbreviation, TeamProfile};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn assert_distribution(p: &OutcomeProbabilities) -> Result<(), TestCaseError> {
    for mass in [p.three, p.two, p.free_throw, p.turnover, p.miss] {
        prop_assert!(mass >= 0.0, "negative mass in {:?}", p);
    }
    prop_assert!((p.total() - 1.0).abs() < 1e-9, "masses sum to {} in {:?}", p.total(), p);
    Ok(())
}

// ── Outcome probabilities always form a distribution ──────────────────────

proptest! {
    #[test]
    fn masses_form_a_distribution(
        three in -1.0f64..2.0,
        two in -1.0f64..2.0,
        free_throw in -1.0f64..2.0,
        turnover in -1.0f64..2.0,
    ) {
        assert_distribution(&OutcomeProbabilities::from_masses(three, two, free_throw, turnover))?;
    }

    #[test]
    fn heuristic_model_yields_a_distribution(
        off_rating in 80.0f64..140.0,
        def_rating in 80.0f64..140.0,
        three_pt_rate in 0.0f64..1.0,
        ft_rate in 0.0f64..0.5,
        pace_modifier in 0.5f64..2.0,
        global_score_multiplier in 0.5f64..3.0,
        is_home in any::<bool>(),
        turnover_rate in 0.0f64..1.5,
        shot_type_mix in 0.0f64..1.0,
        free_throw_rate in 0.0f64..1.0,
    ) {
        let offense = TeamProfile::new("O", 100.0, off_rating, 110.0, three_pt_rate, ft_rate);
        let defense = TeamProfile::new("D", 100.0, 110.0, def_rating, 0.4, 0.2);
        let assumptions = AssumptionRegistry::default()
            .with_override(AssumptionName::TurnoverRate, turnover_rate)
            .with_override(AssumptionName::ShotTypeMix, shot_type_mix)
            .with_override(AssumptionName::FreeThrowRate, free_throw_rate);
        let calibration = CalibrationParams { global_score_multiplier, ..CalibrationParams::default() };
        let ctx = PossessionContext {
            offense: &offense,
            defense: &defense,
            assumptions: &assumptions,
            calibration: Some(&calibration),
            is_home,
            pace_modifier,
        };
        assert_distribution(&HeuristicModel::default().probabilities(&ctx))?;
    }

    #[test]
    fn draw_lands_in_its_own_interval(
        three in 0.0f64..0.5,
        two in 0.0f64..0.5,
        free_throw in 0.0f64..0.3,
        turnover in 0.0f64..0.3,
        u in 0.0f64..1.0,
    ) {
        let p = OutcomeProbabilities::from_masses(three, two, free_throw, turnover);
        let intervals = [
            (PossessionOutcome::ThreePointer, p.three),
            (PossessionOutcome::TwoPointer, p.two),
            (PossessionOutcome::FreeThrow, p.free_throw),
            (PossessionOutcome::Turnover, p.turnover),
            (PossessionOutcome::Miss, p.miss),
        ];

        let outcome = p.sample(u);
        let mut lower = 0.0;
        for (candidate, mass) in intervals {
            if candidate == outcome {
                break;
            }
            lower += mass;
        }
        prop_assert!(u >= lower, "u={} below {} interval starting at {}", u, outcome, lower);
        if outcome != PossessionOutcome::Miss {
            let upper = lower + intervals.iter().find(|(c, _)| *c == outcome).map_or(0.0, |(_, m)| *m);
            prop_assert!(u < upper, "u={} past {} interval ending at {}", u, outcome, upper);
        }
    }
}

// ── Possession counts stay inside the configured band ─────────────────────

proptest! {
    #[test]
    fn possessions_are_clamped(
        mean in 0.0f64..250.0,
        std_dev in 0.0f64..40.0,
        min_pace in 50u32..100,
        width in 0u32..60,
        seed in any::<u64>(),
    ) {
        let max_pace = min_pace + width;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = sample_possessions(mean, std_dev, min_pace, max_pace, &mut rng).unwrap();
        prop_assert!(n >= min_pace && n <= max_pace);
    }
}

// ── Batch reduction conserves games ───────────────────────────────────────

proptest! {
    #[test]
    fn outcomes_and_histogram_account_for_every_game(
        scores in prop::collection::vec((0u32..200, 0u32..200), 1..200),
    ) {
        let results: Vec<GameResult> = scores.iter().map(|&(h, a)| GameResult::from_scores(h, a)).collect();
        let metrics = analyze(&results, false).unwrap();

        let wp = metrics.win_probability;
        prop_assert!((wp.home + wp.away + wp.draw - 1.0).abs() < 1e-9);

        let binned: u32 = metrics.win_margin_distribution.values().sum();
        prop_assert_eq!(binned + metrics.margins_outside_histogram, results.len() as u32);
        prop_assert_eq!(metrics.win_margin_distribution.len(), 101);
    }
}

// ── Seeded batches are reproducible ───────────────────────────────────────

#[test]
fn seeded_batch_is_reproducible_end_to_end() {
    let sim = Simulation::new(index_by_abbreviation([
        TeamProfile::new("A", 100.0, 110.0, 105.0, 0.4, 0.2),
        TeamProfile::new("B", 100.0, 105.0, 110.0, 0.4, 0.2),
    ]));
    let config = SimulationConfig::default().with_seed(Some(42));

    let first = sim.run_simulation_with_config("A", "B", 500, &config, true).unwrap();
    let second = sim.run_simulation_with_config("A", "B", 500, &config, true).unwrap();

    assert_eq!(first, second);
    assert!(first.win_probability.home > 0.5);
    assert!(first.expected_margin > 0.0);
}
