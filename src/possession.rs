//! Possession outcome model.
//!
//! A model turns an offense/defense pairing into five outcome probabilities;
//! a single uniform draw then picks the outcome. The interval order is fixed:
//! `[3PT, 2PT, FT, TO, MISS]`.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assumptions::AssumptionRegistry;
use crate::calibration::CalibrationParams;
use crate::constants::LEAGUE_AVG_OFF_RATING;
use crate::team::TeamProfile;

/// Result of a single possession.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PossessionOutcome {
    #[serde(rename = "3PT")]
    ThreePointer,
    #[serde(rename = "2PT")]
    TwoPointer,
    #[serde(rename = "FT")]
    FreeThrow,
    #[serde(rename = "TO")]
    Turnover,
    #[serde(rename = "MISS")]
    Miss,
}

impl PossessionOutcome {
    pub fn points(&self) -> u32 {
        match self {
            PossessionOutcome::ThreePointer => 3,
            PossessionOutcome::TwoPointer => 2,
            PossessionOutcome::FreeThrow => 1,
            PossessionOutcome::Turnover | PossessionOutcome::Miss => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PossessionOutcome::ThreePointer => "3PT",
            PossessionOutcome::TwoPointer => "2PT",
            PossessionOutcome::FreeThrow => "FT",
            PossessionOutcome::Turnover => "TO",
            PossessionOutcome::Miss => "MISS",
        }
    }
}

impl fmt::Display for PossessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The five outcome probabilities of one possession.
///
/// Each is non-negative and they sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub three: f64,
    pub two: f64,
    pub free_throw: f64,
    pub turnover: f64,
    pub miss: f64,
}

impl OutcomeProbabilities {
    /// Build from the four non-miss masses, renormalizing when they exceed 1.
    ///
    /// Negative or NaN masses are treated as zero. Infinite masses saturate:
    /// they split the whole interval evenly and every finite mass drops to
    /// zero. If nothing is left the possession is a certain miss.
    pub fn from_masses(three: f64, two: f64, free_throw: f64, turnover: f64) -> Self {
        let mut masses = [three, two, free_throw, turnover].map(non_negative);

        let saturated = masses.iter().filter(|m| m.is_infinite()).count();
        if saturated > 0 {
            masses = masses.map(|m| if m.is_infinite() { 1.0 } else { 0.0 });
        }

        let mut total: f64 = masses.iter().sum();
        if total.is_infinite() {
            // Finite masses whose sum overflows; rescale by the largest first.
            let largest = masses.iter().copied().fold(0.0, f64::max);
            masses = masses.map(|m| m / largest);
            total = masses.iter().sum();
        }
        if total <= 0.0 {
            return OutcomeProbabilities::certain_miss();
        }

        let [three, two, free_throw, turnover] = masses;
        if total > 1.0 {
            OutcomeProbabilities {
                three: three / total,
                two: two / total,
                free_throw: free_throw / total,
                turnover: turnover / total,
                miss: 0.0,
            }
        } else {
            OutcomeProbabilities {
                three,
                two,
                free_throw,
                turnover,
                miss: 1.0 - total,
            }
        }
    }

    pub fn certain_miss() -> Self {
        OutcomeProbabilities {
            three: 0.0,
            two: 0.0,
            free_throw: 0.0,
            turnover: 0.0,
            miss: 1.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.three + self.two + self.free_throw + self.turnover + self.miss
    }

    /// Expected points of one possession
    pub fn expected_points(&self) -> f64 {
        3.0 * self.three + 2.0 * self.two + self.free_throw
    }

    /// Map a uniform draw in `[0, 1)` to its outcome interval.
    pub fn sample(&self, u: f64) -> PossessionOutcome {
        let mut edge = self.three;
        if u < edge {
            return PossessionOutcome::ThreePointer;
        }
        edge += self.two;
        if u < edge {
            return PossessionOutcome::TwoPointer;
        }
        edge += self.free_throw;
        if u < edge {
            return PossessionOutcome::FreeThrow;
        }
        edge += self.turnover;
        if u < edge {
            return PossessionOutcome::Turnover;
        }
        PossessionOutcome::Miss
    }
}

fn non_negative(p: f64) -> f64 {
    if p > 0.0 {
        p
    } else {
        0.0
    }
}

/// Everything a model needs to resolve one possession.
#[derive(Clone, Copy, Debug)]
pub struct PossessionContext<'a> {
    pub offense: &'a TeamProfile,
    pub defense: &'a TeamProfile,
    pub assumptions: &'a AssumptionRegistry,
    pub calibration: Option<&'a CalibrationParams>,
    /// Whether the offense is the home team
    pub is_home: bool,
    /// Per-possession scoring multiplier
    pub pace_modifier: f64,
}

/// A possession outcome model.
///
/// The game simulator only talks to this trait, so alternative models can be
/// swapped in without touching it.
pub trait PossessionModel: Send + Sync {
    fn probabilities(&self, ctx: &PossessionContext<'_>) -> OutcomeProbabilities;

    /// Draw one outcome using a single uniform number from `rng`.
    fn outcome(&self, ctx: &PossessionContext<'_>, rng: &mut dyn RngCore) -> PossessionOutcome {
        let u: f64 = rng.gen();
        self.probabilities(ctx).sample(u)
    }
}

/// Rating-driven heuristic model.
///
/// The offense's rating, adjusted for the opposing defense, sets the expected
/// points per possession. The shot mix from the assumptions is then scaled so
/// its expected value matches.
#[derive(Clone, Debug)]
pub struct HeuristicModel {
    pub league_avg_off_rating: f64,
}

impl HeuristicModel {
    pub fn new(league_avg_off_rating: f64) -> Self {
        HeuristicModel { league_avg_off_rating }
    }

    /// Expected points per possession before any shot-mix shaping.
    pub fn expected_points_per_possession(&self, ctx: &PossessionContext<'_>) -> f64 {
        let neutral = CalibrationParams::default();
        let calibration = ctx.calibration.unwrap_or(&neutral);
        let (offense_scalar, _) = calibration.side_scalars(ctx.is_home);

        let adj_off_rating =
            ctx.offense.off_rating * (ctx.defense.def_rating / self.league_avg_off_rating) * offense_scalar;

        (adj_off_rating / 100.0) * calibration.global_score_multiplier * ctx.pace_modifier
    }
}

impl Default for HeuristicModel {
    fn default() -> Self {
        HeuristicModel::new(LEAGUE_AVG_OFF_RATING)
    }
}

impl PossessionModel for HeuristicModel {
    fn probabilities(&self, ctx: &PossessionContext<'_>) -> OutcomeProbabilities {
        let expected_pts = self.expected_points_per_possession(ctx);

        let shot_mix = ctx.assumptions.shot_type_mix.value;
        let three_rate = ctx.offense.three_pt_rate;

        let three_prob = three_rate * shot_mix;
        let two_prob = (1.0 - three_rate) * (1.0 - shot_mix);
        let ft_prob = ctx.offense.ft_rate * ctx.assumptions.free_throw_rate.value;

        let baseline_ev = 3.0 * three_prob + 2.0 * two_prob + ft_prob;
        let scale = if baseline_ev > 0.0 {
            expected_pts / baseline_ev
        } else {
            1.0
        };

        OutcomeProbabilities::from_masses(
            three_prob * scale,
            two_prob * scale,
            ft_prob * scale,
            ctx.assumptions.turnover_rate.value,
        )
    }
}
