use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::possession::{PossessionContext, PossessionModel, PossessionOutcome};
use crate::team::TeamProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

/// Outcome of a simulated game. A level score is a draw, not a forced winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Away,
    Draw,
}

impl Winner {
    pub fn from_scores(home_score: u32, away_score: u32) -> Self {
        use std::cmp::Ordering;
        match home_score.cmp(&away_score) {
            Ordering::Greater => Winner::Home,
            Ordering::Less => Winner::Away,
            Ordering::Equal => Winner::Draw,
        }
    }
}

/// One logged possession.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PossessionRecord {
    pub side: Side,
    pub outcome: PossessionOutcome,
    pub points: u32,
}

/// Result of a single simulated game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub home_score: u32,
    pub away_score: u32,
    pub total_points: u32,
    pub winner: Winner,
    /// Possessions played (after clamping)
    pub possessions: u32,
    /// Present only when logging was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<PossessionRecord>>,
}

impl GameResult {
    /// Rebuild a result from final scores alone, e.g. from a stored distribution.
    pub fn from_scores(home_score: u32, away_score: u32) -> Self {
        GameResult {
            home_score,
            away_score,
            total_points: home_score + away_score,
            winner: Winner::from_scores(home_score, away_score),
            possessions: 0,
            log: None,
        }
    }

    /// Home score minus away score
    pub fn margin(&self) -> i64 {
        i64::from(self.home_score) - i64::from(self.away_score)
    }
}

/// Sample the possession count: `round(Normal(mean, std_dev))`, clamped.
///
/// A zero standard deviation yields the rounded mean without touching `rng`.
pub fn sample_possessions<R: Rng>(
    mean: f64,
    std_dev: f64,
    min_pace: u32,
    max_pace: u32,
    rng: &mut R,
) -> Result<u32> {
    if min_pace > max_pace {
        return Err(SimError::InvalidConfiguration(format!(
            "min_pace ({}) exceeds max_pace ({})",
            min_pace, max_pace
        )));
    }

    let raw = if std_dev > 0.0 {
        let normal = Normal::new(mean, std_dev).map_err(|e| {
            SimError::InvalidConfiguration(format!("pace distribution N({}, {}): {}", mean, std_dev, e))
        })?;
        rng.sample(normal)
    } else {
        mean
    };

    let rounded = raw.round();
    let clamped = if rounded.is_nan() {
        f64::from(min_pace)
    } else {
        rounded.clamp(f64::from(min_pace), f64::from(max_pace))
    };
    Ok(clamped as u32)
}

/// Simulate one game between `home` and `away`.
///
/// The caller owns `rng`; a Monte Carlo batch threads a single generator
/// through every game so the whole batch is reproducible from one seed.
pub fn simulate_game<M, R>(
    model: &M,
    home: &TeamProfile,
    away: &TeamProfile,
    config: &SimulationConfig,
    rng: &mut R,
    log_game: bool,
) -> Result<GameResult>
where
    M: PossessionModel + ?Sized,
    R: Rng,
{
    let avg_pace = (home.pace + away.pace) / 2.0;
    let final_pace = avg_pace * config.effective_pace_modifier();
    let possession_count = sample_possessions(
        final_pace,
        config.effective_pace_std_dev(),
        config.min_pace,
        config.max_pace,
        rng,
    )?;

    // Simulation-local copies; offense scalars are applied by the model itself.
    let mut home_sim = home.with_home_court(config.assumptions.home_court_advantage.value);
    let mut away_sim = away.clone();
    if let Some(cal) = &config.calibration {
        home_sim = home_sim.with_defense_scalar(cal.home_defense_scalar);
        away_sim = away_sim.with_defense_scalar(cal.away_defense_scalar);
    }

    let scoring_modifier = config.calibration.as_ref().map_or(1.0, |c| c.pace_modifier);
    let home_ctx = PossessionContext {
        offense: &home_sim,
        defense: &away_sim,
        assumptions: &config.assumptions,
        calibration: config.calibration.as_ref(),
        is_home: true,
        pace_modifier: scoring_modifier,
    };
    let away_ctx = PossessionContext {
        offense: &away_sim,
        defense: &home_sim,
        is_home: false,
        ..home_ctx
    };

    let mut log = if log_game {
        Some(Vec::with_capacity(possession_count as usize))
    } else {
        None
    };

    let mut home_score = 0u32;
    let mut away_score = 0u32;

    for i in 0..possession_count {
        let (side, ctx) = if i % 2 == 0 {
            (Side::Home, &home_ctx)
        } else {
            (Side::Away, &away_ctx)
        };

        let outcome = model.outcome(ctx, &mut *rng);
        let points = outcome.points();
        match side {
            Side::Home => home_score += points,
            Side::Away => away_score += points,
        }

        if let Some(entries) = log.as_mut() {
            entries.push(PossessionRecord { side, outcome, points });
        }
    }

    Ok(GameResult {
        home_score,
        away_score,
        total_points: home_score + away_score,
        winner: Winner::from_scores(home_score, away_score),
        possessions: possession_count,
        log,
    })
}
