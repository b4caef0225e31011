//! Monte Carlo orchestration.
//!
//! A [`Simulation`] owns the team lookup, the possession model and the
//! historical record, and runs batches of independent games for one matchup
//! under one configuration.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::{validate_num_simulations, SimulationConfig};
use crate::constants::{COVERAGE_LOWER, COVERAGE_UPPER};
use crate::error::{Result, SimError};
use crate::game::{simulate_game, GameResult};
use crate::metrics::{analyze, SimulationMetrics};
use crate::possession::{HeuristicModel, PossessionModel};
use crate::team::{TeamLookup, TeamProfile};

/// A recorded game from the schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalGame {
    pub id: String,
    pub date: String,
    /// Home team abbreviation
    pub home: String,
    /// Away team abbreviation
    pub away: String,
}

/// Actual final score of a recorded game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub home: u32,
    pub away: u32,
}

impl FinalScore {
    pub fn margin(&self) -> i64 {
        i64::from(self.home) - i64::from(self.away)
    }
}

/// One row of the historical replay table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayRow {
    pub game_id: String,
    pub date: String,
    pub home: String,
    pub away: String,
    pub actual_home_score: u32,
    pub actual_away_score: u32,
    pub actual_margin: i64,
    pub predicted_home_win_prob: f64,
    pub predicted_margin: f64,
    /// Share of simulated margins strictly below the actual margin
    pub actual_margin_percentile: f64,
}

/// Validation summary over a replay table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub games: usize,
    /// Share of games where the favoured side (p > 0.5) won
    pub winner_accuracy: f64,
    /// Mean of predicted minus actual margin
    pub margin_bias: f64,
    pub mean_abs_margin_error: f64,
    pub brier_score: f64,
    /// Share of games whose actual margin sits inside the central 90% of the simulated margins
    pub coverage: f64,
}

impl ReplaySummary {
    pub fn from_rows(rows: &[ReplayRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let n = rows.len() as f64;

        let mut correct = 0usize;
        let mut bias = 0.0;
        let mut abs_err = 0.0;
        let mut brier = 0.0;
        let mut covered = 0usize;

        for row in rows {
            let home_won = row.actual_home_score > row.actual_away_score;
            if (row.predicted_home_win_prob > 0.5) == home_won {
                correct += 1;
            }
            let err = row.predicted_margin - row.actual_margin as f64;
            bias += err;
            abs_err += err.abs();
            let outcome = if home_won { 1.0 } else { 0.0 };
            brier += (row.predicted_home_win_prob - outcome).powi(2);
            if (COVERAGE_LOWER..=COVERAGE_UPPER).contains(&row.actual_margin_percentile) {
                covered += 1;
            }
        }

        Some(ReplaySummary {
            games: rows.len(),
            winner_accuracy: correct as f64 / n,
            margin_bias: bias / n,
            mean_abs_margin_error: abs_err / n,
            brier_score: brier / n,
            coverage: covered as f64 / n,
        })
    }
}

/// Monte Carlo orchestrator.
pub struct Simulation<T, M = HeuristicModel> {
    teams: T,
    model: M,
    config: SimulationConfig,
    games: Vec<HistoricalGame>,
    game_scores: HashMap<String, FinalScore>,
}

impl<T: TeamLookup> Simulation<T, HeuristicModel> {
    pub fn new(teams: T) -> Self {
        Simulation {
            teams,
            model: HeuristicModel::default(),
            config: SimulationConfig::default(),
            games: Vec::new(),
            game_scores: HashMap::new(),
        }
    }
}

impl<T: TeamLookup, M: PossessionModel> Simulation<T, M> {
    /// Swap the possession model, keeping everything else
    pub fn with_model<N: PossessionModel>(self, model: N) -> Simulation<T, N> {
        Simulation {
            teams: self.teams,
            model,
            config: self.config,
            games: self.games,
            game_scores: self.game_scores,
        }
    }

    /// Set the configuration used by [`Simulation::run_default`]
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the recorded schedule and its final scores
    pub fn with_history(mut self, games: Vec<HistoricalGame>, game_scores: HashMap<String, FinalScore>) -> Self {
        self.games = games;
        self.game_scores = game_scores;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn games(&self) -> &[HistoricalGame] {
        &self.games
    }

    pub fn game_score(&self, game_id: &str) -> Option<FinalScore> {
        self.game_scores.get(game_id).copied()
    }

    pub fn team(&self, abbreviation: &str) -> Result<&TeamProfile> {
        self.teams
            .team(abbreviation)
            .ok_or_else(|| SimError::TeamNotFound(abbreviation.to_string()))
    }

    fn batch_rng(config: &SimulationConfig) -> ChaCha8Rng {
        match config.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Run `num_simulations` games for one matchup.
    ///
    /// When `config.seed` is set the batch RNG is seeded once, so the whole
    /// batch (not each game) is reproducible.
    pub fn run(
        &self,
        home_id: &str,
        away_id: &str,
        num_simulations: usize,
        config: &SimulationConfig,
    ) -> Result<Vec<GameResult>> {
        config.validate()?;
        validate_num_simulations(num_simulations)?;
        let home = self.team(home_id)?;
        let away = self.team(away_id)?;

        debug!(
            home = home_id,
            away = away_id,
            num_simulations,
            seed = ?config.seed,
            "starting monte carlo batch"
        );

        let mut rng = Self::batch_rng(config);
        let mut results = Vec::with_capacity(num_simulations);
        for _ in 0..num_simulations {
            results.push(simulate_game(&self.model, home, away, config, &mut rng, false)?);
        }

        Ok(results)
    }

    /// Simulate one game with its possession log attached when `log_game` is set.
    pub fn simulate_single_game(
        &self,
        home_id: &str,
        away_id: &str,
        config: &SimulationConfig,
        log_game: bool,
    ) -> Result<GameResult> {
        config.validate()?;
        let home = self.team(home_id)?;
        let away = self.team(away_id)?;
        let mut rng = Self::batch_rng(config);
        simulate_game(&self.model, home, away, config, &mut rng, log_game)
    }

    /// Run a batch and reduce it to metrics.
    pub fn run_simulation_with_config(
        &self,
        home_id: &str,
        away_id: &str,
        num_simulations: usize,
        config: &SimulationConfig,
        want_distributions: bool,
    ) -> Result<SimulationMetrics> {
        let results = self.run(home_id, away_id, num_simulations, config)?;
        analyze(&results, want_distributions)
    }

    /// Run a batch with the attached configuration and its default batch size.
    pub fn run_default(&self, home_id: &str, away_id: &str, want_distributions: bool) -> Result<SimulationMetrics> {
        self.run_simulation_with_config(
            home_id,
            away_id,
            self.config.default_num_simulations,
            &self.config,
            want_distributions,
        )
    }
}

impl<T, M> Simulation<T, M>
where
    T: TeamLookup + Sync,
    M: PossessionModel,
{
    /// Replay every recorded game that has a known final score.
    ///
    /// Each game gets its own batch (seeded from `config`), so games run in
    /// parallel without changing any row. Games whose teams are missing from
    /// the lookup are skipped.
    pub fn run_historical_replay(&self, num_simulations: usize, config: &SimulationConfig) -> Result<Vec<ReplayRow>> {
        config.validate()?;
        validate_num_simulations(num_simulations)?;

        let rows: Vec<Option<ReplayRow>> = self
            .games
            .par_iter()
            .filter_map(|game| self.game_scores.get(&game.id).map(|score| (game, *score)))
            .map(|(game, actual)| self.replay_game(game, actual, num_simulations, config))
            .collect::<Result<_>>()?;

        Ok(rows.into_iter().flatten().collect())
    }

    fn replay_game(
        &self,
        game: &HistoricalGame,
        actual: FinalScore,
        num_simulations: usize,
        config: &SimulationConfig,
    ) -> Result<Option<ReplayRow>> {
        let metrics =
            match self.run_simulation_with_config(&game.home, &game.away, num_simulations, config, true) {
                Ok(metrics) => metrics,
                Err(SimError::TeamNotFound(team)) => {
                    warn!(game_id = %game.id, team = %team, "skipping replay: team missing from lookup");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

        let actual_margin = actual.margin();
        let below = metrics
            .margin_distribution
            .iter()
            .filter(|&&m| m < actual_margin)
            .count();

        Ok(Some(ReplayRow {
            game_id: game.id.clone(),
            date: game.date.clone(),
            home: game.home.clone(),
            away: game.away.clone(),
            actual_home_score: actual.home,
            actual_away_score: actual.away,
            actual_margin,
            predicted_home_win_prob: metrics.win_probability.home,
            predicted_margin: metrics.expected_margin,
            actual_margin_percentile: below as f64 / metrics.margin_distribution.len() as f64,
        }))
    }
}
