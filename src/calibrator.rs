//! Calibration runs over a fixed set of matchups.
//!
//! Each step runs one batch per matchup, pools the game-level results
//! reconstructed from every batch, and compares the pooled summary with the
//! historical targets.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::calibration::{CalibrationParameter, CalibrationParams};
use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::game::GameResult;
use crate::possession::PossessionModel;
use crate::simulation::Simulation;
use crate::targets::{compare_to_targets, default_targets, CalibrationSummary, CalibrationTarget, TargetComparison};
use crate::team::TeamLookup;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub home: String,
    pub away: String,
}

impl Matchup {
    pub fn new(home: &str, away: &str) -> Self {
        Matchup {
            home: home.to_string(),
            away: away.to_string(),
        }
    }
}

/// Targets and matchups for calibration, usually read from a TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    pub targets: BTreeMap<String, CalibrationTarget>,
    pub matchups: Vec<Matchup>,
    pub num_simulations: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        CalibrationSettings {
            targets: default_targets(),
            matchups: vec![
                Matchup::new("GSW", "LAL"),
                Matchup::new("BKN", "CHA"),
                Matchup::new("MIL", "PHX"),
                Matchup::new("UTA", "DEN"),
            ],
            num_simulations: 1000,
        }
    }
}

impl CalibrationSettings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }
}

/// Outcome of one calibration step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub step_name: String,
    /// Parameter values used for this step
    pub parameters: BTreeMap<String, f64>,
    /// Number of pooled games
    pub games: usize,
    pub summary: CalibrationSummary,
    pub comparison: BTreeMap<String, TargetComparison>,
}

impl CalibrationReport {
    pub fn all_within_tolerance(&self) -> bool {
        self.comparison.values().all(|c| c.within_tolerance)
    }

    /// Render as Markdown; parameters are embedded as a JSON block.
    pub fn to_markdown(&self) -> String {
        let params = serde_json::to_string_pretty(&self.parameters).unwrap_or_else(|_| "{}".to_string());

        let mut out = String::new();
        let _ = writeln!(out, "# Calibration Report: {}\n", self.step_name);
        let _ = writeln!(out, "**Parameters Used:**\n```json\n{}\n```\n", params);
        let _ = writeln!(out, "**Metrics vs. Targets:** ({} games)\n", self.games);
        let _ = writeln!(out, "| Metric | Simulated | Target | Error | Tolerance |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for (metric, c) in &self.comparison {
            let _ = writeln!(
                out,
                "| {} | {:.4} | {:.4} | {:.4} | {:.4} |",
                metric, c.simulated, c.target, c.error, c.tolerance
            );
        }
        out
    }
}

/// Drives calibration steps against a simulation.
pub struct Calibrator<'a, T, M> {
    simulation: &'a Simulation<T, M>,
    base_config: SimulationConfig,
    targets: BTreeMap<String, CalibrationTarget>,
}

impl<'a, T, M> Calibrator<'a, T, M>
where
    T: TeamLookup + Sync,
    M: PossessionModel,
{
    pub fn new(simulation: &'a Simulation<T, M>, targets: BTreeMap<String, CalibrationTarget>) -> Self {
        Calibrator {
            simulation,
            base_config: SimulationConfig::default(),
            targets,
        }
    }

    /// Config every step starts from; each step replaces only its calibration
    pub fn with_base_config(mut self, config: SimulationConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Pool game-level results for every matchup under one calibration.
    fn pooled_results(
        &self,
        params: &CalibrationParams,
        matchups: &[Matchup],
        num_simulations: usize,
    ) -> Result<Vec<GameResult>> {
        let config = self.base_config.with_calibration(Some(params.clone()));
        let mut pooled = Vec::with_capacity(matchups.len() * num_simulations);
        for matchup in matchups {
            let metrics = self.simulation.run_simulation_with_config(
                &matchup.home,
                &matchup.away,
                num_simulations,
                &config,
                true,
            )?;
            pooled.extend(metrics.reconstruct_results().unwrap_or_default());
        }
        Ok(pooled)
    }

    fn evaluate(
        &self,
        step_name: String,
        params: &CalibrationParams,
        reported: BTreeMap<String, f64>,
        matchups: &[Matchup],
        num_simulations: usize,
    ) -> Result<CalibrationReport> {
        let pooled = self.pooled_results(params, matchups, num_simulations)?;
        let summary = CalibrationSummary::from_results(&pooled)?;
        let comparison = compare_to_targets(&summary, &self.targets);

        info!(
            step = %step_name,
            games = pooled.len(),
            average_total_points = summary.average_total_points,
            home_win_rate = summary.home_win_rate,
            "calibration step complete"
        );

        Ok(CalibrationReport {
            step_name,
            parameters: reported,
            games: pooled.len(),
            summary,
            comparison,
        })
    }

    /// Neutral calibration, reported as step `baseline`.
    pub fn run_baseline_snapshot(&self, matchups: &[Matchup], num_simulations: usize) -> Result<CalibrationReport> {
        self.evaluate(
            "baseline".to_string(),
            &CalibrationParams::default(),
            BTreeMap::new(),
            matchups,
            num_simulations,
        )
    }

    /// Evaluate one fixed calibration.
    pub fn run_single_config(
        &self,
        params: &CalibrationParams,
        matchups: &[Matchup],
        num_simulations: usize,
        report_name: &str,
    ) -> Result<CalibrationReport> {
        self.evaluate(report_name.to_string(), params, params.to_map(), matchups, num_simulations)
    }

    /// Sweep one parameter over `values`, all other parameters neutral.
    ///
    /// Steps are independent batches and run in parallel; report order
    /// follows `values`.
    pub fn run_single_parameter(
        &self,
        parameter: CalibrationParameter,
        values: &[f64],
        matchups: &[Matchup],
        num_simulations: usize,
    ) -> Result<Vec<CalibrationReport>> {
        info!(parameter = %parameter, steps = values.len(), "running parameter sweep");
        values
            .par_iter()
            .enumerate()
            .map(|(i, &value)| {
                let params = CalibrationParams::default().with(parameter, value);
                let mut reported = BTreeMap::new();
                reported.insert(parameter.as_str().to_string(), value);
                self.evaluate(
                    format!("{}_step_{}", parameter, i),
                    &params,
                    reported,
                    matchups,
                    num_simulations,
                )
            })
            .collect()
    }
}
