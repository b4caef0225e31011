use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::assumptions::{AssumptionName, AssumptionRegistry};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::metrics::SimulationMetrics;
use crate::possession::PossessionModel;
use crate::simulation::Simulation;
use crate::team::TeamLookup;

/// Effect of one relative perturbation of one assumption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub assumption_name: AssumptionName,
    pub perturbation: f64,
    pub perturbed_value: f64,
    pub win_probability_delta: f64,
    pub expected_margin_delta: f64,
}

impl SensitivityResult {
    /// Whether the perturbation moved either output at all
    pub fn is_live(&self) -> bool {
        self.win_probability_delta != 0.0 || self.expected_margin_delta != 0.0
    }
}

/// One-at-a-time sensitivity analysis around a baseline run.
pub struct SensitivityAnalysis<'a, T, M> {
    simulation: &'a Simulation<T, M>,
    home: String,
    away: String,
    num_simulations: usize,
    config: SimulationConfig,
    base_results: SimulationMetrics,
}

impl<'a, T, M> SensitivityAnalysis<'a, T, M>
where
    T: TeamLookup + Sync,
    M: PossessionModel,
{
    /// Run the baseline batch. `config.assumptions` is the baseline registry.
    pub fn new(
        simulation: &'a Simulation<T, M>,
        home: &str,
        away: &str,
        num_simulations: usize,
        config: SimulationConfig,
    ) -> Result<Self> {
        let base_results = simulation.run_simulation_with_config(home, away, num_simulations, &config, false)?;
        Ok(SensitivityAnalysis {
            simulation,
            home: home.to_string(),
            away: away.to_string(),
            num_simulations,
            config,
            base_results,
        })
    }

    pub fn base_results(&self) -> &SimulationMetrics {
        &self.base_results
    }

    pub fn assumptions(&self) -> &AssumptionRegistry {
        &self.config.assumptions
    }

    /// Re-run with `name` scaled by `(1 + p)` for each `p`, everything else at baseline.
    pub fn run_one_at_a_time(&self, name: AssumptionName, perturbations: &[f64]) -> Result<Vec<SensitivityResult>> {
        perturbations
            .par_iter()
            .map(|&p| {
                let assumptions = self.config.assumptions.with_perturbation(name, p);
                let perturbed_value = assumptions.value(name);
                let config = self.config.with_assumptions(assumptions);

                let metrics = self.simulation.run_simulation_with_config(
                    &self.home,
                    &self.away,
                    self.num_simulations,
                    &config,
                    false,
                )?;

                let result = SensitivityResult {
                    assumption_name: name,
                    perturbation: p,
                    perturbed_value,
                    win_probability_delta: metrics.win_probability.home - self.base_results.win_probability.home,
                    expected_margin_delta: metrics.expected_margin - self.base_results.expected_margin,
                };
                info!(
                    assumption = %name,
                    perturbation = p,
                    win_probability_delta = result.win_probability_delta,
                    expected_margin_delta = result.expected_margin_delta,
                    "sensitivity run"
                );
                Ok(result)
            })
            .collect()
    }

    /// Same as [`run_one_at_a_time`](Self::run_one_at_a_time), naming the assumption by string.
    pub fn run_one_at_a_time_by_name(&self, name: &str, perturbations: &[f64]) -> Result<Vec<SensitivityResult>> {
        self.run_one_at_a_time(name.parse()?, perturbations)
    }
}

/// A named set of absolute assumption overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub overrides: BTreeMap<String, f64>,
}

impl Scenario {
    pub fn assumptions(&self, base: &AssumptionRegistry) -> Result<AssumptionRegistry> {
        self.overrides.iter().try_fold(base.clone(), |registry, (key, &value)| {
            Ok(registry.with_override(key.parse()?, value))
        })
    }

    pub fn run<T: TeamLookup, M: PossessionModel>(
        &self,
        simulation: &Simulation<T, M>,
        home: &str,
        away: &str,
        num_simulations: usize,
        config: &SimulationConfig,
    ) -> Result<SimulationMetrics> {
        let config = config.with_assumptions(self.assumptions(&config.assumptions)?);
        simulation.run_simulation_with_config(home, away, num_simulations, &config, false)
    }
}

/// Population variance of home win probability across competing runs.
///
/// `None` with fewer than two runs to compare.
pub fn model_disagreement(runs: &[SimulationMetrics]) -> Option<f64> {
    if runs.len() < 2 {
        return None;
    }
    let n = runs.len() as f64;
    let mean = runs.iter().map(|m| m.win_probability.home).sum::<f64>() / n;
    Some(runs.iter().map(|m| (m.win_probability.home - mean).powi(2)).sum::<f64>() / n)
}
