use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::assumptions::AssumptionRegistry;
use crate::calibration::CalibrationParams;
use crate::constants::{
    DEFAULT_MAX_PACE, DEFAULT_MIN_PACE, DEFAULT_NUM_SIMULATIONS, DEFAULT_PACE_STD_DEV,
    DEFAULT_SEED, MAX_SIMULATIONS, MIN_SIMULATIONS,
};
use crate::error::{Result, SimError};

/// Configuration for one Monte Carlo batch.
///
/// Treated as an immutable value: the `with_*` builders return modified
/// copies, so a default instance can be shared freely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seeds the batch RNG once; `None` draws from entropy.
    ///
    /// TOML has no null, so a config read from a file is always seeded: an
    /// absent `seed` key means the default seed. Use [`Self::with_seed`] with
    /// `None` for an unseeded batch.
    pub seed: Option<u64>,
    pub default_num_simulations: usize,
    pub pace_std_dev: f64,
    pub min_pace: u32,
    pub max_pace: u32,
    /// Direct override of `assumptions.pace_modifier`
    pub pace_modifier: Option<f64>,
    pub assumptions: AssumptionRegistry,
    pub calibration: Option<CalibrationParams>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: Some(DEFAULT_SEED),
            default_num_simulations: DEFAULT_NUM_SIMULATIONS,
            pace_std_dev: DEFAULT_PACE_STD_DEV,
            min_pace: DEFAULT_MIN_PACE,
            max_pace: DEFAULT_MAX_PACE,
            pace_modifier: None,
            assumptions: AssumptionRegistry::default(),
            calibration: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SimulationConfig =
            toml::from_str(s).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Check the structural invariants of the config.
    pub fn validate(&self) -> Result<()> {
        if self.default_num_simulations == 0 {
            return Err(SimError::InvalidConfiguration(
                "default_num_simulations must be positive".to_string(),
            ));
        }
        if self.min_pace > self.max_pace {
            return Err(SimError::InvalidConfiguration(format!(
                "min_pace ({}) exceeds max_pace ({})",
                self.min_pace, self.max_pace
            )));
        }
        if !self.pace_std_dev.is_finite() || self.pace_std_dev < 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "pace_std_dev must be finite and non-negative, got {}",
                self.pace_std_dev
            )));
        }
        if let Some(modifier) = self.pace_modifier {
            if !modifier.is_finite() {
                return Err(SimError::InvalidConfiguration(
                    "pace_modifier must be finite".to_string(),
                ));
            }
        }
        if let Some(bad) = self.assumptions.iter().find(|a| !a.value.is_finite()) {
            return Err(SimError::InvalidConfiguration(format!(
                "assumption {} is not finite",
                bad.name
            )));
        }
        if let Some(cal) = &self.calibration {
            if cal.to_map().values().any(|v| !v.is_finite()) || cal.pace_standard_deviation < 0.0 {
                return Err(SimError::InvalidConfiguration(
                    "calibration parameters must be finite with a non-negative pace deviation"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Pace multiplier in effect: a direct override wins over the assumption.
    pub fn effective_pace_modifier(&self) -> f64 {
        self.pace_modifier.unwrap_or(self.assumptions.pace_modifier.value)
    }

    /// Pace standard deviation in effect: a positive calibration value wins.
    pub fn effective_pace_std_dev(&self) -> f64 {
        match &self.calibration {
            Some(cal) if cal.pace_standard_deviation > 0.0 => cal.pace_standard_deviation,
            _ => self.pace_std_dev,
        }
    }

    pub fn with_seed(&self, seed: Option<u64>) -> Self {
        SimulationConfig { seed, ..self.clone() }
    }

    pub fn with_assumptions(&self, assumptions: AssumptionRegistry) -> Self {
        SimulationConfig { assumptions, ..self.clone() }
    }

    pub fn with_calibration(&self, calibration: Option<CalibrationParams>) -> Self {
        SimulationConfig { calibration, ..self.clone() }
    }

    pub fn with_pace_modifier(&self, pace_modifier: Option<f64>) -> Self {
        SimulationConfig { pace_modifier, ..self.clone() }
    }
}

/// Request-level bound on the batch size, owned by whichever layer accepts requests.
pub fn validate_num_simulations(num_simulations: usize) -> Result<()> {
    if (MIN_SIMULATIONS..=MAX_SIMULATIONS).contains(&num_simulations) {
        Ok(())
    } else {
        Err(SimError::InvalidConfiguration(format!(
            "number of simulations must be between {} and {}, got {}",
            MIN_SIMULATIONS, MAX_SIMULATIONS, num_simulations
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionName;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_pace_bounds_rejected() {
        let config = SimulationConfig {
            min_pace: 120,
            max_pace: 90,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_zero_default_batch_rejected() {
        let config = SimulationConfig {
            default_num_simulations: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_num_simulations_bounds() {
        assert!(validate_num_simulations(1).is_ok());
        assert!(validate_num_simulations(25_000).is_ok());
        assert!(validate_num_simulations(0).is_err());
        assert!(validate_num_simulations(25_001).is_err());
    }

    #[test]
    fn test_direct_pace_override_wins() {
        let base = SimulationConfig::default()
            .with_assumptions(AssumptionRegistry::default().with_override(AssumptionName::PaceModifier, 0.9));
        assert!((base.effective_pace_modifier() - 0.9).abs() < 1e-12);

        let overridden = base.with_pace_modifier(Some(1.2));
        assert!((overridden.effective_pace_modifier() - 1.2).abs() < 1e-12);
        // The override does not rewrite the registry
        assert!((overridden.assumptions.pace_modifier.value - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_pace_std_dev_override() {
        let config = SimulationConfig::default();
        assert_eq!(config.effective_pace_std_dev(), DEFAULT_PACE_STD_DEV);

        let neutral = config.with_calibration(Some(CalibrationParams::default()));
        assert_eq!(neutral.effective_pace_std_dev(), DEFAULT_PACE_STD_DEV);

        let wide = config.with_calibration(Some(CalibrationParams {
            pace_standard_deviation: 25.0,
            ..CalibrationParams::default()
        }));
        assert_eq!(wide.effective_pace_std_dev(), 25.0);
    }

    #[test]
    fn test_from_toml_str() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7
            min_pace = 90
            max_pace = 110

            [calibration]
            home_offense_scalar = 1.1
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.min_pace, 90);
        assert_eq!(config.default_num_simulations, DEFAULT_NUM_SIMULATIONS);
        let cal = config.calibration.unwrap();
        assert_eq!(cal.home_offense_scalar, 1.1);
        assert_eq!(cal.away_offense_scalar, 1.0);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hoopsim_config_{}.toml", std::process::id()));
        fs::write(&path, "seed = 11\npace_std_dev = 0.0\n").unwrap();
        let config = SimulationConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.seed, Some(11));
        assert_eq!(config.pace_std_dev, 0.0);

        let missing = SimulationConfig::load(std::env::temp_dir().join("hoopsim_no_such_config.toml"));
        assert!(matches!(missing, Err(SimError::Config(_))));
    }

    #[test]
    fn test_file_configs_are_always_seeded() {
        let config = SimulationConfig::from_toml_str("max_pace = 120\n").unwrap();
        assert_eq!(config.seed, Some(DEFAULT_SEED));
        assert_eq!(config.with_seed(None).seed, None);
    }

    #[test]
    fn test_from_toml_str_validates() {
        let err = SimulationConfig::from_toml_str("min_pace = 100\nmax_pace = 99\n").unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));

        let err = SimulationConfig::from_toml_str("min_pace = \"fast\"").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}
