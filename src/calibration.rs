use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// Multiplicative scalars applied on top of the assumptions.
///
/// Every field defaults to neutral: scalars to 1.0, the pace standard deviation
/// override to 0.0 (meaning "use the config's value").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    pub global_score_multiplier: f64,
    /// Per-possession scoring multiplier handed to the possession model
    pub pace_modifier: f64,
    /// Overrides `SimulationConfig::pace_std_dev` when positive
    pub pace_standard_deviation: f64,
    pub home_offense_scalar: f64,
    pub home_defense_scalar: f64,
    pub away_offense_scalar: f64,
    pub away_defense_scalar: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        CalibrationParams {
            global_score_multiplier: 1.0,
            pace_modifier: 1.0,
            pace_standard_deviation: 0.0,
            home_offense_scalar: 1.0,
            home_defense_scalar: 1.0,
            away_offense_scalar: 1.0,
            away_defense_scalar: 1.0,
        }
    }
}

impl CalibrationParams {
    pub fn get(&self, parameter: CalibrationParameter) -> f64 {
        match parameter {
            CalibrationParameter::GlobalScoreMultiplier => self.global_score_multiplier,
            CalibrationParameter::PaceModifier => self.pace_modifier,
            CalibrationParameter::PaceStandardDeviation => self.pace_standard_deviation,
            CalibrationParameter::HomeOffenseScalar => self.home_offense_scalar,
            CalibrationParameter::HomeDefenseScalar => self.home_defense_scalar,
            CalibrationParameter::AwayOffenseScalar => self.away_offense_scalar,
            CalibrationParameter::AwayDefenseScalar => self.away_defense_scalar,
        }
    }

    /// Create a modified copy with one parameter replaced
    pub fn with(&self, parameter: CalibrationParameter, value: f64) -> Self {
        let mut params = self.clone();
        let slot = match parameter {
            CalibrationParameter::GlobalScoreMultiplier => &mut params.global_score_multiplier,
            CalibrationParameter::PaceModifier => &mut params.pace_modifier,
            CalibrationParameter::PaceStandardDeviation => &mut params.pace_standard_deviation,
            CalibrationParameter::HomeOffenseScalar => &mut params.home_offense_scalar,
            CalibrationParameter::HomeDefenseScalar => &mut params.home_defense_scalar,
            CalibrationParameter::AwayOffenseScalar => &mut params.away_offense_scalar,
            CalibrationParameter::AwayDefenseScalar => &mut params.away_defense_scalar,
        };
        *slot = value;
        params
    }

    /// Offense and defense scalars for one side of the matchup.
    pub fn side_scalars(&self, is_home: bool) -> (f64, f64) {
        if is_home {
            (self.home_offense_scalar, self.home_defense_scalar)
        } else {
            (self.away_offense_scalar, self.away_defense_scalar)
        }
    }

    /// Name/value pairs for reports.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        CalibrationParameter::ALL
            .iter()
            .map(|&p| (p.as_str().to_string(), self.get(p)))
            .collect()
    }
}

/// Calibration fields that can be swept by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationParameter {
    GlobalScoreMultiplier,
    PaceModifier,
    PaceStandardDeviation,
    HomeOffenseScalar,
    HomeDefenseScalar,
    AwayOffenseScalar,
    AwayDefenseScalar,
}

impl CalibrationParameter {
    pub const ALL: [CalibrationParameter; 7] = [
        CalibrationParameter::GlobalScoreMultiplier,
        CalibrationParameter::PaceModifier,
        CalibrationParameter::PaceStandardDeviation,
        CalibrationParameter::HomeOffenseScalar,
        CalibrationParameter::HomeDefenseScalar,
        CalibrationParameter::AwayOffenseScalar,
        CalibrationParameter::AwayDefenseScalar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationParameter::GlobalScoreMultiplier => "global_score_multiplier",
            CalibrationParameter::PaceModifier => "pace_modifier",
            CalibrationParameter::PaceStandardDeviation => "pace_standard_deviation",
            CalibrationParameter::HomeOffenseScalar => "home_offense_scalar",
            CalibrationParameter::HomeDefenseScalar => "home_defense_scalar",
            CalibrationParameter::AwayOffenseScalar => "away_offense_scalar",
            CalibrationParameter::AwayDefenseScalar => "away_defense_scalar",
        }
    }
}

impl fmt::Display for CalibrationParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalibrationParameter {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalibrationParameter::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| SimError::UnknownParameter(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        let params = CalibrationParams::default();
        assert_eq!(params.side_scalars(true), (1.0, 1.0));
        assert_eq!(params.side_scalars(false), (1.0, 1.0));
        assert_eq!(params.global_score_multiplier, 1.0);
        assert_eq!(params.pace_standard_deviation, 0.0);
    }

    #[test]
    fn test_with_replaces_one_field() {
        let params = CalibrationParams::default().with(CalibrationParameter::HomeOffenseScalar, 1.2);
        assert_eq!(params.home_offense_scalar, 1.2);
        assert_eq!(params.away_offense_scalar, 1.0);
        assert_eq!(params.get(CalibrationParameter::HomeOffenseScalar), 1.2);
    }

    #[test]
    fn test_parameter_names_round_trip() {
        for p in CalibrationParameter::ALL {
            assert_eq!(p.as_str().parse::<CalibrationParameter>().unwrap(), p);
        }
        assert!("tempo".parse::<CalibrationParameter>().is_err());
    }

    #[test]
    fn test_to_map_has_every_field() {
        let map = CalibrationParams::default().to_map();
        assert_eq!(map.len(), 7);
        assert_eq!(map["pace_modifier"], 1.0);
    }
}
