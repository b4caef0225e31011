use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// A named, documented tunable used by the possession model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub name: String,
    pub value: f64,
    pub description: String,
}

impl Assumption {
    pub fn new(name: &str, value: f64, description: &str) -> Self {
        Assumption {
            name: name.to_string(),
            value,
            description: description.to_string(),
        }
    }

    /// Copy of this assumption with a new value, keeping name and description.
    pub fn with_value(&self, value: f64) -> Self {
        Assumption {
            name: self.name.clone(),
            value,
            description: self.description.clone(),
        }
    }
}

/// The seven registry slots, addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionName {
    PossessionLengthDistribution,
    TurnoverRate,
    ShotTypeMix,
    FreeThrowRate,
    OffensiveReboundRate,
    PaceModifier,
    HomeCourtAdvantage,
}

impl AssumptionName {
    pub const ALL: [AssumptionName; 7] = [
        AssumptionName::PossessionLengthDistribution,
        AssumptionName::TurnoverRate,
        AssumptionName::ShotTypeMix,
        AssumptionName::FreeThrowRate,
        AssumptionName::OffensiveReboundRate,
        AssumptionName::PaceModifier,
        AssumptionName::HomeCourtAdvantage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssumptionName::PossessionLengthDistribution => "possession_length_distribution",
            AssumptionName::TurnoverRate => "turnover_rate",
            AssumptionName::ShotTypeMix => "shot_type_mix",
            AssumptionName::FreeThrowRate => "free_throw_rate",
            AssumptionName::OffensiveReboundRate => "offensive_rebound_rate",
            AssumptionName::PaceModifier => "pace_modifier",
            AssumptionName::HomeCourtAdvantage => "home_court_advantage",
        }
    }
}

impl fmt::Display for AssumptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssumptionName {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssumptionName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| SimError::UnknownParameter(s.to_string()))
    }
}

/// Registry of every assumption the engine reads.
///
/// Each slot always holds a valid `Assumption`; overrides go through
/// [`AssumptionRegistry::with_override`], which returns a new registry and
/// leaves the other six slots untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionRegistry {
    /// Possession pace baseline. Carried for reporting; game pace comes from the team profiles.
    pub possession_length_distribution: Assumption,
    pub turnover_rate: Assumption,
    /// Weight of three-point attempts in the shot mix (0.5 = even split)
    pub shot_type_mix: Assumption,
    pub free_throw_rate: Assumption,
    /// Carried for completeness; rebounds never chain into a new possession.
    pub offensive_rebound_rate: Assumption,
    pub pace_modifier: Assumption,
    /// Points of home-court advantage, split between offense and defense
    pub home_court_advantage: Assumption,
}

impl Default for AssumptionRegistry {
    fn default() -> Self {
        AssumptionRegistry {
            possession_length_distribution: Assumption::new(
                "possession_length_distribution",
                10.0,
                "Distribution of time per possession.",
            ),
            turnover_rate: Assumption::new(
                "turnover_rate",
                0.1,
                "Probability of a turnover on a given possession.",
            ),
            shot_type_mix: Assumption::new("shot_type_mix", 0.5, "Mix of 2-point vs 3-point shots."),
            free_throw_rate: Assumption::new(
                "free_throw_rate",
                0.2,
                "Rate at which free throws are awarded.",
            ),
            offensive_rebound_rate: Assumption::new(
                "offensive_rebound_rate",
                0.2,
                "Probability of securing an offensive rebound.",
            ),
            pace_modifier: Assumption::new(
                "pace_modifier",
                1.0,
                "Multiplier to adjust the pace of the game.",
            ),
            home_court_advantage: Assumption::new(
                "home_court_advantage",
                3.5,
                "Points awarded to the home team.",
            ),
        }
    }
}

impl AssumptionRegistry {
    pub fn get(&self, name: AssumptionName) -> &Assumption {
        match name {
            AssumptionName::PossessionLengthDistribution => &self.possession_length_distribution,
            AssumptionName::TurnoverRate => &self.turnover_rate,
            AssumptionName::ShotTypeMix => &self.shot_type_mix,
            AssumptionName::FreeThrowRate => &self.free_throw_rate,
            AssumptionName::OffensiveReboundRate => &self.offensive_rebound_rate,
            AssumptionName::PaceModifier => &self.pace_modifier,
            AssumptionName::HomeCourtAdvantage => &self.home_court_advantage,
        }
    }

    fn slot_mut(&mut self, name: AssumptionName) -> &mut Assumption {
        match name {
            AssumptionName::PossessionLengthDistribution => &mut self.possession_length_distribution,
            AssumptionName::TurnoverRate => &mut self.turnover_rate,
            AssumptionName::ShotTypeMix => &mut self.shot_type_mix,
            AssumptionName::FreeThrowRate => &mut self.free_throw_rate,
            AssumptionName::OffensiveReboundRate => &mut self.offensive_rebound_rate,
            AssumptionName::PaceModifier => &mut self.pace_modifier,
            AssumptionName::HomeCourtAdvantage => &mut self.home_court_advantage,
        }
    }

    pub fn value(&self, name: AssumptionName) -> f64 {
        self.get(name).value
    }

    /// Create a modified copy with one assumption's value replaced
    pub fn with_override(&self, name: AssumptionName, value: f64) -> Self {
        let mut registry = self.clone();
        let slot = registry.slot_mut(name);
        *slot = slot.with_value(value);
        registry
    }

    /// Create a modified copy with one assumption scaled by `(1 + perturbation)`
    pub fn with_perturbation(&self, name: AssumptionName, perturbation: f64) -> Self {
        self.with_override(name, self.value(name) * (1.0 + perturbation))
    }

    /// All assumptions in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Assumption> {
        AssumptionName::ALL.iter().map(move |&name| self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_named_after_their_slot() {
        let registry = AssumptionRegistry::default();
        for name in AssumptionName::ALL {
            assert_eq!(registry.get(name).name, name.as_str());
        }
    }

    #[test]
    fn test_override_preserves_other_slots() {
        let registry = AssumptionRegistry::default();
        let modified = registry.with_override(AssumptionName::TurnoverRate, 0.25);

        assert!((modified.turnover_rate.value - 0.25).abs() < 1e-12);
        assert_eq!(modified.turnover_rate.description, registry.turnover_rate.description);
        for name in AssumptionName::ALL {
            if name != AssumptionName::TurnoverRate {
                assert_eq!(modified.get(name), registry.get(name));
            }
        }
        // Original is untouched
        assert!((registry.turnover_rate.value - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_perturbation_is_relative() {
        let registry = AssumptionRegistry::default();
        let modified = registry.with_perturbation(AssumptionName::HomeCourtAdvantage, 0.2);
        assert!((modified.home_court_advantage.value - 4.2).abs() < 1e-12);
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!("shot_type_mix".parse::<AssumptionName>().unwrap(), AssumptionName::ShotTypeMix);
        assert!(matches!(
            "rebound_chaining".parse::<AssumptionName>(),
            Err(SimError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let registry: AssumptionRegistry = toml::from_str(
            r#"
            [turnover_rate]
            name = "turnover_rate"
            value = 0.14
            description = "League turnover rate."
            "#,
        )
        .unwrap();
        assert!((registry.turnover_rate.value - 0.14).abs() < 1e-12);
        assert_eq!(registry.shot_type_mix, AssumptionRegistry::default().shot_type_mix);
    }
}
