use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SimError};
use crate::game::{GameResult, Winner};

pub const AVERAGE_TOTAL_POINTS: &str = "average_total_points";
pub const HOME_WIN_RATE: &str = "home_win_rate";
pub const MARGIN_OF_VICTORY_STDDEV: &str = "margin_of_victory_stddev";

/// Historical ground truth for one metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTarget {
    pub historical_value: f64,
    pub tolerance: f64,
}

impl CalibrationTarget {
    pub fn new(historical_value: f64, tolerance: f64) -> Self {
        CalibrationTarget {
            historical_value,
            tolerance,
        }
    }
}

/// League-level targets: scoring, home edge and spread of victory margins.
pub fn default_targets() -> BTreeMap<String, CalibrationTarget> {
    let mut targets = BTreeMap::new();
    targets.insert(AVERAGE_TOTAL_POINTS.to_string(), CalibrationTarget::new(224.0, 5.0));
    targets.insert(HOME_WIN_RATE.to_string(), CalibrationTarget::new(0.58, 0.05));
    targets.insert(MARGIN_OF_VICTORY_STDDEV.to_string(), CalibrationTarget::new(12.5, 1.5));
    targets
}

/// Metrics compared against calibration targets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSummary {
    pub average_total_points: f64,
    pub home_win_rate: f64,
    /// Population standard deviation of |home - away|
    pub margin_of_victory_stddev: f64,
}

impl CalibrationSummary {
    pub fn from_results(results: &[GameResult]) -> Result<Self> {
        if results.is_empty() {
            return Err(SimError::EmptyBatch);
        }
        let n = results.len() as f64;

        let average_total_points = results.iter().map(|r| f64::from(r.total_points)).sum::<f64>() / n;
        let home_wins = results.iter().filter(|r| r.winner == Winner::Home).count();

        let abs_margins: Vec<f64> = results.iter().map(|r| r.margin().abs() as f64).collect();
        let mean_abs = abs_margins.iter().sum::<f64>() / n;
        let var = abs_margins.iter().map(|m| (m - mean_abs).powi(2)).sum::<f64>() / n;

        Ok(CalibrationSummary {
            average_total_points,
            home_win_rate: home_wins as f64 / n,
            margin_of_victory_stddev: var.sqrt(),
        })
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            AVERAGE_TOTAL_POINTS => Some(self.average_total_points),
            HOME_WIN_RATE => Some(self.home_win_rate),
            MARGIN_OF_VICTORY_STDDEV => Some(self.margin_of_victory_stddev),
            _ => None,
        }
    }
}

/// Simulated value of one metric next to its target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetComparison {
    pub simulated: f64,
    pub target: f64,
    /// simulated - target
    pub error: f64,
    pub tolerance: f64,
    pub within_tolerance: bool,
}

/// Compare each targeted metric; metrics the summary does not know read as 0.0.
pub fn compare_to_targets(
    summary: &CalibrationSummary,
    targets: &BTreeMap<String, CalibrationTarget>,
) -> BTreeMap<String, TargetComparison> {
    targets
        .iter()
        .map(|(name, target)| {
            let simulated = summary.metric(name).unwrap_or(0.0);
            let error = simulated - target.historical_value;
            (
                name.clone(),
                TargetComparison {
                    simulated,
                    target: target.historical_value,
                    error,
                    tolerance: target.tolerance,
                    within_tolerance: error.abs() <= target.tolerance,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_results() {
        let results = vec![
            GameResult::from_scores(110, 100),
            GameResult::from_scores(100, 110),
            GameResult::from_scores(120, 100),
            GameResult::from_scores(105, 105),
        ];
        let summary = CalibrationSummary::from_results(&results).unwrap();

        assert!((summary.average_total_points - 212.5).abs() < 1e-12);
        assert!((summary.home_win_rate - 0.5).abs() < 1e-12);
        // |margins| = 10, 10, 20, 0 -> mean 10, variance 50
        assert!((summary.margin_of_victory_stddev - 50.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_compare_to_targets() {
        let summary = CalibrationSummary {
            average_total_points: 220.0,
            home_win_rate: 0.70,
            margin_of_victory_stddev: 12.5,
        };
        let comparison = compare_to_targets(&summary, &default_targets());

        assert_eq!(comparison.len(), 3);
        let total = &comparison[AVERAGE_TOTAL_POINTS];
        assert!((total.error + 4.0).abs() < 1e-12);
        assert!(total.within_tolerance);
        assert!(!comparison[HOME_WIN_RATE].within_tolerance);
        assert!(comparison[MARGIN_OF_VICTORY_STDDEV].error.abs() < 1e-12);
    }

    #[test]
    fn test_unknown_target_reads_zero() {
        let summary = CalibrationSummary {
            average_total_points: 200.0,
            home_win_rate: 0.5,
            margin_of_victory_stddev: 10.0,
        };
        let mut targets = BTreeMap::new();
        targets.insert("three_point_share".to_string(), CalibrationTarget::new(0.4, 0.05));

        let comparison = compare_to_targets(&summary, &targets);
        assert_eq!(comparison["three_point_share"].simulated, 0.0);
        assert!(!comparison["three_point_share"].within_tolerance);
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(CalibrationSummary::from_results(&[]), Err(SimError::EmptyBatch));
    }
}
