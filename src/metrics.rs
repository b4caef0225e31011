//! Reduction of a Monte Carlo batch into summary statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{MARGIN_HISTOGRAM_MAX, MARGIN_HISTOGRAM_MIN};
use crate::error::{Result, SimError};
use crate::game::{GameResult, Winner};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub home: f64,
    pub away: f64,
    pub draw: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectedScores {
    pub home: f64,
    pub away: f64,
}

/// A statistic computed separately for home, away and total scores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreMoments {
    pub home: f64,
    pub away: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistributions {
    pub home: Vec<u32>,
    pub away: Vec<u32>,
}

/// Summary of a batch of simulated games.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub num_simulations: usize,
    pub win_probability: WinProbability,
    pub expected_scores: ExpectedScores,
    pub expected_total_points: f64,
    pub total_points_std_dev: f64,
    pub expected_margin: f64,
    /// Population variance
    pub score_variance: ScoreMoments,
    /// Raw per-game margins; empty unless distributions were requested
    pub margin_distribution: Vec<i64>,
    /// Counts per integer margin in `[-50, 50]`, every bin present
    pub win_margin_distribution: BTreeMap<i32, u32>,
    /// Games whose margin fell outside the histogram range
    pub margins_outside_histogram: u32,
    pub score_skewness: Option<ScoreMoments>,
    /// Excess (Fisher) kurtosis
    pub score_kurtosis: Option<ScoreMoments>,
    pub score_distributions: Option<ScoreDistributions>,
}

impl SimulationMetrics {
    /// Rebuild game-level results from the stored score distributions.
    pub fn reconstruct_results(&self) -> Option<Vec<GameResult>> {
        self.score_distributions.as_ref().map(|d| {
            d.home
                .iter()
                .zip(&d.away)
                .map(|(&h, &a)| GameResult::from_scores(h, a))
                .collect()
        })
    }
}

/// Welford accumulator for mean and population variance.
#[derive(Clone, Copy, Debug, Default)]
struct RunningMoments {
    n: u64,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn population_variance(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.m2 / self.n as f64
        }
    }
}

/// Biased sample skewness and excess kurtosis.
///
/// A constant sample has neither; both come back as 0.0.
fn shape_moments(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &x in values {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 <= 0.0 {
        return (0.0, 0.0);
    }
    (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}

fn empty_histogram() -> BTreeMap<i32, u32> {
    (MARGIN_HISTOGRAM_MIN..=MARGIN_HISTOGRAM_MAX).map(|m| (m, 0)).collect()
}

/// Reduce a batch of game results to [`SimulationMetrics`].
///
/// Pure function of `results`: identical input yields bit-identical output.
pub fn analyze(results: &[GameResult], want_distributions: bool) -> Result<SimulationMetrics> {
    if results.is_empty() {
        return Err(SimError::EmptyBatch);
    }
    let n = results.len();

    let mut home_wins = 0usize;
    let mut away_wins = 0usize;
    let mut draws = 0usize;
    let mut home = RunningMoments::default();
    let mut away = RunningMoments::default();
    let mut total = RunningMoments::default();
    let mut margin = RunningMoments::default();
    let mut histogram = empty_histogram();
    let mut outside = 0u32;

    for r in results {
        match r.winner {
            Winner::Home => home_wins += 1,
            Winner::Away => away_wins += 1,
            Winner::Draw => draws += 1,
        }
        home.push(f64::from(r.home_score));
        away.push(f64::from(r.away_score));
        total.push(f64::from(r.total_points));

        let m = r.margin();
        margin.push(m as f64);
        match histogram.get_mut(&(m.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)) {
            Some(count) => *count += 1,
            None => outside += 1,
        }
    }

    let mut metrics = SimulationMetrics {
        num_simulations: n,
        win_probability: WinProbability {
            home: home_wins as f64 / n as f64,
            away: away_wins as f64 / n as f64,
            draw: draws as f64 / n as f64,
        },
        expected_scores: ExpectedScores {
            home: home.mean(),
            away: away.mean(),
        },
        expected_total_points: total.mean(),
        total_points_std_dev: total.population_variance().sqrt(),
        expected_margin: margin.mean(),
        score_variance: ScoreMoments {
            home: home.population_variance(),
            away: away.population_variance(),
            total: total.population_variance(),
        },
        margin_distribution: Vec::new(),
        win_margin_distribution: histogram,
        margins_outside_histogram: outside,
        score_skewness: None,
        score_kurtosis: None,
        score_distributions: None,
    };

    if want_distributions {
        let home_scores: Vec<u32> = results.iter().map(|r| r.home_score).collect();
        let away_scores: Vec<u32> = results.iter().map(|r| r.away_score).collect();

        let as_f64 = |v: &[u32]| v.iter().map(|&x| f64::from(x)).collect::<Vec<f64>>();
        let totals: Vec<f64> = results.iter().map(|r| f64::from(r.total_points)).collect();
        let (home_skew, home_kurt) = shape_moments(&as_f64(&home_scores));
        let (away_skew, away_kurt) = shape_moments(&as_f64(&away_scores));
        let (total_skew, total_kurt) = shape_moments(&totals);

        metrics.margin_distribution = results.iter().map(GameResult::margin).collect();
        metrics.score_skewness = Some(ScoreMoments {
            home: home_skew,
            away: away_skew,
            total: total_skew,
        });
        metrics.score_kurtosis = Some(ScoreMoments {
            home: home_kurt,
            away: away_kurt,
            total: total_kurt,
        });
        metrics.score_distributions = Some(ScoreDistributions {
            home: home_scores,
            away: away_scores,
        });
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_results() -> Vec<GameResult> {
        vec![
            GameResult::from_scores(110, 100),
            GameResult::from_scores(95, 105),
            GameResult::from_scores(120, 115),
            GameResult::from_scores(100, 90),
            GameResult::from_scores(102, 108),
        ]
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let results = fixed_results();
        let m1 = analyze(&results, true).unwrap();
        let m2 = analyze(&results, true).unwrap();
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_win_probability_with_draw() {
        let results = vec![
            GameResult::from_scores(1, 0),
            GameResult::from_scores(1, 0),
            GameResult::from_scores(0, 1),
            GameResult::from_scores(1, 1),
        ];
        let metrics = analyze(&results, false).unwrap();
        assert_eq!(metrics.win_probability.home, 0.5);
        assert_eq!(metrics.win_probability.away, 0.25);
        assert_eq!(metrics.win_probability.draw, 0.25);
    }

    #[test]
    fn test_means_and_variance() {
        let metrics = analyze(&fixed_results(), false).unwrap();

        assert!((metrics.expected_scores.home - 105.4).abs() < 1e-9);
        assert!((metrics.expected_scores.away - 103.6).abs() < 1e-9);
        assert!((metrics.expected_total_points - 209.0).abs() < 1e-9);
        assert!((metrics.expected_margin - 1.8).abs() < 1e-9);
        // totals: 210, 200, 235, 190, 210 -> population variance 224
        assert!((metrics.score_variance.total - 224.0).abs() < 1e-9);
        assert!((metrics.total_points_std_dev - 224.0_f64.sqrt()).abs() < 1e-9);
        // home: 110, 95, 120, 100, 102 -> population variance 76.64
        assert!((metrics.score_variance.home - 76.64).abs() < 1e-9);
    }

    #[test]
    fn test_distributions_only_when_requested() {
        let results = fixed_results();
        let lean = analyze(&results, false).unwrap();
        assert!(lean.margin_distribution.is_empty());
        assert!(lean.score_skewness.is_none());
        assert!(lean.score_distributions.is_none());

        let full = analyze(&results, true).unwrap();
        assert_eq!(full.margin_distribution, vec![10, -10, 5, 10, -6]);
        assert_eq!(full.score_distributions.as_ref().unwrap().home.len(), 5);
        assert!(full.score_skewness.is_some());
        assert!(full.score_kurtosis.is_some());
    }

    #[test]
    fn test_histogram_drops_out_of_range_margins() {
        let results = vec![
            GameResult::from_scores(150, 90),
            GameResult::from_scores(100, 100),
            GameResult::from_scores(100, 150),
            GameResult::from_scores(60, 110),
        ];
        let metrics = analyze(&results, false).unwrap();

        assert_eq!(metrics.win_margin_distribution.len(), 101);
        assert_eq!(metrics.win_margin_distribution[&0], 1);
        assert_eq!(metrics.win_margin_distribution[&-50], 2);
        assert_eq!(metrics.margins_outside_histogram, 1);
        let binned: u32 = metrics.win_margin_distribution.values().sum();
        assert_eq!(binned + metrics.margins_outside_histogram, 4);
        // Dropped margins still count toward the mean
        assert!((metrics.expected_margin - (60.0 + 0.0 - 50.0 - 50.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_of_symmetric_and_constant_samples() {
        let (skew, _) = shape_moments(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(skew.abs() < 1e-12);
        // Uniform five-point sample: m4/m2^2 = 6.8/4 = 1.7
        let (_, kurt) = shape_moments(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((kurt - (1.7 - 3.0)).abs() < 1e-12);

        assert_eq!(shape_moments(&[7.0, 7.0, 7.0]), (0.0, 0.0));
    }

    #[test]
    fn test_right_skew_is_positive() {
        let (skew, _) = shape_moments(&[1.0, 1.0, 1.0, 1.0, 10.0]);
        assert!(skew > 0.0);
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        assert_eq!(analyze(&[], false), Err(SimError::EmptyBatch));
    }

    #[test]
    fn test_reconstruct_results() {
        let metrics = analyze(&fixed_results(), true).unwrap();
        let rebuilt = metrics.reconstruct_results().unwrap();
        assert_eq!(rebuilt, fixed_results());
        assert!(analyze(&fixed_results(), false).unwrap().reconstruct_results().is_none());
    }
}
