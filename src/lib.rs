//! Hoopsim Core - Monte Carlo basketball game simulation.
//!
//! Games are played possession by possession against team season profiles,
//! batches are reduced to win probabilities and score statistics, and the
//! engine can be tuned against historical league targets. Python bindings
//! via PyO3 are available behind the `python` feature.

pub mod assumptions;
pub mod calibration;
pub mod calibrator;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod metrics;
pub mod possession;
pub mod sensitivity;
pub mod simulation;
pub mod targets;
pub mod team;

#[cfg(feature = "python")]
mod python;

pub use assumptions::{Assumption, AssumptionName, AssumptionRegistry};
pub use calibration::{CalibrationParameter, CalibrationParams};
pub use calibrator::{CalibrationReport, CalibrationSettings, Calibrator, Matchup};
pub use config::{validate_num_simulations, SimulationConfig};
pub use error::{Result, SimError};
pub use game::{simulate_game, GameResult, PossessionRecord, Side, Winner};
pub use metrics::{analyze, SimulationMetrics};
pub use possession::{
    HeuristicModel, OutcomeProbabilities, PossessionContext, PossessionModel, PossessionOutcome,
};
pub use sensitivity::{model_disagreement, Scenario, SensitivityAnalysis, SensitivityResult};
pub use simulation::{FinalScore, HistoricalGame, ReplayRow, ReplaySummary, Simulation};
pub use targets::{compare_to_targets, default_targets, CalibrationSummary, CalibrationTarget, TargetComparison};
pub use team::{TeamLookup, TeamProfile};
