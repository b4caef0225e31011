/// League average offensive rating (points per 100 possessions)
pub const LEAGUE_AVG_OFF_RATING: f64 = 115.0;

/// Smallest batch the request layer accepts
pub const MIN_SIMULATIONS: usize = 1;

/// Largest batch the request layer accepts
pub const MAX_SIMULATIONS: usize = 25_000;

/// Default batch size when a caller does not specify one
pub const DEFAULT_NUM_SIMULATIONS: usize = 500;

/// Default seed for reproducible runs
pub const DEFAULT_SEED: u64 = 42;

/// Standard deviation of the possession count around the expected pace
pub const DEFAULT_PACE_STD_DEV: f64 = 3.0;

/// Lower clamp for possessions per game
pub const DEFAULT_MIN_PACE: u32 = 85;

/// Upper clamp for possessions per game
pub const DEFAULT_MAX_PACE: u32 = 115;

/// Margin histogram covers `[MARGIN_HISTOGRAM_MIN, MARGIN_HISTOGRAM_MAX]` inclusive
pub const MARGIN_HISTOGRAM_MIN: i32 = -50;
pub const MARGIN_HISTOGRAM_MAX: i32 = 50;

/// Replay coverage band on the actual-margin percentile
pub const COVERAGE_LOWER: f64 = 0.05;
pub const COVERAGE_UPPER: f64 = 0.95;
