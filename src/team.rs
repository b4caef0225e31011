use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Season profile of a team, as supplied by the data layer.
///
/// Ratings are raw points per 100 possessions (e.g. 115.4), not relative
/// efficiencies. The engine never mutates a shared profile; home-court and
/// calibration adjustments produce simulation-local copies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub abbreviation: String,

    #[serde(default)]
    pub name: String,

    /// Expected possessions per game
    pub pace: f64,

    /// Points scored per 100 possessions
    pub off_rating: f64,

    /// Points allowed per 100 possessions (lower is better)
    pub def_rating: f64,

    /// Effective field-goal percentage
    #[serde(default)]
    pub efg_pct: f64,

    /// Share of field-goal attempts taken from three
    pub three_pt_rate: f64,

    /// Free-throw attempts per field-goal attempt
    pub ft_rate: f64,

    #[serde(default)]
    pub games_played: u32,

    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub losses: u32,
}

impl TeamProfile {
    pub fn new(
        abbreviation: &str,
        pace: f64,
        off_rating: f64,
        def_rating: f64,
        three_pt_rate: f64,
        ft_rate: f64,
    ) -> Self {
        TeamProfile {
            abbreviation: abbreviation.to_string(),
            name: abbreviation.to_string(),
            pace,
            off_rating,
            def_rating,
            efg_pct: 0.0,
            three_pt_rate,
            ft_rate,
            games_played: 0,
            wins: 0,
            losses: 0,
        }
    }

    /// Copy with home-court points split evenly: half added to offense,
    /// half taken off the defensive rating.
    pub fn with_home_court(&self, points: f64) -> Self {
        let half = points / 2.0;
        TeamProfile {
            off_rating: self.off_rating + half,
            def_rating: self.def_rating - half,
            ..self.clone()
        }
    }

    /// Copy with the defensive rating scaled
    pub fn with_defense_scalar(&self, scalar: f64) -> Self {
        TeamProfile {
            def_rating: self.def_rating * scalar,
            ..self.clone()
        }
    }
}

/// Abbreviation -> profile lookup supplied by the data layer.
pub trait TeamLookup {
    fn team(&self, abbreviation: &str) -> Option<&TeamProfile>;
}

impl TeamLookup for HashMap<String, TeamProfile> {
    fn team(&self, abbreviation: &str) -> Option<&TeamProfile> {
        self.get(abbreviation)
    }
}

impl TeamLookup for BTreeMap<String, TeamProfile> {
    fn team(&self, abbreviation: &str) -> Option<&TeamProfile> {
        self.get(abbreviation)
    }
}

impl TeamLookup for [TeamProfile] {
    fn team(&self, abbreviation: &str) -> Option<&TeamProfile> {
        self.iter().find(|t| t.abbreviation == abbreviation)
    }
}

impl TeamLookup for Vec<TeamProfile> {
    fn team(&self, abbreviation: &str) -> Option<&TeamProfile> {
        self.as_slice().team(abbreviation)
    }
}

/// Index a list of profiles by abbreviation
pub fn index_by_abbreviation(teams: impl IntoIterator<Item = TeamProfile>) -> HashMap<String, TeamProfile> {
    teams
        .into_iter()
        .map(|t| (t.abbreviation.clone(), t))
        .collect()
}

/// Small built-in league used for smoke runs and examples.
pub fn sample_league() -> HashMap<String, TeamProfile> {
    let mut lal = TeamProfile::new("LAL", 101.2, 115.4, 114.8, 0.35, 0.25);
    lal.name = "Los Angeles Lakers".to_string();
    lal.efg_pct = 0.54;

    let mut bos = TeamProfile::new("BOS", 98.5, 122.2, 110.6, 0.45, 0.20);
    bos.name = "Boston Celtics".to_string();
    bos.efg_pct = 0.57;

    let mut gsw = TeamProfile::new("GSW", 102.5, 117.0, 115.0, 0.48, 0.18);
    gsw.name = "Golden State Warriors".to_string();
    gsw.efg_pct = 0.56;

    index_by_abbreviation([lal, bos, gsw])
}
