use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashMap;

use crate::config::SimulationConfig;
use crate::constants::{DEFAULT_NUM_SIMULATIONS, DEFAULT_SEED, LEAGUE_AVG_OFF_RATING, MAX_SIMULATIONS};
use crate::error::SimError;
use crate::metrics::SimulationMetrics;
use crate::simulation::Simulation;
use crate::team::{index_by_abbreviation, TeamProfile};

impl From<SimError> for PyErr {
    fn from(err: SimError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Team season profile as seen from Python.
#[pyclass(name = "TeamProfile")]
#[derive(Clone, Debug)]
pub struct PyTeamProfile {
    inner: TeamProfile,
}

#[pymethods]
impl PyTeamProfile {
    #[new]
    #[pyo3(signature = (abbreviation, pace, off_rating, def_rating, three_pt_rate, ft_rate, name = None))]
    fn new(
        abbreviation: &str,
        pace: f64,
        off_rating: f64,
        def_rating: f64,
        three_pt_rate: f64,
        ft_rate: f64,
        name: Option<String>,
    ) -> Self {
        let mut inner = TeamProfile::new(abbreviation, pace, off_rating, def_rating, three_pt_rate, ft_rate);
        if let Some(name) = name {
            inner.name = name;
        }
        PyTeamProfile { inner }
    }

    #[getter]
    fn abbreviation(&self) -> &str {
        &self.inner.abbreviation
    }

    #[getter]
    fn name(&self) -> &str {
        &self.inner.name
    }

    #[getter]
    fn pace(&self) -> f64 {
        self.inner.pace
    }

    #[getter]
    fn off_rating(&self) -> f64 {
        self.inner.off_rating
    }

    #[getter]
    fn def_rating(&self) -> f64 {
        self.inner.def_rating
    }

    fn __repr__(&self) -> String {
        format!(
            "TeamProfile({:?}, pace={}, off={}, def={})",
            self.inner.abbreviation, self.inner.pace, self.inner.off_rating, self.inner.def_rating
        )
    }
}

fn metrics_to_dict<'py>(py: Python<'py>, m: &SimulationMetrics) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("num_simulations", m.num_simulations)?;
    dict.set_item("home_win_probability", m.win_probability.home)?;
    dict.set_item("away_win_probability", m.win_probability.away)?;
    dict.set_item("draw_probability", m.win_probability.draw)?;
    dict.set_item("expected_home_score", m.expected_scores.home)?;
    dict.set_item("expected_away_score", m.expected_scores.away)?;
    dict.set_item("expected_total_points", m.expected_total_points)?;
    dict.set_item("total_points_std_dev", m.total_points_std_dev)?;
    dict.set_item("expected_margin", m.expected_margin)?;
    dict.set_item("win_margin_distribution", m.win_margin_distribution.clone())?;
    if !m.margin_distribution.is_empty() {
        dict.set_item("margin_distribution", m.margin_distribution.clone())?;
    }
    if let Some(d) = &m.score_distributions {
        dict.set_item("home_scores", d.home.clone())?;
        dict.set_item("away_scores", d.away.clone())?;
    }
    Ok(dict)
}

/// Simulate `num_simulations` games between two of `teams` and return the metrics as a dict.
///
/// `seed=None` draws the batch seed from entropy.
#[pyfunction]
#[pyo3(signature = (
    teams,
    home,
    away,
    num_simulations = DEFAULT_NUM_SIMULATIONS,
    seed = Some(DEFAULT_SEED),
    want_distributions = false
))]
fn run_simulation<'py>(
    py: Python<'py>,
    teams: Vec<PyTeamProfile>,
    home: &str,
    away: &str,
    num_simulations: usize,
    seed: Option<u64>,
    want_distributions: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let teams: HashMap<String, TeamProfile> = index_by_abbreviation(teams.into_iter().map(|t| t.inner));
    let sim = Simulation::new(teams);
    let config = SimulationConfig::default().with_seed(seed);
    let metrics =
        py.allow_threads(|| sim.run_simulation_with_config(home, away, num_simulations, &config, want_distributions))?;
    metrics_to_dict(py, &metrics)
}

#[pymodule]
fn hoopsim_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTeamProfile>()?;
    m.add_function(wrap_pyfunction!(run_simulation, m)?)?;

    m.add("LEAGUE_AVG_OFF_RATING", LEAGUE_AVG_OFF_RATING)?;
    m.add("MAX_SIMULATIONS", MAX_SIMULATIONS)?;

    Ok(())
}
