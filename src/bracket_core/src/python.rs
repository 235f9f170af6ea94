//! Python bindings, built with the `python` feature.

use std::str::FromStr;
use std::sync::Arc;

use pyo3::exceptions::{PyFileNotFoundError, PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::bracket::{Bracket, ScoringOptions};
use crate::constants::{MAX_SCORE, ROUND_POINTS};
use crate::error::Error;
use crate::picker::{Chalk, Simulated};
use crate::store::{self, TeamFilter};
use crate::team::{Region, Team};
use crate::topology::DEFAULT_TOPOLOGY;
use crate::win_prob::calculate_win_prob;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        match err {
            Error::FileNotFound(_) => PyFileNotFoundError::new_err(err.to_string()),
            Error::Io { .. } => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

#[pyclass(name = "Team")]
#[derive(Clone, Debug)]
pub struct PyTeam {
    inner: Team,
}

#[pymethods]
impl PyTeam {
    #[new]
    #[pyo3(signature = (id, name, rating, seed, region, playin_id = None))]
    fn new(
        id: u32,
        name: String,
        rating: f64,
        seed: u8,
        region: &str,
        playin_id: Option<u32>,
    ) -> PyResult<Self> {
        let region = Region::from_str(region)
            .map_err(|_| PyValueError::new_err(format!("unknown region: {}", region)))?;
        Ok(PyTeam {
            inner: Team::entrant(id, name, rating, seed, region, playin_id),
        })
    }

    #[getter]
    fn id(&self) -> u32 {
        self.inner.id
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    #[getter]
    fn rating(&self) -> f64 {
        self.inner.rating
    }

    #[getter]
    fn seed(&self) -> u8 {
        self.inner.seed
    }

    #[getter]
    fn region(&self) -> String {
        self.inner.region.to_string()
    }

    #[getter]
    fn is_playin(&self) -> bool {
        self.inner.is_playin
    }

    #[getter]
    fn playin_id(&self) -> Option<u32> {
        self.inner.playin_id
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "Team({}, {:?}, {}, {}, {:?})",
            self.inner.id,
            self.inner.name,
            self.inner.rating,
            self.inner.seed_label(),
            self.inner.region.to_string()
        )
    }
}

/// A 67-game bracket on the standard NCAA layout.
#[pyclass(name = "Bracket")]
#[derive(Clone, Debug)]
pub struct PyBracket {
    inner: Bracket,
}

#[pymethods]
impl PyBracket {
    #[new]
    fn new(teams: Vec<PyTeam>) -> PyResult<Self> {
        let teams = teams.into_iter().map(|t| t.inner).collect();
        Ok(PyBracket {
            inner: Bracket::new(teams)?,
        })
    }

    /// Resolve every open game for the better seed. Returns the champion.
    fn play_chalk(&mut self) -> PyResult<PyTeam> {
        let champion = self.inner.play(&mut Chalk)?;
        Ok(PyTeam {
            inner: champion.clone(),
        })
    }

    /// Resolve every open game by weighted coin flip. Returns the champion.
    #[pyo3(signature = (seed = None))]
    fn play_simulated(&mut self, seed: Option<u64>) -> PyResult<PyTeam> {
        let champion = self.inner.play(&mut Simulated::from_seed(seed))?;
        Ok(PyTeam {
            inner: champion.clone(),
        })
    }

    #[pyo3(signature = (reference, forgive_playin = true))]
    fn score(&self, reference: &PyBracket, forgive_playin: bool) -> u32 {
        self.inner.score(&reference.inner, &ScoringOptions { forgive_playin })
    }

    fn save(&self, path: &str) -> PyResult<()> {
        store::save(&self.inner, path)?;
        Ok(())
    }

    #[staticmethod]
    fn load(path: &str) -> PyResult<Self> {
        Ok(PyBracket {
            inner: store::load(path, Arc::clone(&DEFAULT_TOPOLOGY))?,
        })
    }

    fn render(&self) -> String {
        self.inner.to_string()
    }

    fn diff(&self, other: &PyBracket) -> String {
        self.inner.diff(&other.inner)
    }

    #[getter]
    fn champion(&self) -> Option<PyTeam> {
        self.inner.champion().map(|t| PyTeam { inner: t.clone() })
    }

    #[getter]
    fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __eq__(&self, other: &PyBracket) -> bool {
        self.inner == other.inner
    }
}

/// Read the field from a forecast table.
#[pyfunction]
#[pyo3(signature = (path, gender = "mens", forecast_date = None))]
fn read_teams(path: &str, gender: &str, forecast_date: Option<String>) -> PyResult<Vec<PyTeam>> {
    let filter = TeamFilter {
        gender: gender.to_string(),
        forecast_date,
    };
    let teams = store::read_teams(path, &filter)?;
    Ok(teams.into_iter().map(|inner| PyTeam { inner }).collect())
}

#[pyfunction]
fn win_probability(team1: &PyTeam, team2: &PyTeam) -> f64 {
    calculate_win_prob(&team1.inner, &team2.inner)
}

/// Python module definition
#[pymodule]
fn bracket_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTeam>()?;
    m.add_class::<PyBracket>()?;

    m.add_function(wrap_pyfunction!(read_teams, m)?)?;
    m.add_function(wrap_pyfunction!(win_probability, m)?)?;

    m.add("ROUND_POINTS", ROUND_POINTS.to_vec())?;
    m.add("MAX_SCORE", MAX_SCORE)?;

    Ok(())
}
