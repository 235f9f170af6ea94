use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bracket::ScoringOptions;
use crate::constants::DEFAULT_GENDER;
use crate::error::{Error, Result};
use crate::store::TeamFilter;
use crate::topology::{Topology, DEFAULT_TOPOLOGY};

/// Runtime settings, read from a TOML file.
///
/// ```toml
/// [data]
/// teams = "data/2022/fivethirtyeight_ncaa_forecasts.csv"
/// reference = "data/2022/final_bracket_2022.csv"
/// gender = "mens"
///
/// [scoring]
/// forgive_playin = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub scoring: ScoringOptions,
    /// Replaces the built-in NCAA layout when present.
    pub topology: Option<Topology>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Forecast table supplying the field.
    pub teams: PathBuf,
    /// Bracket file with the actual results.
    pub reference: PathBuf,
    pub gender: String,
    pub forecast_date: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            teams: PathBuf::from("data/2022/fivethirtyeight_ncaa_forecasts.csv"),
            reference: PathBuf::from("data/2022/final_bracket_2022.csv"),
            gender: DEFAULT_GENDER.to_string(),
            forecast_date: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        if let Some(topology) = &config.topology {
            topology.validate()?;
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Config::from_toml_str(&text)
    }

    /// Layout to inject into brackets.
    pub fn topology(&self) -> Arc<Topology> {
        match &self.topology {
            Some(topology) => Arc::new(topology.clone()),
            None => Arc::clone(&DEFAULT_TOPOLOGY),
        }
    }

    pub fn team_filter(&self) -> TeamFilter {
        TeamFilter {
            gender: self.data.gender.clone(),
            forecast_date: self.data.forecast_date.clone(),
        }
    }
}
