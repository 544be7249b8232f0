// src/config.rs
//! Station configuration, loaded once at startup.
//!
//! Any load failure is absorbed: the daemon logs and runs with a single
//! hardcoded default station, because a broken config file must never
//! keep the display dark.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::feed::types::ServiceCategory;

const ENV_PATH: &str = "STATIONS_PATH";
const DEFAULT_PATH: &str = "config/stations.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Station {
    pub name: String,
    #[serde(rename = "id")]
    pub stop_id: u64,
    /// Transit categories to request for this station.
    pub categories: Vec<ServiceCategory>,
}

#[derive(Debug, Deserialize)]
struct StationsFile {
    stations: Vec<Station>,
}

pub fn default_station() -> Station {
    Station {
        name: "Zoologischer Garten".to_string(),
        stop_id: 900_023_201,
        categories: vec![ServiceCategory::Bus],
    }
}

/// Load stations from an explicit TOML path.
pub fn load_stations_from(path: &Path) -> Result<Vec<Station>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let parsed: StationsFile = toml::from_str(&content)?;
    if parsed.stations.is_empty() {
        return Err(ConfigError::NoStations);
    }
    Ok(parsed.stations)
}

/// Load stations using `$STATIONS_PATH`, then `config/stations.toml`.
/// Every failure is absorbed into the default station.
pub fn load_stations() -> Vec<Station> {
    let path = std::env::var(ENV_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATH));
    match load_stations_from(&path) {
        Ok(stations) => stations,
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to load station config, using default station"
            );
            vec![default_station()]
        }
    }
}
