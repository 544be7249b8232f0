// src/feed/weather.rs
//! Open-Meteo forecast adapter.
//!
//! One request per cycle: current temperature and UV index plus the daily
//! min/max aggregates. The server's `current.time` field is kept verbatim
//! (naive local time) because the weather loop schedules its next fetch
//! from it.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::info;

use crate::error::FetchError;
use crate::feed::types::{WeatherReading, WeatherSource};

const API_URL: &str = "https://api.open-meteo.com/v1/forecast";

// display site: Berlin Charlottenburg
const LATITUDE: f64 = 52.51356805426098;
const LONGITUDE: f64 = 13.32652568167527;
const TIMEZONE: &str = "Europe/Berlin";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: WireCurrent,
    daily: WireDaily,
}

#[derive(Debug, Deserialize)]
struct WireCurrent {
    time: String,
    temperature_2m: f64,
    uv_index: f64,
}

#[derive(Debug, Deserialize)]
struct WireDaily {
    temperature_2m_min: Vec<f64>,
    temperature_2m_max: Vec<f64>,
    uv_index_max: Vec<f64>,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn parse_server_time(s: &str) -> Result<NaiveDateTime, FetchError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| FetchError::payload("weather", format!("bad current.time {s:?}: {e}")))
}

fn reading_from_wire(resp: ForecastResponse) -> Result<WeatherReading, FetchError> {
    fn first(values: &[f64], field: &str) -> Result<f64, FetchError> {
        values
            .first()
            .copied()
            .ok_or_else(|| FetchError::payload("weather", format!("missing daily {field}")))
    }

    Ok(WeatherReading {
        timestamp: parse_server_time(&resp.current.time)?,
        temperature: round1(resp.current.temperature_2m),
        uv_index: round1(resp.current.uv_index),
        temperature_daily_min: round1(first(&resp.daily.temperature_2m_min, "temperature_2m_min")?),
        temperature_daily_max: round1(first(&resp.daily.temperature_2m_max, "temperature_2m_max")?),
        uv_index_daily_max: round1(first(&resp.daily.uv_index_max, "uv_index_max")?),
    })
}

#[derive(Debug, Clone)]
pub struct OpenMeteoWeatherSource {
    client: reqwest::Client,
    url: String,
}

impl OpenMeteoWeatherSource {
    pub fn new() -> Self {
        Self::with_url(API_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for OpenMeteoWeatherSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeatherSource {
    async fn fetch_current(&self) -> Result<WeatherReading, FetchError> {
        let query: [(&str, String); 6] = [
            ("latitude", LATITUDE.to_string()),
            ("longitude", LONGITUDE.to_string()),
            ("timezone", TIMEZONE.to_string()),
            ("current", "temperature_2m,uv_index".to_string()),
            (
                "daily",
                "temperature_2m_min,temperature_2m_max,uv_index_max".to_string(),
            ),
            ("forecast_days", "1".to_string()),
        ];

        let resp = self
            .client
            .get(&self.url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        let body = resp.text().await?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::payload("weather", e))?;

        let reading = reading_from_wire(parsed)?;
        info!(timestamp = %reading.timestamp, "fetched new weather data");
        Ok(reading)
    }
}
