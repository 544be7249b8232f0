// src/feed/transit.rs
//! BVG `transport.rest` departures adapter.
//!
//! Each configured station is fetched on its own transient task, retried
//! until it yields a non-empty list, then the per-station results are
//! merged and sorted into one board. An empty result is an error, never a
//! valid fetch: a transient empty response from the upstream must not be
//! able to blank a currently-displayed board.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use metrics::counter;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::debug;

use crate::config::Station;
use crate::error::FetchError;
use crate::feed::types::{Departure, ServiceCategory, TripSource};
use crate::retry::fetch_until_success;

const API_BASE: &str = "https://v6.bvg.transport.rest";
/// How far ahead to ask for departures, in minutes.
const LOOKAHEAD_MINUTES: u32 = 600;
const MAX_RESULTS: u32 = 12;
const STATION_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct DeparturesResponse {
    departures: Vec<WireDeparture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDeparture {
    trip_id: String,
    line: WireLine,
    destination: WireDestination,
    when: Option<String>,
    /// Delay in seconds, absent when the upstream has no realtime data.
    #[serde(default)]
    delay: Option<i64>,
    #[serde(default)]
    cancelled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct WireLine {
    name: String,
    product: String,
}

#[derive(Debug, Deserialize)]
struct WireDestination {
    name: String,
}

fn departure_from_wire(wire: WireDeparture) -> Option<Departure> {
    if wire.cancelled == Some(true) {
        return None;
    }
    let when_raw = wire.when?;
    let when = DateTime::parse_from_rfc3339(&when_raw)
        .ok()?
        .format("%H:%M")
        .to_string();
    let Some(category) = ServiceCategory::parse(&wire.line.product) else {
        debug!(product = %wire.line.product, "skipping departure with unknown product");
        return None;
    };

    let mut destination = wire
        .destination
        .name
        .replace("(Berlin)", "")
        .trim()
        .to_string();
    // ring line direction markers
    match wire.line.name.as_str() {
        "S41" => destination = format!("\u{27f3} {destination}"),
        "S42" => destination = format!("\u{27f2} {destination}"),
        _ => {}
    }

    Some(Departure {
        trip_id: wire.trip_id,
        line: wire.line.name,
        destination,
        when,
        delay_minutes: (wire.delay.unwrap_or(0) / 60) as i32,
        category,
    })
}

/// Parse one station's response body. Duplicate departures (same identity,
/// possibly different trip ids) collapse to the first occurrence.
fn parse_departures(station_name: &str, body: &str) -> Result<Vec<Departure>, FetchError> {
    let resp: DeparturesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::payload(station_name, e))?;

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(resp.departures.len());
    for wire in resp.departures {
        if let Some(dep) = departure_from_wire(wire) {
            if seen.insert(dep.identity()) {
                out.push(dep);
            }
        }
    }
    out.sort_by(|a, b| a.when.cmp(&b.when));

    if out.is_empty() {
        return Err(FetchError::empty(station_name));
    }
    counter!("feed_departures_parsed_total").increment(out.len() as u64);
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct BvgTripSource {
    client: reqwest::Client,
    base_url: String,
    stations: Vec<Station>,
    station_retry_delay: Duration,
}

impl BvgTripSource {
    pub fn new(stations: Vec<Station>) -> Self {
        Self::with_base_url(API_BASE, stations)
    }

    /// Point the adapter at a different endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>, stations: Vec<Station>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            stations,
            station_retry_delay: STATION_RETRY_DELAY,
        }
    }

    async fn fetch_station(&self, station: &Station) -> Result<Vec<Departure>, FetchError> {
        let url = format!("{}/stops/{}/departures", self.base_url, station.stop_id);

        let mut query: Vec<(&str, String)> = vec![
            ("when", "now".to_string()),
            ("duration", LOOKAHEAD_MINUTES.to_string()),
            ("results", MAX_RESULTS.to_string()),
            ("linesOfStops", "false".to_string()),
            ("remarks", "true".to_string()),
            ("language", "de".to_string()),
        ];
        for category in ServiceCategory::ALL {
            query.push((
                category.as_str(),
                station.categories.contains(&category).to_string(),
            ));
        }

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        let body = resp.text().await?;
        parse_departures(&station.name, &body)
    }
}

#[async_trait]
impl TripSource for BvgTripSource {
    /// Fetch every configured station concurrently, each on a transient
    /// task that retries until it produces departures. Tasks are joined
    /// before this returns.
    async fn fetch_departures(&self) -> Result<Vec<Departure>, FetchError> {
        let mut set = JoinSet::new();
        for station in self.stations.clone() {
            let this = self.clone();
            set.spawn(async move {
                fetch_until_success(&station.name, this.station_retry_delay, || {
                    this.fetch_station(&station)
                })
                .await
            });
        }

        let mut merged = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(mut departures) => merged.append(&mut departures),
                Err(e) => tracing::error!(error = %e, "station fetch task failed"),
            }
        }
        merged.sort_by(|a, b| a.when.cmp(&b.when));

        if merged.is_empty() {
            return Err(FetchError::empty("departure board"));
        }
        Ok(merged)
    }
}
