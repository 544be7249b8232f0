// src/feed/types.rs
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Closed set of transit service categories the upstream reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Suburban,
    Subway,
    Tram,
    Bus,
    Ferry,
    Express,
    Regional,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 7] = [
        ServiceCategory::Suburban,
        ServiceCategory::Subway,
        ServiceCategory::Tram,
        ServiceCategory::Bus,
        ServiceCategory::Ferry,
        ServiceCategory::Express,
        ServiceCategory::Regional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Suburban => "suburban",
            ServiceCategory::Subway => "subway",
            ServiceCategory::Tram => "tram",
            ServiceCategory::Bus => "bus",
            ServiceCategory::Ferry => "ferry",
            ServiceCategory::Express => "express",
            ServiceCategory::Regional => "regional",
        }
    }

    /// Parse the upstream's product string. `None` for anything outside
    /// the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One departure row as displayed on the board.
///
/// `trip_id` is kept for diagnostics but carries no identity: the upstream
/// may reissue a new id for the same physical trip between polls, so
/// identity lives in [`Departure::identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    pub trip_id: String,
    pub line: String,
    pub destination: String,
    /// Departure time as `HH:MM` in the server's local timezone.
    pub when: String,
    /// Signed delay in whole minutes.
    pub delay_minutes: i32,
    pub category: ServiceCategory,
}

/// Comparison key for dedup and change detection. Deliberately excludes
/// `trip_id`; equality and hashing agree by derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepartureKey {
    line: String,
    when: String,
    delay_minutes: i32,
    category: ServiceCategory,
}

impl Departure {
    pub fn identity(&self) -> DepartureKey {
        DepartureKey {
            line: self.line.clone(),
            when: self.when.clone(),
            delay_minutes: self.delay_minutes,
            category: self.category,
        }
    }

    /// Delay as shown on the board: empty when on time, `+n` late, `-n` early.
    pub fn delay_label(&self) -> String {
        match self.delay_minutes {
            0 => String::new(),
            d if d > 0 => format!("+{d}"),
            d => d.to_string(),
        }
    }
}

/// One weather observation with the server's own attribution timestamp.
///
/// The timestamp is naive local time exactly as the upstream reports it,
/// and is authoritative for scheduling the next fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub uv_index: f64,
    pub temperature_daily_min: f64,
    pub temperature_daily_max: f64,
    pub uv_index_daily_max: f64,
}

#[async_trait::async_trait]
pub trait TripSource: Send + Sync {
    /// Fetch the merged departure board across all configured stations.
    /// Must fail on an empty result rather than return an empty list.
    async fn fetch_departures(&self) -> Result<Vec<Departure>, FetchError>;
}

#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(&self) -> Result<WeatherReading, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departure(trip_id: &str, delay: i32) -> Departure {
        Departure {
            trip_id: trip_id.to_string(),
            line: "M41".into(),
            destination: "Hauptbahnhof".into(),
            when: "10:00".into(),
            delay_minutes: delay,
            category: ServiceCategory::Bus,
        }
    }

    #[test]
    fn identity_ignores_trip_id() {
        let a = departure("trip-1", 0);
        let b = departure("trip-2", 0);
        assert_ne!(a, b);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn identity_tracks_delay() {
        let a = departure("trip-1", 0);
        let b = departure("trip-1", 2);
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn delay_label_signs() {
        assert_eq!(departure("t", 0).delay_label(), "");
        assert_eq!(departure("t", 3).delay_label(), "+3");
        assert_eq!(departure("t", -1).delay_label(), "-1");
    }

    #[test]
    fn category_parse_round_trips() {
        for c in ServiceCategory::ALL {
            assert_eq!(ServiceCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(ServiceCategory::parse("zeppelin"), None);
    }
}
