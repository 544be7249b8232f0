//! # Change Detection
//! Decides whether a freshly fetched value is worth republishing.
//!
//! Departure lists compare as unordered sets of identity keys, so a poll
//! that only reshuffles order or reissues trip ids is not an update.
//! Weather compares structurally; any field counts.

use std::collections::HashSet;

use crate::feed::types::{Departure, WeatherReading};

/// `true` when the new departure list differs from the accepted one.
///
/// An empty new list is never an update: the fetch layer already rejects
/// empty results as errors, and refusing them here keeps a stray empty
/// value from ever blanking the board.
pub fn departures_changed(old: Option<&[Departure]>, new: &[Departure]) -> bool {
    if new.is_empty() {
        return false;
    }
    let Some(old) = old else {
        return true;
    };
    let old_keys: HashSet<_> = old.iter().map(Departure::identity).collect();
    let new_keys: HashSet<_> = new.iter().map(Departure::identity).collect();
    old_keys != new_keys
}

/// Weather is a scalar composite: a single field change is a change.
pub fn weather_changed(old: Option<&WeatherReading>, new: &WeatherReading) -> bool {
    match old {
        None => true,
        Some(old) => old != new,
    }
}
