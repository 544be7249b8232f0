//! # Shared Board State
//! Latest accepted value per feed, one independently-locked cell each.
//!
//! Each cell has exactly one writer (its producer loop) and is read by the
//! render loop. Locks are held only to swap or clone an `Arc`, never
//! across an await, so a reader can never observe a half-written value.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

use crate::feed::types::{Departure, WeatherReading};

/// Single-value cell. Writers replace the whole value atomically; readers
/// get a cheap handle to the immutable current value.
#[derive(Debug)]
pub struct FeedCell<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Default for FeedCell<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> FeedCell<T> {
    pub fn publish(&self, value: T) {
        *self.slot.lock().expect("feed cell mutex poisoned") = Some(Arc::new(value));
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().expect("feed cell mutex poisoned").clone()
    }
}

/// All feed cells. Shared between the producer loops and the render loop.
#[derive(Debug, Default)]
pub struct BoardState {
    pub departures: FeedCell<Vec<Departure>>,
    pub weather: FeedCell<WeatherReading>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time view for the renderer. Cells are read one at a time
    /// under their own locks; the snapshot is not atomic across feeds
    /// (they are independent), but no single value can be torn.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            taken_at: Local::now(),
            departures: self.departures.get(),
            weather: self.weather.get(),
        }
    }
}

/// Immutable consolidated view handed to the renderer.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub taken_at: DateTime<Local>,
    pub departures: Option<Arc<Vec<Departure>>>,
    pub weather: Option<Arc<WeatherReading>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::ServiceCategory;

    fn departure(line: &str) -> Departure {
        Departure {
            trip_id: "t1".into(),
            line: line.to_string(),
            destination: "Hauptbahnhof".into(),
            when: "10:00".into(),
            delay_minutes: 0,
            category: ServiceCategory::Bus,
        }
    }

    #[test]
    fn cell_starts_empty_and_supersedes_on_publish() {
        let cell = FeedCell::default();
        assert!(cell.get().is_none());

        cell.publish(vec![departure("M41")]);
        let first = cell.get().unwrap();
        assert_eq!(first[0].line, "M41");

        cell.publish(vec![departure("S41")]);
        assert_eq!(cell.get().unwrap()[0].line, "S41");
        // the old handle still sees the superseded value
        assert_eq!(first[0].line, "M41");
    }

    #[test]
    fn snapshot_reads_all_cells() {
        let state = BoardState::new();
        state.departures.publish(vec![departure("M41")]);

        let snap = state.snapshot();
        assert_eq!(snap.departures.unwrap()[0].line, "M41");
        assert!(snap.weather.is_none());
    }
}
