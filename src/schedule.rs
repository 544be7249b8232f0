//! # Fetch Scheduling
//! When the next fetch attempt for a source should happen.
//!
//! Fixed-interval polling is fine for departures, but the weather upstream
//! refreshes on its own quarter-hour boundaries; polling on a blind timer
//! drifts out of phase with it and either wastes calls on stale data or
//! misses fresh data by minutes. The anchored policy schedules from the
//! server's own attribution timestamp instead of wall-clock elapsed time.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub enum SchedulePolicy {
    /// Sleep a constant duration after each completed cycle.
    Fixed { interval: Duration },
    /// Sleep until `anchor + refresh_period + safety_offset`. Falls back to
    /// `fallback` when that instant is not in the future, or when the
    /// anchor itself is ahead of the local clock and cannot be trusted.
    Anchored {
        refresh_period: Duration,
        safety_offset: Duration,
        fallback: Duration,
    },
}

impl SchedulePolicy {
    /// Compute the sleep before the next fetch. `anchor` is the server's
    /// attribution timestamp of the value just fetched, when one exists.
    pub fn next_delay(&self, anchor: Option<NaiveDateTime>, now: NaiveDateTime) -> Duration {
        match *self {
            SchedulePolicy::Fixed { interval } => interval,
            SchedulePolicy::Anchored {
                refresh_period,
                safety_offset,
                fallback,
            } => {
                let Some(anchor) = anchor else {
                    return fallback;
                };
                if anchor > now {
                    warn!(
                        %anchor,
                        "server timestamp is ahead of the local clock, using fallback interval"
                    );
                    return fallback;
                }
                let lead = chrono::Duration::seconds(
                    (refresh_period.as_secs() + safety_offset.as_secs()) as i64,
                );
                match (anchor + lead - now).to_std() {
                    Ok(d) if !d.is_zero() => d,
                    _ => {
                        warn!(
                            %anchor,
                            "server timestamp is stale, using fallback interval"
                        );
                        fallback
                    }
                }
            }
        }
    }
}
