//! # Feed Loops
//! The producer loops, the clock ticker, and the render consumer.
//!
//! Every loop is spawned once at startup and runs for the process
//! lifetime. Producers publish into [`BoardState`] and raise the
//! [`UpdateSignal`]; the single consumer drains the signal, snapshots the
//! board, and renders. Only the consumer can end, and only fatally.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Timelike};
use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::change;
use crate::error::FatalError;
use crate::feed::types::{TripSource, WeatherSource};
use crate::render::Renderer;
use crate::retry::fetch_until_success;
use crate::schedule::SchedulePolicy;
use crate::signal::UpdateSignal;
use crate::state::BoardState;

/// Loop cadences and retry delays, one place so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub trip_interval: Duration,
    pub trip_retry_delay: Duration,
    pub weather_retry_delay: Duration,
    pub weather_refresh_period: Duration,
    pub weather_safety_offset: Duration,
    pub weather_fallback: Duration,
    /// Upper bound on the consumer's wait, so the clock display advances
    /// even with no data change at all.
    pub render_wait_bound: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            trip_interval: Duration::from_secs(15),
            trip_retry_delay: Duration::from_secs(15),
            weather_retry_delay: Duration::from_secs(15),
            weather_refresh_period: Duration::from_secs(15 * 60),
            weather_safety_offset: Duration::from_secs(60),
            weather_fallback: Duration::from_secs(15 * 60),
            render_wait_bound: Duration::from_secs(15),
        }
    }
}

pub fn spawn_trip_loop(
    state: Arc<BoardState>,
    signal: Arc<UpdateSignal>,
    source: Arc<dyn TripSource>,
    cfg: LoopConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let policy = SchedulePolicy::Fixed {
            interval: cfg.trip_interval,
        };
        loop {
            let departures =
                fetch_until_success("trips", cfg.trip_retry_delay, || source.fetch_departures())
                    .await;

            let previous = state.departures.get();
            if change::departures_changed(previous.as_deref().map(Vec::as_slice), &departures) {
                info!(count = departures.len(), "departure board changed, publishing");
                state.departures.publish(departures);
                counter!("feed_publish_total", "feed" => "trips").increment(1);
                gauge!("feed_last_publish_ts", "feed" => "trips")
                    .set(Local::now().timestamp() as f64);
                signal.raise();
            } else {
                debug!("departures unchanged, suppressing publish");
                counter!("feed_suppressed_total", "feed" => "trips").increment(1);
            }

            tokio::time::sleep(policy.next_delay(None, Local::now().naive_local())).await;
        }
    })
}

pub fn spawn_weather_loop(
    state: Arc<BoardState>,
    signal: Arc<UpdateSignal>,
    source: Arc<dyn WeatherSource>,
    cfg: LoopConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let policy = SchedulePolicy::Anchored {
            refresh_period: cfg.weather_refresh_period,
            safety_offset: cfg.weather_safety_offset,
            fallback: cfg.weather_fallback,
        };
        loop {
            let reading =
                fetch_until_success("weather", cfg.weather_retry_delay, || source.fetch_current())
                    .await;
            // the server's own attribution timestamp anchors the next fetch
            let anchor = reading.timestamp;

            let previous = state.weather.get();
            if change::weather_changed(previous.as_deref(), &reading) {
                info!(temperature = reading.temperature, "weather changed, publishing");
                state.weather.publish(reading);
                counter!("feed_publish_total", "feed" => "weather").increment(1);
                gauge!("feed_last_publish_ts", "feed" => "weather")
                    .set(Local::now().timestamp() as f64);
                signal.raise();
            } else {
                debug!("weather unchanged, suppressing publish");
                counter!("feed_suppressed_total", "feed" => "weather").increment(1);
            }

            let delay = policy.next_delay(Some(anchor), Local::now().naive_local());
            info!(sleep_secs = delay.as_secs(), "scheduled next weather fetch");
            tokio::time::sleep(delay).await;
        }
    })
}

/// Wakes the render loop whenever the local minute changes, so the
/// on-screen clock advances without any data update.
pub fn spawn_clock_loop(signal: Arc<UpdateSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let into_minute_ms =
                u64::from(now.second()) * 1000 + u64::from(now.nanosecond()) / 1_000_000;
            let remaining_ms = 60_000u64.saturating_sub(into_minute_ms).max(1);
            tokio::time::sleep(Duration::from_millis(remaining_ms)).await;
            signal.raise();
        }
    })
}

/// The single consumer. Runs until a render error, which is fatal.
pub async fn run_render_loop<R: Renderer>(
    state: Arc<BoardState>,
    signal: Arc<UpdateSignal>,
    renderer: &mut R,
    wait_bound: Duration,
) -> Result<Infallible, FatalError> {
    // the first render must not wait for a producer
    signal.raise();
    loop {
        signal.wait(wait_bound).await;
        // clear before rendering so an update raised during the render is
        // deferred to the next pass instead of lost
        signal.drain();

        let snapshot = state.snapshot();
        renderer.render(&snapshot).map_err(FatalError::Render)?;
        counter!("render_total").increment(1);
    }
}
