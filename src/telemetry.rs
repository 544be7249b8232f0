// src/telemetry.rs
//! Metrics facade setup.
//!
//! Series are described once so they show up with help text; the
//! Prometheus exporter only runs when `$METRICS_ADDR` is set, and an
//! install failure degrades to a no-op facade instead of failing startup.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use tracing::{info, warn};

const ENV_ADDR: &str = "METRICS_ADDR";

fn describe_series() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_fetch_errors_total",
            "Fetch attempts that failed, per feed."
        );
        describe_counter!(
            "feed_publish_total",
            "Accepted values published to the board, per feed."
        );
        describe_counter!(
            "feed_suppressed_total",
            "Fetched values discarded as unchanged, per feed."
        );
        describe_counter!(
            "feed_departures_parsed_total",
            "Departure records parsed from upstream responses."
        );
        describe_counter!(
            "watchdog_reconnect_attempts_total",
            "Wifi reconnect attempts."
        );
        describe_counter!("render_total", "Render passes completed.");
        describe_gauge!(
            "feed_last_publish_ts",
            "Unix ts of the last publish, per feed."
        );
    });
}

/// Install the exporter (when configured) and register series metadata.
pub fn init() {
    if let Ok(addr) = std::env::var(ENV_ADDR) {
        match addr.parse::<std::net::SocketAddr>() {
            Ok(addr) => match PrometheusBuilder::new().with_http_listener(addr).install() {
                Ok(()) => info!(%addr, "prometheus exporter listening"),
                Err(e) => {
                    warn!(error = %e, "prometheus exporter install failed, metrics disabled")
                }
            },
            Err(e) => warn!(addr = %addr, error = %e, "invalid METRICS_ADDR, metrics disabled"),
        }
    }
    describe_series();
}
