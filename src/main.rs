//! Transit Board — Binary Entrypoint
//! Boots the feed loops, the connectivity watchdog, and the render loop.

use std::convert::Infallible;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use transit_board::config;
use transit_board::error::FatalError;
use transit_board::feed::transit::BvgTripSource;
use transit_board::feed::types::{TripSource, WeatherSource};
use transit_board::feed::weather::OpenMeteoWeatherSource;
use transit_board::net::NmcliLink;
use transit_board::render::{ConsoleRenderer, Renderer};
use transit_board::runtime::{
    run_render_loop, spawn_clock_loop, spawn_trip_loop, spawn_weather_loop, LoopConfig,
};
use transit_board::telemetry;
use transit_board::watchdog::{run_watchdog, WatchdogPolicy};
use transit_board::{BoardState, UpdateSignal};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn fatal_from_render(res: Result<Infallible, FatalError>) -> FatalError {
    match res {
        Err(fatal) => fatal,
        Ok(never) => match never {},
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    init_tracing();
    telemetry::init();

    let stations = config::load_stations();
    info!(stations = stations.len(), "starting transit board");

    let state = Arc::new(BoardState::new());
    let signal = Arc::new(UpdateSignal::new());
    let cfg = LoopConfig::default();

    let trips: Arc<dyn TripSource> = Arc::new(BvgTripSource::new(stations));
    let weather: Arc<dyn WeatherSource> = Arc::new(OpenMeteoWeatherSource::new());
    spawn_trip_loop(state.clone(), signal.clone(), trips, cfg);
    spawn_weather_loop(state.clone(), signal.clone(), weather, cfg);
    spawn_clock_loop(signal.clone());

    // No wifi on this machine is not an error; the board still works on
    // wired networks, just without the reconnect safety net.
    let link = match NmcliLink::discover().await {
        Ok(link) => Some(link),
        Err(e) => {
            warn!(error = %e, "wifi watchdog disabled");
            None
        }
    };

    let mut renderer = ConsoleRenderer::stdout();
    let fatal = match link {
        Some(link) => {
            tokio::select! {
                res = run_render_loop(state, signal, &mut renderer, cfg.render_wait_bound) => {
                    fatal_from_render(res)
                }
                exhausted = run_watchdog(&link, WatchdogPolicy::default()) => {
                    FatalError::Connectivity(exhausted)
                }
            }
        }
        None => fatal_from_render(
            run_render_loop(state, signal, &mut renderer, cfg.render_wait_bound).await,
        ),
    };

    error!(error = %fatal, "fatal failure, shutting down");
    renderer.render_error(&fatal.to_string());
    ExitCode::FAILURE
}
