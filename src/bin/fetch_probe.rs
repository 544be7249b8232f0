//! One-shot probe: fetch departures and weather once and print the board.
//! Handy for checking config and upstream reachability without the loops.

use transit_board::config;
use transit_board::feed::transit::BvgTripSource;
use transit_board::feed::types::{TripSource, WeatherSource};
use transit_board::feed::weather::OpenMeteoWeatherSource;
use transit_board::render::{ConsoleRenderer, Renderer};
use transit_board::BoardState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let stations = config::load_stations();
    let trips = BvgTripSource::new(stations);
    let weather = OpenMeteoWeatherSource::new();

    let state = BoardState::new();
    state.departures.publish(trips.fetch_departures().await?);
    match weather.fetch_current().await {
        Ok(reading) => state.weather.publish(reading),
        Err(e) => eprintln!("weather fetch failed: {e}"),
    }

    let mut renderer = ConsoleRenderer::stdout();
    renderer.render(&state.snapshot())?;
    Ok(())
}
