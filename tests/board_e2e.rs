// tests/board_e2e.rs
//! End-to-end publish/suppress cycle across the trip loop, the shared
//! board state, the update signal, and the render loop, on virtual time.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use transit_board::error::{FetchError, RenderError};
use transit_board::feed::types::{Departure, ServiceCategory, TripSource};
use transit_board::render::Renderer;
use transit_board::runtime::{run_render_loop, spawn_trip_loop, LoopConfig};
use transit_board::state::Snapshot;
use transit_board::{BoardState, FatalError, UpdateSignal};

fn m41(trip_id: &str, delay: i32) -> Departure {
    Departure {
        trip_id: trip_id.to_string(),
        line: "M41".into(),
        destination: "Hauptbahnhof".into(),
        when: "10:00".into(),
        delay_minutes: delay,
        category: ServiceCategory::Bus,
    }
}

struct ScriptedTrips {
    responses: Mutex<VecDeque<Vec<Departure>>>,
}

impl ScriptedTrips {
    fn new(responses: Vec<Vec<Departure>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl TripSource for ScriptedTrips {
    async fn fetch_departures(&self) -> Result<Vec<Departure>, FetchError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(batch) => Ok(batch),
            // script exhausted: park the producer in its retry loop
            None => Err(FetchError::empty("script")),
        }
    }
}

#[derive(Clone)]
struct RecordingRenderer {
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingRenderer {
    fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn boards(&self) -> Vec<Vec<Departure>> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| s.departures.as_ref().map(|d| d.as_ref().clone()))
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, snapshot: &Snapshot) -> Result<(), RenderError> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    fn render_error(&mut self, _message: &str) {}
}

fn test_config() -> LoopConfig {
    LoopConfig {
        trip_interval: Duration::from_secs(15),
        trip_retry_delay: Duration::from_secs(15),
        render_wait_bound: Duration::from_secs(1),
        ..LoopConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn publish_suppress_republish_cycle() {
    let state = Arc::new(BoardState::new());
    let signal = Arc::new(UpdateSignal::new());
    let cfg = test_config();

    let source = ScriptedTrips::new(vec![
        vec![m41("trip-1", 0)],
        // same physical trip, reissued upstream id
        vec![m41("trip-2", 0)],
        // delay appeared
        vec![m41("trip-3", 2)],
    ]);
    spawn_trip_loop(state.clone(), signal.clone(), source, cfg);

    let mut renderer = RecordingRenderer::new();
    let consumer = run_render_loop(
        state,
        signal,
        &mut renderer,
        cfg.render_wait_bound,
    );
    let _ = tokio::time::timeout(Duration::from_secs(60), consumer).await;

    let boards = renderer.boards();
    assert!(!boards.is_empty(), "first cycle must reach the renderer");

    // first accepted value is rendered as fetched
    assert_eq!(boards.first().unwrap()[0].trip_id, "trip-1");
    assert_eq!(boards.first().unwrap()[0].delay_minutes, 0);

    // the reissued trip id alone never replaced the accepted value
    assert!(boards.iter().all(|b| b[0].trip_id != "trip-2"));

    // the delay change was republished
    let last = boards.last().unwrap();
    assert_eq!(last[0].trip_id, "trip-3");
    assert_eq!(last[0].delay_minutes, 2);
}

#[tokio::test(start_paused = true)]
async fn consumer_keeps_rendering_without_any_producer_activity() {
    let state = Arc::new(BoardState::new());
    let signal = Arc::new(UpdateSignal::new());

    let mut renderer = RecordingRenderer::new();
    let consumer = run_render_loop(state, signal, &mut renderer, Duration::from_secs(1));
    let _ = tokio::time::timeout(Duration::from_secs(10), consumer).await;

    // initial render plus one per timeout-bounded wait
    let rendered = renderer.snapshots.lock().unwrap().len();
    assert!(rendered >= 9, "only {rendered} renders in 10s with a 1s bound");
    assert!(renderer.boards().is_empty(), "no departures were ever published");
}

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&mut self, _snapshot: &Snapshot) -> Result<(), RenderError> {
        Err(RenderError::Io(std::io::Error::other("sink broke")))
    }

    fn render_error(&mut self, _message: &str) {}
}

#[tokio::test(start_paused = true)]
async fn render_failure_is_fatal() {
    let state = Arc::new(BoardState::new());
    let signal = Arc::new(UpdateSignal::new());

    let mut renderer = FailingRenderer;
    let res = run_render_loop(state, signal, &mut renderer, Duration::from_secs(1)).await;
    assert!(matches!(res, Err(FatalError::Render(_))));
}
