// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod change;
pub mod config;
pub mod error;
pub mod feed;
pub mod net;
pub mod render;
pub mod retry;
pub mod runtime;
pub mod schedule;
pub mod signal;
pub mod state;
pub mod telemetry;
pub mod watchdog;

// ---- Re-exports for stable public API ----
pub use crate::error::{FatalError, FetchError, ReconnectExhausted, RenderError};
pub use crate::signal::UpdateSignal;
pub use crate::state::{BoardState, Snapshot};
