//! Error taxonomy for the board daemon.
//!
//! Transient fetch failures never leave their producer loop (the retry
//! driver swallows them). Only a render failure or an exhausted wifi
//! reconnect may take the process down, and both get a best-effort error
//! screen first.

use thiserror::Error;

/// Transient failure while fetching one unit of feed data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{context}: unexpected payload: {message}")]
    Payload { context: String, message: String },

    #[error("{context}: received empty result")]
    Empty { context: String },
}

impl FetchError {
    pub fn payload(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Payload {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn empty(context: impl Into<String>) -> Self {
        Self::Empty {
            context: context.into(),
        }
    }
}

/// Station config could not be loaded. Always absorbed at startup by
/// falling back to the default station.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading station config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing station config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("station config contains no stations")]
    NoStations,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("writing board output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("wifi reconnect gave up after {attempts} attempts")]
pub struct ReconnectExhausted {
    pub attempts: u32,
}

/// The only conditions allowed to terminate the process.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Connectivity(#[from] ReconnectExhausted),
}
