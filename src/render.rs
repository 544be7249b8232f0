//! # Board Rendering
//! The render seam plus a text renderer.
//!
//! Pixel output (framebuffer, fonts) lives behind the [`Renderer`] trait
//! outside this crate; the console renderer keeps the daemon useful
//! standalone and doubles as the reference implementation in tests.

use std::io::Write;

use crate::error::RenderError;
use crate::state::Snapshot;

pub trait Renderer: Send {
    fn render(&mut self, snapshot: &Snapshot) -> Result<(), RenderError>;

    /// Best-effort diagnostic shown before the process exits. Must not fail.
    fn render_error(&mut self, message: &str);
}

/// Formats the snapshot as an aligned text board.
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl ConsoleRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot) -> Result<(), RenderError> {
        let board = format_board(snapshot);
        writeln!(self.out, "{board}")?;
        self.out.flush()?;
        Ok(())
    }

    fn render_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "\n!!! display failure: {message}");
        let _ = self.out.flush();
    }
}

fn format_board(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    out.push_str(&format!("== {} ==\n", snapshot.taken_at.format("%H:%M")));

    match snapshot.weather.as_deref() {
        Some(w) => out.push_str(&format!(
            "{:.1}°C (min {:.1}°C / max {:.1}°C)  UV {:.1} (max {:.1})\n",
            w.temperature,
            w.temperature_daily_min,
            w.temperature_daily_max,
            w.uv_index,
            w.uv_index_daily_max,
        )),
        None => out.push_str("weather pending ...\n"),
    }

    match snapshot.departures.as_deref() {
        Some(departures) => {
            let dest_width = departures
                .iter()
                .map(|d| d.destination.chars().count())
                .max()
                .unwrap_or(0)
                .max("Destination".len());
            out.push_str(&format!(
                "{:<6} {:<dest_width$} {:>7} {:>5}\n",
                "Line", "Destination", "Arrival", "Delay"
            ));
            for d in departures.iter() {
                out.push_str(&format!(
                    "{:<6} {:<dest_width$} {:>7} {:>5}\n",
                    d.line,
                    d.destination,
                    d.when,
                    d.delay_label()
                ));
            }
        }
        None => out.push_str("waiting for departures ...\n"),
    }

    out
}
