//! Human-readable progress reporting.

use std::fmt;

use tracing::{error, info};

use crate::log::GridSize;

/// One message for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading { path: String },
    Loaded { events: usize, grid: GridSize },
    Ready,
    Playing,
    Finished,
    Reset,
    JumpedToSolver,
    Turbo(bool),
    ExportPreparing,
    ExportFrame { frame: usize, total: usize },
    Encoding,
    Exported { filename: String, bytes: usize },
    NothingToExport,
    Error(String),
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { path } => write!(f, "Loading {path}..."),
            Self::Loaded { events, grid } => write!(
                f,
                "Loaded {events} events for a {}×{} maze.",
                grid.width, grid.height
            ),
            Self::Ready => f.write_str("Animation ready. Press Play to begin."),
            Self::Playing => f.write_str("Playing animation…"),
            Self::Finished => f.write_str("Animation finished."),
            Self::Reset => f.write_str("Timeline reset. Press Play to watch again."),
            Self::JumpedToSolver => f.write_str("Skipped to solver phase."),
            Self::Turbo(true) => f.write_str("Turbo enabled (max speed)."),
            Self::Turbo(false) => f.write_str("Turbo disabled (respecting delay)."),
            Self::ExportPreparing => f.write_str("Preparing GIF export..."),
            Self::ExportFrame { frame, total } => write!(f, "Frame {frame}/{total}"),
            Self::Encoding => f.write_str("Encoding GIF..."),
            Self::Exported { filename, bytes } => write!(
                f,
                "GIF exported: {filename} ({:.1} KB)",
                *bytes as f64 / 1024.0
            ),
            Self::NothingToExport => f.write_str("No animation to export"),
            Self::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Receives every status message the player produces.
pub trait StatusSink {
    fn publish(&mut self, status: &Status);
}

/// Default sink: forwards status lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn publish(&mut self, status: &Status) {
        if status.is_error() {
            error!(target: "maze_replay::status", "{status}");
        } else {
            info!(target: "maze_replay::status", "{status}");
        }
    }
}

impl<F: FnMut(&Status)> StatusSink for F {
    fn publish(&mut self, status: &Status) {
        self(status)
    }
}

/// Called with `true`/`false` on every transition into/out of playing.
pub type PlaybackListener = Box<dyn FnMut(bool)>;
