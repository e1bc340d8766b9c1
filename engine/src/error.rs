//! Error types for the replay engine.
//!
//! Malformed log entries never surface here: they parse into `Action::Malformed` and replay
//! skips them.

use std::{io, path::PathBuf};

/// Failures while reading or parsing an event log.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The log resource could not be read.
    #[error("unable to load animation JSON from {path}: {source}")]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The resource was read but is not a valid log document.
    #[error("unable to parse animation JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The grid dimensions cannot be rendered: zero, negative, or wider than
    /// [`MAX_GRID_DIM`](crate::geometry::MAX_GRID_DIM).
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidGrid {
        /// Declared width.
        width: i64,
        /// Declared height.
        height: i64,
    },
}

/// Failures while exporting the replay as an animated image.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No frame encoder capability was configured.
    #[error("GIF encoder not available")]
    Unavailable,

    /// Nothing is loaded, so there is nothing to capture.
    #[error("no animation to export")]
    NothingToExport,

    /// A previous export is still encoding.
    #[error("an export is already in progress")]
    InProgress,

    /// A captured frame did not match the encoder's canvas.
    #[error("frame len {actual} != expected {expected}")]
    Frame {
        /// Expected RGBA byte length.
        expected: usize,
        /// Supplied RGBA byte length.
        actual: usize,
    },

    /// The encoder rejected a frame or failed to finish.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Writing the finished artifact failed.
    #[error("writing export failed: {0}")]
    Io(#[from] io::Error),
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err.to_string())
    }
}
