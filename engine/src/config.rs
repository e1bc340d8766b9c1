//! Player configuration: JSON file with environment overrides.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::state::ColorMode;

pub const DEFAULT_DELAY_MS: u64 = 80;
pub const TURBO_BATCH: usize = 12;
pub const EXPORT_MIN_DELAY_MS: u64 = 50;

/// Environment flag helper: accepts `1/true/yes/on` and `0/false/no/off` (case-insensitive).
pub fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_turbo_batch() -> usize {
    TURBO_BATCH
}

fn default_export_min_delay_ms() -> u64 {
    EXPORT_MIN_DELAY_MS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target").join("exports")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Fixed delay between ticks when turbo is off. No lower bound.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub turbo: bool,
    /// Events applied per tick in turbo mode.
    #[serde(default = "default_turbo_batch")]
    pub turbo_batch: usize,
    /// Exported frames never get a shorter delay than this.
    #[serde(default = "default_export_min_delay_ms")]
    pub export_min_delay_ms: u64,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            turbo: false,
            turbo_batch: TURBO_BATCH,
            export_min_delay_ms: EXPORT_MIN_DELAY_MS,
            color_mode: ColorMode::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl PlayerConfig {
    pub fn load_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed parsing player config {}: {e}", path.display()),
            )
        })
    }

    /// Applies `MAZE_REPLAY_DELAY_MS`, `MAZE_REPLAY_TURBO` and `MAZE_REPLAY_OUTPUT_DIR`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(delay) = env_u64("MAZE_REPLAY_DELAY_MS") {
            self.delay_ms = delay;
        }
        if let Some(turbo) = env_bool("MAZE_REPLAY_TURBO") {
            self.turbo = turbo;
        }
        if let Some(dir) = std::env::var_os("MAZE_REPLAY_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn export_delay_ms(&self) -> u64 {
        self.delay_ms.max(self.export_min_delay_ms)
    }
}
