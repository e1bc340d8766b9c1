//! Replay regression helpers.
//!
//! Every prefix of a log renders to a deterministic RGBA frame, so a whole replay can be pinned
//! down as one sha256 per frame and compared against a JSON golden under `tests/goldens`.

use std::{
    fmt, fs,
    io::{self, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    config::env_bool,
    replay::Replay,
    surface::Surface,
};

/// Environment flag helper: accepts `1/true/yes/on` (case-insensitive).
pub fn env_flag(name: &str) -> bool {
    env_bool(name).unwrap_or(false)
}

/// If set, regression tests may update golden files in-place.
pub fn update_goldens_enabled() -> bool {
    env_flag("MAZE_REPLAY_UPDATE_GOLDENS")
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[macro_export]
macro_rules! regression_golden_path {
    ($name:expr) => {{
        let base = $crate::regression::sanitize_filename($name);
        ::std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("goldens")
            .join(format!("{base}.json"))
    }};
}

pub fn rgba_sha256_hex(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}

/// Hashes the frame for every prefix `0..=len` of the replay's log, starting from empty.
///
/// Leaves the replay at the end of its log.
pub fn replay_frame_hashes<S>(replay: &mut Replay, surface: &mut S) -> io::Result<Vec<String>>
where
    S: Surface,
    S::Error: fmt::Display,
{
    let render = |replay: &mut Replay, surface: &mut S| {
        replay
            .render(surface)
            .map_err(|e| io::Error::other(format!("render failed: {e}")))
    };

    replay.reset();
    render(replay, surface)?;
    let mut hashes = vec![rgba_sha256_hex(surface.frame())];
    while replay.step() {
        render(replay, surface)?;
        hashes.push(rgba_sha256_hex(surface.frame()));
    }
    Ok(hashes)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameHashGolden {
    pub version: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub hash_alg: String,
    /// One hash per replayed prefix, empty state first.
    pub hashes: Vec<String>,
}

impl FrameHashGolden {
    pub fn new(name: impl Into<String>, width: u32, height: u32, hashes: Vec<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            width,
            height,
            hash_alg: "sha256".to_string(),
            hashes,
        }
    }
}

pub fn load_golden_json(path: impl AsRef<Path>) -> io::Result<FrameHashGolden> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed parsing golden json {}: {e}", path.display()),
        )
    })
}

pub fn save_golden_json(path: impl AsRef<Path>, golden: &FrameHashGolden) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, golden).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

fn golden_mismatch(path: &Path, detail: String) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "golden mismatch at {}: {detail}\n(hint: set MAZE_REPLAY_UPDATE_GOLDENS=1 to rewrite)",
            path.display()
        ),
    )
}

/// Compares `golden` with the file at `path`. A missing file (or `update`) writes it instead.
pub fn assert_or_update_golden_json(
    path: impl AsRef<Path>,
    golden: &FrameHashGolden,
    update: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    if update || !path.exists() {
        let existed = path.exists();
        save_golden_json(path, golden)?;
        let verb = if existed { "updated" } else { "wrote" };
        eprintln!("{verb} golden: {}", path.display());
        return Ok(());
    }

    let expected = load_golden_json(path)?;
    let meta = |g: &FrameHashGolden| format!("v{} alg={} {}x{}", g.version, g.hash_alg, g.width, g.height);
    if meta(&expected) != meta(golden) {
        return Err(golden_mismatch(
            path,
            format!("expected {}, got {}", meta(&expected), meta(golden)),
        ));
    }

    if let Some(frame) = expected
        .hashes
        .iter()
        .zip(&golden.hashes)
        .position(|(a, b)| a != b)
    {
        return Err(golden_mismatch(
            path,
            format!(
                "frame {frame} hashed {} instead of {}",
                golden.hashes[frame], expected.hashes[frame]
            ),
        ));
    }
    if expected.hashes.len() != golden.hashes.len() {
        return Err(golden_mismatch(
            path,
            format!(
                "expected {} frames, got {}",
                expected.hashes.len(),
                golden.hashes.len()
            ),
        ));
    }

    Ok(())
}
