//! Animated export of a full replay.
//!
//! The frame encoder is a capability: the player only exports when it was given an
//! [`EncoderFactory`]. Encoding runs on a worker thread that consumes frames as they are captured;
//! finishing hands back an [`EncodeJob`] whose completion carries the encoded bytes.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};
use tracing::debug;

use crate::{
    error::ExportError,
    log::GridSize,
    replay::Replay,
    surface::{Surface, SurfaceSize},
};

/// Quantization speed handed to the GIF encoder (1 = best, 30 = fastest).
const GIF_SPEED: i32 = 10;
/// Frames waiting for the GIF worker. Capture blocks once this many are queued.
pub const GIF_QUEUE_DEPTH: usize = 4;

pub type EncodeResult = Result<Vec<u8>, ExportError>;

/// Accepts captured RGBA frames and eventually produces an encoded byte blob.
pub trait FrameEncoder {
    fn add_frame(&mut self, rgba: &[u8], delay_ms: u64) -> Result<(), ExportError>;

    /// Stops accepting frames and starts finalizing.
    fn render(self: Box<Self>) -> EncodeJob;
}

/// Creates encoders for a canvas size.
pub trait EncoderFactory {
    fn create(&self, size: SurfaceSize) -> Result<Box<dyn FrameEncoder>, ExportError>;
}

/// Completion handle for an encoder that is finalizing.
#[derive(Debug)]
pub struct EncodeJob {
    done: Receiver<EncodeResult>,
}

impl EncodeJob {
    pub fn new(done: Receiver<EncodeResult>) -> Self {
        Self { done }
    }

    /// A job that has already completed.
    pub fn finished(result: EncodeResult) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let _ = tx.send(result);
        Self { done: rx }
    }

    /// Non-blocking completion check.
    pub fn try_finish(&self) -> Option<EncodeResult> {
        match self.done.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_gone())),
        }
    }

    pub fn wait(self) -> EncodeResult {
        self.done.recv().unwrap_or_else(|_| Err(worker_gone()))
    }
}

fn worker_gone() -> ExportError {
    ExportError::Encode("encoder worker exited without a result".to_string())
}

/// GIF encoder backed by the `image` crate, looping forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct GifEncoderFactory;

impl EncoderFactory for GifEncoderFactory {
    fn create(&self, size: SurfaceSize) -> Result<Box<dyn FrameEncoder>, ExportError> {
        Ok(Box::new(GifFrameEncoder::spawn(size)?))
    }
}

fn encode_gif(frames: Receiver<Frame>) -> EncodeResult {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;
        for frame in frames.iter() {
            encoder.encode_frame(frame)?;
        }
    }
    debug!(bytes = out.len(), "gif encoding finished");
    Ok(out)
}

struct GifFrameEncoder {
    size: SurfaceSize,
    frames: Sender<Frame>,
    done: Receiver<EncodeResult>,
}

impl GifFrameEncoder {
    fn spawn(size: SurfaceSize) -> Result<Self, ExportError> {
        let (frames_tx, frames_rx) = crossbeam_channel::bounded::<Frame>(GIF_QUEUE_DEPTH);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        thread::Builder::new()
            .name("gif-encoder".to_string())
            .spawn(move || {
                let _ = done_tx.send(encode_gif(frames_rx));
            })?;

        Ok(Self {
            size,
            frames: frames_tx,
            done: done_rx,
        })
    }
}

impl fmt::Debug for GifFrameEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GifFrameEncoder")
            .field("size", &self.size)
            .field("queued", &self.frames.len())
            .finish()
    }
}

impl FrameEncoder for GifFrameEncoder {
    fn add_frame(&mut self, rgba: &[u8], delay_ms: u64) -> Result<(), ExportError> {
        let expected = self.size.rgba_len();
        if rgba.len() != expected {
            return Err(ExportError::Frame {
                expected,
                actual: rgba.len(),
            });
        }
        let image = RgbaImage::from_raw(self.size.width, self.size.height, rgba.to_vec())
            .ok_or(ExportError::Frame {
                expected,
                actual: rgba.len(),
            })?;
        let delay_ms = u32::try_from(delay_ms).unwrap_or(u32::MAX);
        let frame = Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
        self.frames.send(frame).map_err(|_| {
            // The worker hung up early; its error is the useful one.
            match self.done.try_recv() {
                Ok(Err(err)) => err,
                _ => worker_gone(),
            }
        })
    }

    fn render(self: Box<Self>) -> EncodeJob {
        let Self { frames, done, .. } = *self;
        drop(frames);
        EncodeJob::new(done)
    }
}

/// `maze-{w}x{h}-{unix_millis}.gif`
pub fn export_filename(grid: GridSize, unix_millis: u128) -> String {
    format!("maze-{}x{}-{unix_millis}.gif", grid.width, grid.height)
}

pub fn unix_millis_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Writes a finished export into `dir`, creating it if needed.
pub fn save_export(dir: impl AsRef<Path>, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    let path = dir.join(filename);
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Replays the whole log from empty, handing one rendered frame per event (plus the initial empty
/// frame) to `encoder`. `progress` sees `(frames_captured, total_frames)` after every frame.
pub fn capture_frames<S>(
    replay: &mut Replay,
    surface: &mut S,
    encoder: &mut dyn FrameEncoder,
    delay_ms: u64,
    mut progress: impl FnMut(usize, usize),
) -> Result<(), ExportError>
where
    S: Surface,
    S::Error: fmt::Display,
{
    let total = replay.len() + 1;
    let render = |replay: &mut Replay, surface: &mut S| {
        replay
            .render(surface)
            .map_err(|e| ExportError::Encode(format!("render failed: {e}")))
    };

    replay.reset();
    render(replay, surface)?;
    encoder.add_frame(surface.frame(), delay_ms)?;
    progress(1, total);

    let mut captured = 1;
    while replay.step() {
        render(replay, surface)?;
        encoder.add_frame(surface.frame(), delay_ms)?;
        captured += 1;
        progress(captured, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_encodes_grid_and_timestamp() {
        assert_eq!(
            export_filename(GridSize::new(12, 7), 1_700_000_000_123),
            "maze-12x7-1700000000123.gif"
        );
    }

    #[test]
    fn gif_encoder_produces_gif_bytes() {
        let size = SurfaceSize::new(4, 3);
        let mut encoder = GifEncoderFactory.create(size).expect("encoder");
        let frame = vec![200u8; size.rgba_len()];
        encoder.add_frame(&frame, 50).expect("frame 0");
        encoder.add_frame(&frame, 50).expect("frame 1");

        let bytes = encoder.render().wait().expect("encoded");
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn queued_frames_stay_bounded() {
        let size = SurfaceSize::new(64, 64);
        let mut encoder = GifFrameEncoder::spawn(size).expect("encoder");
        let frame = vec![90u8; size.rgba_len()];
        for _ in 0..40 {
            encoder.add_frame(&frame, 50).expect("frame");
            assert!(encoder.frames.len() <= GIF_QUEUE_DEPTH);
        }

        let bytes = Box::new(encoder).render().wait().expect("encoded");
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn wrong_frame_size_is_rejected() {
        let mut encoder = GifEncoderFactory.create(SurfaceSize::new(4, 4)).expect("encoder");
        let err = encoder.add_frame(&[0u8; 8], 50).expect_err("short frame");
        assert!(matches!(err, ExportError::Frame { expected: 64, actual: 8 }));
    }

    #[test]
    fn finished_job_is_immediately_ready() {
        let job = EncodeJob::finished(Ok(vec![1, 2, 3]));
        assert_eq!(job.try_finish().map(|r| r.ok()), Some(Some(vec![1, 2, 3])));
    }
}
