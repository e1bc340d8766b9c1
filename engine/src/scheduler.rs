//! Playback scheduling.
//!
//! The [`Player`] owns the loaded replay and advances it in ticks. At most one tick is ever
//! pending, either frame-synced ([`PendingTick::Frame`], used in turbo mode) or after a fixed
//! delay ([`PendingTick::Delay`]). The host drives time by calling [`Player::pump`] from its
//! event loop; cancelling playback clears the single pending slot, so a stale tick can never fire.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{info, warn};

use crate::{
    config::PlayerConfig,
    error::{ExportError, LoadError},
    export::{EncodeJob, EncodeResult, EncoderFactory, capture_frames, export_filename, save_export, unix_millis_now},
    log::{EventLog, GridSize},
    replay::Replay,
    status::{PlaybackListener, Status, StatusSink},
    surface::Surface,
};

/// Report export progress every this many frames.
const EXPORT_PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No log loaded.
    Idle,
    Stopped,
    Playing,
    /// Cursor at the end of the log and not playing.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTick {
    /// Run on the next display frame.
    Frame,
    /// Run once `due` has passed.
    Delay { due: Instant },
}

struct PendingExport {
    job: EncodeJob,
    grid: GridSize,
}

pub struct Player<S: Surface> {
    config: PlayerConfig,
    replay: Option<Replay>,
    surface: S,
    playing: bool,
    pending: Option<PendingTick>,
    listener: Option<PlaybackListener>,
    status: Box<dyn StatusSink>,
    encoders: Option<Box<dyn EncoderFactory>>,
    export: Option<PendingExport>,
}

impl<S: Surface> fmt::Debug for Player<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("config", &self.config)
            .field("cursor", &self.cursor())
            .field("len", &self.len())
            .field("playing", &self.playing)
            .field("pending", &self.pending)
            .field("can_export", &self.encoders.is_some())
            .finish()
    }
}

impl<S: Surface> Player<S> {
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn replay(&self) -> Option<&Replay> {
        self.replay.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn cursor(&self) -> usize {
        self.replay.as_ref().map_or(0, Replay::cursor)
    }

    pub fn len(&self) -> usize {
        self.replay.as_ref().map_or(0, Replay::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn turbo(&self) -> bool {
        self.config.turbo
    }

    pub fn pending(&self) -> Option<PendingTick> {
        self.pending
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        match &self.replay {
            None => PlaybackState::Idle,
            Some(_) if self.playing => PlaybackState::Playing,
            Some(replay) if replay.is_finished() => PlaybackState::Finished,
            Some(_) => PlaybackState::Stopped,
        }
    }
}

impl<S> Player<S>
where
    S: Surface,
    S::Error: fmt::Display,
{
    pub fn new(config: PlayerConfig, surface: S, status: impl StatusSink + 'static) -> Self {
        Self {
            config,
            replay: None,
            surface,
            playing: false,
            pending: None,
            listener: None,
            status: Box::new(status),
            encoders: None,
            export: None,
        }
    }

    /// Enables [`Player::export_all`].
    pub fn with_encoder(mut self, factory: impl EncoderFactory + 'static) -> Self {
        self.encoders = Some(Box::new(factory));
        self
    }

    pub fn set_playback_listener(&mut self, listener: impl FnMut(bool) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    fn publish(&mut self, status: Status) {
        self.status.publish(&status);
    }

    fn emit_playback(&mut self) {
        let playing = self.playing;
        if let Some(listener) = self.listener.as_mut() {
            listener(playing);
        }
    }

    fn render(&mut self) {
        let Some(replay) = self.replay.as_mut() else {
            return;
        };
        if let Err(err) = replay.render(&mut self.surface) {
            warn!("render failed: {err}");
            return;
        }
        if let Err(err) = self.surface.present() {
            warn!("present failed: {err}");
        }
    }

    /// Loads a log from disk. On failure the previous log (if any) stays loaded and stopped.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        self.stop_playback();
        self.publish(Status::Loading {
            path: path.display().to_string(),
        });
        match EventLog::load_json_file(path) {
            Ok(log) => {
                self.load_log(log);
                Ok(())
            }
            Err(err) => {
                self.publish(Status::Error(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn load_log(&mut self, log: EventLog) {
        self.stop_playback();
        let events = log.len();
        let grid = log.grid();
        self.replay = Some(Replay::new(Arc::new(log), self.config.color_mode));
        self.render();
        info!(events, width = grid.width, height = grid.height, "event log loaded");
        self.publish(Status::Loaded { events, grid });
    }

    pub fn set_delay(&mut self, delay_ms: u64) {
        self.config.delay_ms = delay_ms;
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.config.delay_ms)
    }

    /// Switches timing discipline. A pending tick is cancelled and rescheduled under the new one.
    pub fn set_turbo(&mut self, enabled: bool, now: Instant) {
        if self.config.turbo == enabled {
            return;
        }
        let was_playing = self.playing;
        if was_playing {
            self.pending = None;
        }
        self.config.turbo = enabled;
        self.publish(Status::Turbo(enabled));
        if was_playing {
            self.schedule_next(now);
        }
    }

    pub fn toggle_turbo(&mut self, now: Instant) {
        self.set_turbo(!self.config.turbo, now);
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        if self.is_empty() {
            return;
        }
        if self.playing {
            self.stop_playback();
            return;
        }
        if let Some(replay) = self.replay.as_mut() {
            if replay.is_finished() {
                replay.reset();
                self.render();
            }
        }
        self.playing = true;
        self.emit_playback();
        self.publish(Status::Playing);
        self.tick(now);
    }

    pub fn reset_timeline(&mut self) {
        if self.replay.is_none() {
            return;
        }
        self.stop_playback();
        if let Some(replay) = self.replay.as_mut() {
            replay.reset();
        }
        self.render();
        self.publish(Status::Reset);
    }

    /// Rebuilds the state with every event before the first `solve` event applied.
    pub fn jump_to_solve(&mut self) {
        if self.is_empty() {
            return;
        }
        self.stop_playback();
        if let Some(replay) = self.replay.as_mut() {
            replay.seek_to_solver();
        }
        self.render();
        self.publish(Status::JumpedToSolver);
    }

    /// Runs whatever is due: a frame-synced tick when `frame_ready`, a delayed tick once its
    /// deadline passed, and export completion. Returns `true` if a playback tick ran.
    pub fn pump(&mut self, now: Instant, frame_ready: bool) -> bool {
        self.poll_export();
        let due = match self.pending {
            Some(PendingTick::Frame) => frame_ready,
            Some(PendingTick::Delay { due }) => now >= due,
            None => false,
        };
        if due {
            self.pending = None;
            self.tick(now);
        }
        due
    }

    fn tick(&mut self, now: Instant) {
        if !self.playing {
            return;
        }
        let budget = if self.config.turbo {
            self.config.turbo_batch.max(1)
        } else {
            1
        };
        let finished = match self.replay.as_mut() {
            Some(replay) => {
                replay.run(budget);
                replay.is_finished()
            }
            None => true,
        };
        self.render();
        if finished {
            self.stop_playback();
            self.publish(Status::Finished);
            return;
        }
        self.schedule_next(now);
    }

    fn schedule_next(&mut self, now: Instant) {
        if !self.playing {
            return;
        }
        self.pending = Some(if self.config.turbo {
            PendingTick::Frame
        } else {
            PendingTick::Delay {
                due: now + self.delay(),
            }
        });
    }

    fn stop_playback(&mut self) {
        self.pending = None;
        if self.playing {
            self.playing = false;
            self.emit_playback();
        }
    }

    /// Replays the whole log from scratch into the encoder, then starts encoding.
    ///
    /// Returns an error only when exporting is impossible: no encoder, nothing loaded, or a
    /// previous export still encoding. Failures while capturing or encoding are reported on the
    /// status sink instead.
    pub fn export_all(&mut self) -> Result<(), ExportError> {
        if self.encoders.is_none() {
            let err = ExportError::Unavailable;
            self.publish(Status::Error(err.to_string()));
            return Err(err);
        }
        if self.is_empty() {
            self.publish(Status::NothingToExport);
            return Err(ExportError::NothingToExport);
        }
        if self.is_exporting() {
            let err = ExportError::InProgress;
            self.publish(Status::Error(err.to_string()));
            return Err(err);
        }

        self.stop_playback();
        self.publish(Status::ExportPreparing);

        let delay_ms = self.config.export_delay_ms();
        let (Some(factory), Some(replay)) = (self.encoders.as_ref(), self.replay.as_mut()) else {
            return Err(ExportError::NothingToExport);
        };
        let grid = replay.log().grid();
        let surface = &mut self.surface;
        let status = &mut self.status;

        let captured = factory.create(replay.geometry().canvas).and_then(|mut encoder| {
            capture_frames(replay, surface, encoder.as_mut(), delay_ms, |n, total| {
                if n == 1 || n == total || n % EXPORT_PROGRESS_EVERY == 0 {
                    status.publish(&Status::ExportFrame { frame: n, total });
                }
            })?;
            Ok(encoder)
        });

        match captured {
            Ok(encoder) => {
                if let Err(err) = self.surface.present() {
                    warn!("present failed: {err}");
                }
                self.publish(Status::Encoding);
                self.export = Some(PendingExport {
                    job: encoder.render(),
                    grid,
                });
            }
            Err(err) => self.fail_export(err),
        }
        Ok(())
    }

    fn fail_export(&mut self, err: ExportError) {
        warn!("GIF export failed: {err}");
        self.publish(Status::Error(err.to_string()));
    }

    fn poll_export(&mut self) -> Option<PathBuf> {
        let result = self.export.as_ref()?.job.try_finish()?;
        let pending = self.export.take()?;
        self.complete_export(pending.grid, result)
    }

    /// Blocks until a started export has been encoded and saved.
    pub fn wait_for_export(&mut self) -> Option<PathBuf> {
        let pending = self.export.take()?;
        let result = pending.job.wait();
        self.complete_export(pending.grid, result)
    }

    fn complete_export(&mut self, grid: GridSize, result: EncodeResult) -> Option<PathBuf> {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                self.fail_export(err);
                return None;
            }
        };
        let filename = export_filename(grid, unix_millis_now());
        match save_export(&self.config.output_dir, &filename, &bytes) {
            Ok(path) => {
                info!(path = %path.display(), bytes = bytes.len(), "GIF exported");
                self.publish(Status::Exported {
                    filename,
                    bytes: bytes.len(),
                });
                Some(path)
            }
            Err(err) => {
                self.fail_export(err);
                None
            }
        }
    }
}
