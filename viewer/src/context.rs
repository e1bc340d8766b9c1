//! Application context: the player plus the collaborators the viewer hangs off it.

use std::{
    cell::{Cell, RefCell},
    fmt,
    path::Path,
    rc::Rc,
    time::Instant,
};

use maze_replay::{
    GifEncoderFactory, LoadError, PlaybackState, Player, PlayerConfig, Status, StatusSink,
    Surface, TracingStatusSink,
};
use tracing::{debug, info, warn};

/// Delay change per `Faster`/`Slower` key press.
pub const DELAY_STEP_MS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    TogglePlayback,
    JumpToSolve,
    Reset,
    ToggleTurbo,
    Export,
    Faster,
    Slower,
}

/// Keeps the latest status line and forwards every message to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    latest: Rc<RefCell<Option<Status>>>,
}

impl StatusLine {
    pub fn text(&self) -> String {
        self.latest
            .borrow()
            .as_ref()
            .map_or_else(|| "No log loaded".to_string(), |s| s.to_string())
    }

    pub fn latest(&self) -> Option<Status> {
        self.latest.borrow().clone()
    }
}

impl StatusSink for StatusLine {
    fn publish(&mut self, status: &Status) {
        TracingStatusSink.publish(status);
        *self.latest.borrow_mut() = Some(status.clone());
    }
}

pub struct AppContext<S: Surface> {
    player: Player<S>,
    status: StatusLine,
    playing: Rc<Cell<bool>>,
}

impl<S: Surface> fmt::Debug for AppContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("player", &self.player)
            .field("status", &self.status.text())
            .field("playing", &self.playing.get())
            .finish()
    }
}

impl<S> AppContext<S>
where
    S: Surface,
    S::Error: fmt::Display,
{
    pub fn new(config: PlayerConfig, surface: S) -> Self {
        let status = StatusLine::default();
        let playing = Rc::new(Cell::new(false));

        let mut player = Player::new(config, surface, status.clone()).with_encoder(GifEncoderFactory);
        let flag = Rc::clone(&playing);
        player.set_playback_listener(move |now_playing| {
            debug!(playing = now_playing, "playback state changed");
            flag.set(now_playing);
        });

        Self {
            player,
            status,
            playing,
        }
    }

    pub fn player(&self) -> &Player<S> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player<S> {
        &mut self.player
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Last value the playback listener saw.
    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Loads a log and, on success, tells the user it is ready to play.
    pub fn load(&mut self, path: &Path) -> Result<(), LoadError> {
        self.player.load(path)?;
        self.status.publish(&Status::Ready);
        Ok(())
    }

    /// Controls stay disabled until a log has loaded.
    pub fn controls_enabled(&self) -> bool {
        self.player.state() != PlaybackState::Idle
    }

    pub fn apply(&mut self, control: Control, now: Instant) {
        if !self.controls_enabled() {
            debug!(?control, "ignoring control without a loaded log");
            return;
        }
        match control {
            Control::TogglePlayback => self.player.toggle_playback(now),
            Control::JumpToSolve => self.player.jump_to_solve(),
            Control::Reset => self.player.reset_timeline(),
            Control::ToggleTurbo => self.player.toggle_turbo(now),
            Control::Export => {
                if self.player.is_exporting() {
                    debug!("export already encoding");
                    return;
                }
                if let Err(err) = self.player.export_all() {
                    warn!("export not started: {err}");
                }
            }
            Control::Faster => {
                let delay = self.player.config().delay_ms.saturating_sub(DELAY_STEP_MS);
                self.set_delay(delay);
            }
            Control::Slower => {
                let delay = self.player.config().delay_ms.saturating_add(DELAY_STEP_MS);
                self.set_delay(delay);
            }
        }
    }

    fn set_delay(&mut self, delay_ms: u64) {
        self.player.set_delay(delay_ms);
        info!(delay_ms, "playback delay changed");
    }

    pub fn title(&self) -> String {
        let mode = if self.player.turbo() {
            "turbo".to_string()
        } else {
            format!("{}ms", self.player.config().delay_ms)
        };
        let state = if self.is_playing() { "playing" } else { "stopped" };
        let progress = format!("{}/{}", self.player.cursor(), self.player.len());
        format!("Maze Replay | {state} {progress} | {mode} | {}", self.status.text())
    }
}
