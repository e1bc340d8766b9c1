use std::sync::Arc;

use crate::{
    geometry::Geometry,
    graphics::CpuRenderer,
    log::EventLog,
    render::{Markers, draw_maze},
    state::{ColorMode, RenderState},
    surface::Surface,
};

/// A loaded log plus the state folded from its first `cursor` events.
///
/// The state is only ever moved forward one event at a time or rebuilt from empty, which is
/// what keeps any prefix replay identical to every other replay of the same prefix.
#[derive(Debug, Clone)]
pub struct Replay {
    log: Arc<EventLog>,
    geometry: Geometry,
    color_mode: ColorMode,
    state: RenderState,
    cursor: usize,
}

impl Replay {
    pub fn new(log: Arc<EventLog>, color_mode: ColorMode) -> Self {
        let geometry = Geometry::for_grid(log.grid());
        let state = RenderState::with_color_mode(log.start(), color_mode);
        Self {
            log,
            geometry,
            color_mode,
            state,
            cursor: 0,
        }
    }

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.log.len()
    }

    pub fn markers(&self) -> Markers {
        Markers {
            start: self.log.start(),
            target: self.log.target(),
        }
    }

    pub fn reset(&mut self) {
        self.state = RenderState::with_color_mode(self.log.start(), self.color_mode);
        self.cursor = 0;
    }

    /// Applies the next event. Returns `false` once the log is exhausted.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.log.events().get(self.cursor) else {
            return false;
        };
        self.state.apply(event);
        self.cursor += 1;
        true
    }

    /// Applies up to `budget` events and returns how many were applied.
    pub fn run(&mut self, budget: usize) -> usize {
        let mut applied = 0;
        while applied < budget && self.step() {
            applied += 1;
        }
        applied
    }

    /// Rebuilds the state from empty with exactly the first `index` events applied.
    pub fn seek(&mut self, index: usize) -> usize {
        self.reset();
        let index = index.min(self.log.len());
        let log = Arc::clone(&self.log);
        for event in &log.events()[..index] {
            self.state.apply(event);
        }
        self.cursor = index;
        self.cursor
    }

    pub fn seek_to_solver(&mut self) -> usize {
        self.seek(self.log.solver_boundary())
    }

    /// Draws the current state onto `surface`, resizing it to the canvas first.
    pub fn render<S: Surface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        let canvas = self.geometry.canvas;
        if surface.size() != canvas {
            surface.resize(canvas)?;
        }
        let markers = self.markers();
        let mut gfx = CpuRenderer::new(surface.frame_mut(), canvas);
        draw_maze(&mut gfx, &self.geometry, &mut self.state, markers);
        Ok(())
    }
}
