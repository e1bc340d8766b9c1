//! Accumulated visual state folded from an event log prefix.
//!
//! [`RenderState::apply`] is the whole replay state machine. Everything in here is a function of
//! the events applied so far, except the highlight counters, which the renderer decays.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    graphics::Color,
    log::{Action, Cell, Edge, Event, Phase},
};

/// Render calls a freshly activated or linked entity stays highlighted for.
pub const FRONTIER_FRAMES: u32 = 6;

/// Hue step per unit of exploration distance.
pub const HUE_STEP: u32 = 10;

/// How explored cells are colored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Hue follows the Manhattan distance from the start cell.
    #[default]
    Distance,
    /// Hue follows the order cells were explored in.
    Step,
}

/// A fully saturated, mid-lightness color on the hue wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HueColor {
    pub hue: u32,
}

impl HueColor {
    pub fn for_distance(distance: u32) -> Self {
        Self {
            hue: distance.wrapping_mul(HUE_STEP) % 360,
        }
    }

    /// `hsl(hue, 100%, 50%)` as opaque RGBA.
    pub fn to_rgba(self) -> Color {
        let h = self.hue as f32 / 60.0;
        let x = 1.0 - ((h % 2.0) - 1.0).abs();
        let (r, g, b) = match self.hue / 60 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        let channel = |v: f32| (v * 255.0).round() as u8;
        [channel(r), channel(g), channel(b), 255]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarvedCell {
    pub coords: Cell,
    pub highlight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEdge {
    pub from: Cell,
    pub to: Cell,
    pub highlight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploredCell {
    pub coords: Cell,
    pub distance: u32,
    pub color: HueColor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploredEdge {
    pub from: Cell,
    pub to: Cell,
    pub color: HueColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEdge {
    pub from: Cell,
    pub to: Cell,
}

/// Visual state after some prefix of the log.
///
/// Maps keep insertion order so drawing order is stable across replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    start: Cell,
    color_mode: ColorMode,
    pub carved_cells: IndexMap<Cell, CarvedCell>,
    pub linked_edges: IndexMap<Edge, LinkedEdge>,
    pub explored_cells: IndexMap<Cell, ExploredCell>,
    pub explored_edges: IndexMap<Edge, ExploredEdge>,
    pub path_cells: IndexMap<Cell, Cell>,
    /// Keyed by position in the path so repeated cells never overwrite each other.
    pub path_edges: IndexMap<(Edge, usize), PathEdge>,
    pub distance_map: IndexMap<Cell, u32>,
    pub max_distance_seen: u32,
    explore_steps: u32,
}

impl RenderState {
    pub fn new(start: Cell) -> Self {
        Self::with_color_mode(start, ColorMode::Distance)
    }

    pub fn with_color_mode(start: Cell, color_mode: ColorMode) -> Self {
        Self {
            start,
            color_mode,
            carved_cells: IndexMap::new(),
            linked_edges: IndexMap::new(),
            explored_cells: IndexMap::new(),
            explored_edges: IndexMap::new(),
            path_cells: IndexMap::new(),
            path_edges: IndexMap::new(),
            distance_map: IndexMap::new(),
            max_distance_seen: 0,
            explore_steps: 0,
        }
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Folds one event into the state. Malformed events and unknown phase/kind pairs are no-ops.
    pub fn apply(&mut self, event: &Event) {
        match (event.phase, &event.action) {
            (Phase::Generate, Action::Activate { cell }) => self.activate(*cell),
            (Phase::Generate, Action::Link { parent, child }) => self.link(*parent, *child),
            (Phase::Solve, Action::Explore { cell, parent }) => self.explore(*cell, *parent),
            (Phase::Solve, Action::Path { cells }) => self.record_path(cells),
            (phase, action) => debug!(?phase, ?action, "ignoring unreplayable event"),
        }
    }

    fn activate(&mut self, cell: Cell) {
        self.carved_cells
            .entry(cell)
            .and_modify(|c| c.highlight = FRONTIER_FRAMES)
            .or_insert(CarvedCell {
                coords: cell,
                highlight: FRONTIER_FRAMES,
            });
    }

    fn link(&mut self, parent: Cell, child: Cell) {
        let highlight = self
            .linked_edges
            .get(&Edge::new(parent, child))
            .map_or(FRONTIER_FRAMES, |e| e.highlight.max(FRONTIER_FRAMES));
        self.linked_edges.insert(
            Edge::new(parent, child),
            LinkedEdge {
                from: parent,
                to: child,
                highlight,
            },
        );
        self.ensure_carved(parent);
        self.ensure_carved(child);
    }

    fn ensure_carved(&mut self, cell: Cell) {
        self.carved_cells
            .entry(cell)
            .and_modify(|c| c.highlight = c.highlight.max(FRONTIER_FRAMES))
            .or_insert(CarvedCell {
                coords: cell,
                highlight: FRONTIER_FRAMES,
            });
    }

    fn explore(&mut self, cell: Cell, parent: Option<Cell>) {
        if self.distance_map.is_empty() {
            self.distance_map.insert(self.start, 0);
        }

        let distance = cell.manhattan(self.start);
        self.distance_map.insert(cell, distance);
        self.max_distance_seen = self.max_distance_seen.max(distance);

        let color = match self.color_mode {
            ColorMode::Distance => HueColor::for_distance(distance),
            ColorMode::Step => HueColor::for_distance(self.explore_steps),
        };
        self.explore_steps = self.explore_steps.saturating_add(1);

        // Colors are fixed at first sight.
        self.explored_cells.entry(cell).or_insert(ExploredCell {
            coords: cell,
            distance,
            color,
        });
        if let Some(parent) = parent {
            self.explored_edges
                .entry(Edge::new(cell, parent))
                .or_insert(ExploredEdge {
                    from: cell,
                    to: parent,
                    color,
                });
        }
    }

    fn record_path(&mut self, cells: &[Cell]) {
        self.path_cells.clear();
        self.path_edges.clear();
        for (i, &cell) in cells.iter().enumerate() {
            self.path_cells.entry(cell).or_insert(cell);
            if i > 0 {
                let prev = cells[i - 1];
                self.path_edges
                    .insert((Edge::new(prev, cell), i), PathEdge { from: prev, to: cell });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Cell {
        Cell::new(x, y)
    }

    #[test]
    fn hue_colors_follow_the_wheel() {
        assert_eq!(HueColor::for_distance(0).to_rgba(), [255, 0, 0, 255]);
        assert_eq!(HueColor::for_distance(12).to_rgba(), [0, 255, 0, 255]);
        assert_eq!(HueColor::for_distance(24).to_rgba(), [0, 0, 255, 255]);
        assert_eq!(HueColor::for_distance(36).hue, 0);
        assert_eq!(HueColor::for_distance(6).to_rgba(), [255, 255, 0, 255]);
    }

    #[test]
    fn activation_resets_highlight_and_link_never_lowers_it() {
        let mut state = RenderState::new(c(0, 0));
        state.apply(&Event::activate(c(0, 0)));
        if let Some(entry) = state.carved_cells.get_mut(&c(0, 0)) {
            entry.highlight = 2;
        }

        state.apply(&Event::activate(c(0, 0)));
        assert_eq!(state.carved_cells[&c(0, 0)].highlight, FRONTIER_FRAMES);

        if let Some(entry) = state.carved_cells.get_mut(&c(0, 0)) {
            entry.highlight = 1;
        }
        state.apply(&Event::link(c(0, 0), c(0, 1)));
        assert_eq!(state.carved_cells[&c(0, 0)].highlight, FRONTIER_FRAMES);
        assert_eq!(state.carved_cells[&c(0, 1)].highlight, FRONTIER_FRAMES);
        assert_eq!(state.linked_edges.len(), 1);
    }

    #[test]
    fn reversed_link_refreshes_the_same_edge() {
        let mut state = RenderState::new(c(0, 0));
        state.apply(&Event::link(c(0, 0), c(1, 0)));
        state.apply(&Event::link(c(1, 0), c(0, 0)));
        assert_eq!(state.linked_edges.len(), 1);
        assert_eq!(state.carved_cells.len(), 2);
    }

    #[test]
    fn first_explore_seeds_start_distance() {
        let mut state = RenderState::new(c(2, 2));
        state.apply(&Event::explore(c(4, 1), Some(c(3, 1))));
        assert_eq!(state.distance_map[&c(2, 2)], 0);
        assert_eq!(state.distance_map[&c(4, 1)], 3);
        assert_eq!(state.max_distance_seen, 3);
        assert_eq!(state.explored_cells[&c(4, 1)].color.hue, 30);
        assert_eq!(state.explored_edges[&Edge::new(c(3, 1), c(4, 1))].color.hue, 30);
    }

    #[test]
    fn step_mode_colors_by_exploration_order() {
        let mut state = RenderState::with_color_mode(c(0, 0), ColorMode::Step);
        state.apply(&Event::explore(c(5, 5), None));
        state.apply(&Event::explore(c(0, 1), None));
        assert_eq!(state.explored_cells[&c(5, 5)].color.hue, 0);
        assert_eq!(state.explored_cells[&c(0, 1)].color.hue, 10);
        assert_eq!(state.explored_cells[&c(5, 5)].distance, 10);
    }

    #[test]
    fn generate_kinds_under_solve_phase_are_ignored() {
        let mut state = RenderState::new(c(0, 0));
        let mut event = Event::activate(c(1, 1));
        event.phase = Phase::Solve;
        state.apply(&event);
        state.apply(&Event {
            phase: Phase::Generate,
            action: Action::Malformed,
        });
        assert_eq!(state, RenderState::new(c(0, 0)));
    }

    #[test]
    fn re_exploring_keeps_the_first_color() {
        let mut state = RenderState::with_color_mode(c(0, 0), ColorMode::Step);
        state.apply(&Event::explore(c(1, 0), Some(c(0, 0))));
        state.apply(&Event::explore(c(2, 0), None));
        state.apply(&Event::explore(c(1, 0), Some(c(0, 0))));
        assert_eq!(state.explored_cells[&c(1, 0)].color.hue, 0);
        assert_eq!(state.explored_edges[&Edge::new(c(0, 0), c(1, 0))].color.hue, 0);
    }

    #[test]
    fn path_with_repeated_cell_keeps_every_edge() {
        let mut state = RenderState::new(c(0, 0));
        state.apply(&Event::path(vec![c(0, 0), c(1, 0), c(0, 0), c(1, 0)]));
        assert_eq!(state.path_cells.len(), 2);
        assert_eq!(state.path_edges.len(), 3);
    }
}
