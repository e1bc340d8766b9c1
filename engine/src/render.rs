//! Maze rasterization.
//!
//! Drawing is not read-only: every carved cell and linked edge drawn while highlighted loses one
//! frame of highlight. Two consecutive draws with no new generate events therefore fade the
//! frontier by two frames.

use crate::{
    geometry::Geometry,
    graphics::{Color, Renderer2d, hex_color},
    log::Cell,
    state::RenderState,
};

pub const COLOR_FLOOR: Color = hex_color("#000000");
pub const COLOR_WALL: Color = hex_color("#ffffff");
pub const COLOR_FRONTIER: Color = hex_color("#ff00ff");
pub const COLOR_PATH: Color = hex_color("#ff0000");
pub const COLOR_START: Color = hex_color("#00ffa3");
pub const COLOR_TARGET: Color = hex_color("#f87171");
pub const COLOR_MARKER_OUTLINE: Color = hex_color("#050608");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub start: Cell,
    pub target: Cell,
}

fn highlight_color(highlight: u32) -> Color {
    if highlight > 0 { COLOR_FRONTIER } else { COLOR_WALL }
}

fn fill_cell(gfx: &mut dyn Renderer2d, geometry: &Geometry, cell: Cell, color: Color) {
    if let Some(rect) = geometry.cell_rect(cell) {
        gfx.fill_rect(rect, color);
    }
}

fn fill_edge(gfx: &mut dyn Renderer2d, geometry: &Geometry, from: Cell, to: Cell, color: Color) {
    if let Some(rect) = geometry.edge_rect(from, to) {
        gfx.fill_rect(rect, color);
    }
}

fn draw_marker(gfx: &mut dyn Renderer2d, geometry: &Geometry, cell: Cell, color: Color) {
    let Some((cx, cy)) = geometry.cell_center(cell) else {
        return;
    };
    let radius = geometry.marker_radius();
    gfx.fill_circle(cx, cy, radius + 0.5, COLOR_MARKER_OUTLINE);
    gfx.fill_circle(cx, cy, radius - 0.5, color);
}

/// Draws one full frame and decays frontier highlights.
///
/// Layers, back to front: floor, linked edges, carved cells, exploration, path, markers.
pub fn draw_maze(
    gfx: &mut dyn Renderer2d,
    geometry: &Geometry,
    state: &mut RenderState,
    markers: Markers,
) {
    gfx.begin_frame(geometry.canvas);
    gfx.clear(COLOR_FLOOR);

    for edge in state.linked_edges.values_mut() {
        fill_edge(gfx, geometry, edge.from, edge.to, highlight_color(edge.highlight));
        edge.highlight = edge.highlight.saturating_sub(1);
    }
    for cell in state.carved_cells.values_mut() {
        fill_cell(gfx, geometry, cell.coords, highlight_color(cell.highlight));
        cell.highlight = cell.highlight.saturating_sub(1);
    }

    for edge in state.explored_edges.values() {
        fill_edge(gfx, geometry, edge.from, edge.to, edge.color.to_rgba());
    }
    for cell in state.explored_cells.values() {
        fill_cell(gfx, geometry, cell.coords, cell.color.to_rgba());
    }

    for edge in state.path_edges.values() {
        fill_edge(gfx, geometry, edge.from, edge.to, COLOR_PATH);
    }
    for &cell in state.path_cells.values() {
        fill_cell(gfx, geometry, cell, COLOR_PATH);
    }

    draw_marker(gfx, geometry, markers.start, COLOR_START);
    draw_marker(gfx, geometry, markers.target, COLOR_TARGET);
}
