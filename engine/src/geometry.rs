use crate::{
    graphics::Rect,
    log::{Cell, GridSize},
    surface::SurfaceSize,
};

/// Pixel budget the larger grid dimension is scaled to.
pub const PIXEL_BUDGET: u32 = 720;
/// Smallest canvas extent in either dimension.
pub const MIN_CANVAS: u32 = 320;
/// Largest grid dimension that gets a layout. At the minimum cell pitch this keeps the canvas
/// under 6200 pixels per side.
pub const MAX_GRID_DIM: u32 = 1024;

/// Cell size, spacing and canvas placement for one grid.
///
/// Cells are laid out with `spacing` pixels of wall between them and around the border, and the
/// maze is centered on a canvas that is never smaller than [`MIN_CANVAS`]. Dimensions past
/// [`MAX_GRID_DIM`] are laid out as if they were [`MAX_GRID_DIM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cell_size: u32,
    pub spacing: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub maze_width: u32,
    pub maze_height: u32,
    pub canvas: SurfaceSize,
}

impl Geometry {
    pub fn for_grid(grid: GridSize) -> Self {
        let grid = GridSize::new(grid.width.min(MAX_GRID_DIM), grid.height.min(MAX_GRID_DIM));
        let max_dim = grid.width.max(grid.height).max(1);
        let base = (PIXEL_BUDGET / max_dim).max(6);
        let spacing = (base / 3).max(2);
        let cell_size = base.saturating_sub(spacing).max(3);

        let extent = |n: u32| n * cell_size + (n + 1) * spacing;
        let maze_width = extent(grid.width);
        let maze_height = extent(grid.height);

        let canvas = SurfaceSize::new(maze_width.max(MIN_CANVAS), maze_height.max(MIN_CANVAS));

        Self {
            cell_size,
            spacing,
            offset_x: (canvas.width - maze_width) / 2,
            offset_y: (canvas.height - maze_height) / 2,
            maze_width,
            maze_height,
            canvas,
        }
    }

    /// Whether a grid of this size gets a layout without clamping.
    pub fn fits(grid: GridSize) -> bool {
        (1..=MAX_GRID_DIM).contains(&grid.width) && (1..=MAX_GRID_DIM).contains(&grid.height)
    }

    fn axis(&self, n: i32, offset: u32) -> Option<u32> {
        let n = u32::try_from(n).ok()?;
        let step = self.cell_size.checked_add(self.spacing)?;
        n.checked_mul(step)?
            .checked_add(offset)?
            .checked_add(self.spacing)
    }

    /// Start of the wall gap after cell `n` along one axis.
    fn gap(&self, n: i32, offset: u32) -> Option<u32> {
        let n = u32::try_from(n).ok()?;
        let step = self.cell_size.checked_add(self.spacing)?;
        n.checked_add(1)?.checked_mul(step)?.checked_add(offset)
    }

    /// Pixel rect covered by a cell. Negative coordinates have no placement.
    pub fn cell_rect(&self, cell: Cell) -> Option<Rect> {
        let x = self.axis(cell.x, self.offset_x)?;
        let y = self.axis(cell.y, self.offset_y)?;
        Some(Rect::new(x, y, self.cell_size, self.cell_size))
    }

    /// Pixel rect of the wall gap bridged by an edge.
    ///
    /// Only edges along a row or column have a placement; diagonal pairs are not drawn.
    pub fn edge_rect(&self, from: Cell, to: Cell) -> Option<Rect> {
        if from.x == to.x {
            let x = self.axis(from.x, self.offset_x)?;
            let y = self.gap(from.y.min(to.y), self.offset_y)?;
            Some(Rect::new(x, y, self.cell_size, self.spacing))
        } else if from.y == to.y {
            let y = self.axis(from.y, self.offset_y)?;
            let x = self.gap(from.x.min(to.x), self.offset_x)?;
            Some(Rect::new(x, y, self.spacing, self.cell_size))
        } else {
            None
        }
    }

    pub fn cell_center(&self, cell: Cell) -> Option<(f32, f32)> {
        let rect = self.cell_rect(cell)?;
        let half = self.cell_size as f32 / 2.0;
        Some((rect.x as f32 + half, rect.y as f32 + half))
    }

    pub fn marker_radius(&self) -> f32 {
        (self.cell_size as f32 / 2.5).max(3.0)
    }
}
