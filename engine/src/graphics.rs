use crate::surface::SurfaceSize;

pub type Color = [u8; 4];

/// Parses `#rrggbb` at compile time.
pub const fn hex_color(hex: &str) -> Color {
    const fn nibble(b: u8) -> u8 {
        match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => 0,
        }
    }
    let b = hex.as_bytes();
    if b.len() != 7 || b[0] != b'#' {
        return [0, 0, 0, 255];
    }
    [
        nibble(b[1]) * 16 + nibble(b[2]),
        nibble(b[3]) * 16 + nibble(b[4]),
        nibble(b[5]) * 16 + nibble(b[6]),
        255,
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }
}

/// 2D drawing interface used by the maze renderer.
///
/// Maze code only talks to this trait; the backing store is whatever RGBA buffer the
/// implementation wraps (an offscreen export buffer or a window's pixel buffer).
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    /// Opaque fill, clipped to the surface.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Opaque disc centered on `(cx, cy)`; pixels whose centers fall inside `radius` are filled.
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    fn has_backing(&self) -> bool {
        let expected = self.size.rgba_len();
        expected != 0 && self.frame.len() >= expected
    }

    fn put_span(&mut self, x0: u32, x1: u32, y: u32, color: Color) {
        let stride = self.size.width as usize * 4;
        let start = y as usize * stride + x0 as usize * 4;
        let end = y as usize * stride + x1 as usize * 4;
        for px in self.frame[start..end].chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let max_x = rect.x.saturating_add(rect.w).min(self.size.width);
        let max_y = rect.y.saturating_add(rect.h).min(self.size.height);
        if rect.x >= max_x || rect.y >= max_y || !self.has_backing() {
            return;
        }

        for y in rect.y..max_y {
            self.put_span(rect.x, max_x, y, color);
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 || !self.has_backing() {
            return;
        }

        let r2 = radius * radius;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(self.size.height);
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            let rem = r2 - dy * dy;
            if rem < 0.0 {
                continue;
            }
            // Pixel centers within the chord at this row.
            let half = rem.sqrt();
            let x0 = (cx - half - 0.5).ceil().max(0.0) as u32;
            let x1 = ((cx + half - 0.5).floor() + 1.0).max(0.0) as u32;
            let x1 = x1.min(self.size.width);
            if x0 < x1 {
                self.put_span(x0, x1, y, color);
            }
        }
    }
}
