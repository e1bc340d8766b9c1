use std::convert::Infallible;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// A resizable RGBA surface the maze is drawn onto.
///
/// The player renders into `frame_mut()` and hands `frame()` to the exporter, so the same code
/// path serves a window's pixel buffer and an offscreen buffer.
pub trait Surface {
    type Error;

    fn size(&self) -> SurfaceSize;
    fn frame(&self) -> &[u8];
    fn frame_mut(&mut self) -> &mut [u8];

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error>;
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// In-memory RGBA surface for headless export and tests.
#[derive(Debug, Clone)]
pub struct RgbaBufferSurface {
    size: SurfaceSize,
    buf: Vec<u8>,
}

impl RgbaBufferSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let px = self.buf.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl Surface for RgbaBufferSurface {
    type Error = Infallible;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame(&self) -> &[u8] {
        &self.buf
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error> {
        self.size = size;
        self.buf.resize(size.rgba_len(), 0u8);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_reallocates_and_pixel_reads_are_bounded() {
        let mut surface = RgbaBufferSurface::new(SurfaceSize::new(1, 1));
        surface.frame_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(surface.pixel(0, 0), Some([1, 2, 3, 4]));

        surface.resize(SurfaceSize::new(3, 2)).expect("buffer resize");
        assert_eq!(surface.frame().len(), 24);
        assert_eq!(surface.pixel(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(3, 0), None);
    }
}
