//! Windowed playback on top of winit + pixels.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use anyhow::Result;
use maze_replay::{PendingTick, PlayerConfig, Surface, SurfaceSize, geometry::MIN_CANVAS};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use tracing::{error, info, warn};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use crate::context::{AppContext, Control};

/// How often a running export is polled while nothing else is scheduled.
const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Window-backed surface. The pixel buffer tracks the maze canvas; the window texture tracks
/// the window and scales the buffer to fit.
pub struct PixelsSurface {
    pixels: Pixels,
    size: SurfaceSize,
}

impl PixelsSurface {
    pub fn new(pixels: Pixels, size: SurfaceSize) -> Self {
        Self { pixels, size }
    }

    pub fn resize_window(&mut self, size: PhysicalSize<u32>) -> Result<(), pixels::Error> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(size.width, size.height)?;
        Ok(())
    }
}

impl Surface for PixelsSurface {
    type Error = pixels::Error;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame(&self) -> &[u8] {
        self.pixels.frame()
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        self.pixels.frame_mut()
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error> {
        self.pixels.resize_buffer(size.width.max(1), size.height.max(1))?;
        self.size = size;
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.pixels.render()
    }
}

fn control_for_key(key: VirtualKeyCode) -> Option<Control> {
    match key {
        VirtualKeyCode::Space => Some(Control::TogglePlayback),
        VirtualKeyCode::J => Some(Control::JumpToSolve),
        VirtualKeyCode::R => Some(Control::Reset),
        VirtualKeyCode::T => Some(Control::ToggleTurbo),
        VirtualKeyCode::G => Some(Control::Export),
        VirtualKeyCode::Up => Some(Control::Faster),
        VirtualKeyCode::Down => Some(Control::Slower),
        _ => None,
    }
}

fn next_control_flow(ctx: &AppContext<PixelsSurface>, now: Instant) -> ControlFlow {
    match ctx.player().pending() {
        Some(PendingTick::Frame) => ControlFlow::Poll,
        Some(PendingTick::Delay { due }) if ctx.player().is_exporting() => {
            ControlFlow::WaitUntil(due.min(now + EXPORT_POLL_INTERVAL))
        }
        Some(PendingTick::Delay { due }) => ControlFlow::WaitUntil(due),
        None if ctx.player().is_exporting() => ControlFlow::WaitUntil(now + EXPORT_POLL_INTERVAL),
        None => ControlFlow::Wait,
    }
}

/// Opens a window sized to the log's canvas and runs the replay until the window closes.
pub fn run(config: PlayerConfig, log_path: &Path) -> Result<()> {
    let event_loop = EventLoop::new();

    // Loading resizes the window to the log's canvas.
    let initial = SurfaceSize::new(MIN_CANVAS, MIN_CANVAS);
    let window = WindowBuilder::new()
        .with_title("Maze Replay")
        .with_inner_size(PhysicalSize::new(initial.width, initial.height))
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
    let pixels = PixelsBuilder::new(initial.width, initial.height, surface_texture).build()?;

    let mut ctx = AppContext::new(config, PixelsSurface::new(pixels, initial));
    match ctx.load(log_path) {
        Ok(()) => {
            let canvas = ctx.player().surface().size();
            window.set_inner_size(PhysicalSize::new(canvas.width, canvas.height));
        }
        // Reported on the status line; the window stays open with controls disabled.
        Err(err) => error!("{err}"),
    }
    window.set_title(&ctx.title());
    info!("controls: Space play/pause, J jump to solver, R reset, T turbo, G export GIF, Up/Down delay, Esc quit");

    event_loop.run(move |event, _, control_flow| {
        let now = Instant::now();
        *control_flow = next_control_flow(&ctx, now);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    if let Err(e) = ctx.player_mut().surface_mut().resize_window(size) {
                        warn!("failed resizing window surface: {e}");
                    }
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    if let Err(e) = ctx.player_mut().surface_mut().resize_window(*new_inner_size) {
                        warn!("failed resizing window surface: {e}");
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    if key == VirtualKeyCode::Escape {
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    if let Some(control) = control_for_key(key) {
                        ctx.apply(control, now);
                        window.set_title(&ctx.title());
                        *control_flow = next_control_flow(&ctx, now);
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => {
                if ctx.player_mut().pump(now, false) || ctx.player().is_exporting() {
                    window.set_title(&ctx.title());
                }
                if ctx.player().pending() == Some(PendingTick::Frame) {
                    window.request_redraw();
                }
                *control_flow = next_control_flow(&ctx, now);
            }
            Event::RedrawRequested(_) => {
                if ctx.player_mut().pump(now, true) {
                    window.set_title(&ctx.title());
                } else if let Err(e) = ctx.player_mut().surface_mut().present() {
                    error!("present failed: {e}");
                    *control_flow = ControlFlow::Exit;
                }
            }
            _ => {}
        }
    });
}
