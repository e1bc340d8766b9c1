pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graphics;
pub mod log;
pub mod regression;
pub mod render;
pub mod replay;
pub mod scheduler;
pub mod state;
pub mod status;
pub mod surface;

pub use config::PlayerConfig;
pub use error::{ExportError, LoadError};
pub use export::{EncodeJob, EncoderFactory, FrameEncoder, GifEncoderFactory};
pub use geometry::Geometry;
pub use log::{Action, Cell, Edge, Event, EventLog, GridSize, Phase};
pub use replay::Replay;
pub use scheduler::{PendingTick, PlaybackState, Player};
pub use state::{ColorMode, RenderState};
pub use status::{Status, StatusSink, TracingStatusSink};
pub use surface::{RgbaBufferSurface, Surface, SurfaceSize};
