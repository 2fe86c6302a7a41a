//! Portal-based sector renderer drawing on the CPU.
//!
//! * [`map`] reads the text scene format into a [`Scene`].
//! * [`engine`] walks the sectors visible from a [`Camera`] through portals.
//! * [`renderer`] owns the pixel surface and the per-column rasterizer.

pub mod engine;
pub mod map;
pub mod renderer;
pub mod world;

pub use engine::{FrameReport, PortalRenderer, SectorVisit, build_pool, render, render_parallel};
pub use map::{LoadError, ParseErrorKind, Position, load_scene, parse_scene};
pub use renderer::{PixelFormat, Rgba, Surface, SurfaceError};
pub use world::{Camera, Scene, Sector, SectorId, Wall, WallId};
