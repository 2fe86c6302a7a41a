pub mod arena;
pub mod clip;
pub mod mask;
pub mod pipeline;
pub mod projection;
pub mod types;

pub use pipeline::{FrameReport, PortalRenderer, SectorVisit, build_pool, render, render_parallel};
