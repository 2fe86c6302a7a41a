mod camera;
mod geometry;
mod helpers;

pub use geometry::{Scene, Sector, SectorId, Vertex, VertexId, Wall, WallId};

pub use camera::{Camera, ProjectionKind};

pub use helpers::{EPSILON, clamp_to, is_zero, lerp_round, segment_intersection};
