use glam::{Mat3, Vec2, Vec3};

/// How the camera maps camera space onto the projection plane.
///
/// Only the perspective mapping is implemented; the other kinds are accepted
/// and rendered with perspective math.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProjectionKind {
    #[default]
    None,
    Perspective,
    Orthographic,
}

/// View-point in world space.
///
/// * World space is y-up: the map plane is (x, z), heights live on y.
/// * `direction` must be normalised by the caller.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fov: f32, // horizontal FoV (radians)
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub direction: Vec3,
    pub projection: ProjectionKind,
}

impl Camera {
    /// Perspective camera at `position` looking along `direction`.
    pub fn new(position: Vec3, direction: Vec3, fov: f32, aspect_ratio: f32) -> Self {
        Self {
            fov,
            aspect_ratio,
            near: 0.1,
            far: 100.0,
            position,
            direction: direction.normalize_or(Vec3::Z),
            projection: ProjectionKind::Perspective,
        }
    }

    /// Heading around the vertical axis; 0 looks down +z.
    #[inline]
    pub fn heading(&self) -> f32 {
        self.direction.x.atan2(self.direction.z)
    }

    /// Transform a map-plane point into camera-local coords:
    ///  .x = lateral offset (+ right)
    ///  .y = height relative to the eye
    ///  .z = depth along the forward axis
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec3 {
        let world = Vec3::new(p.x, 0.0, p.y);
        Mat3::from_rotation_y(-self.heading()) * (world - self.position)
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Unit vector pointing where the camera looks on the map plane.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.direction.x, 0.0, self.direction.z).normalize_or(Vec3::Z)
    }

    /// Unit vector pointing to the camera's right on the map plane.
    #[inline]
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.forward())
    }

    /// Move by `forward` units and `side` (strafe), preserving height.
    pub fn step(&mut self, forward: f32, side: f32) {
        self.position += self.forward() * forward + self.right() * side;
    }

    /// Rotate the view direction around the vertical axis.
    pub fn turn(&mut self, delta: f32) {
        self.direction = (Mat3::from_rotation_y(delta) * self.direction).normalize_or(Vec3::Z);
    }

    /// Map-plane position (x, z) of the eye.
    #[inline]
    pub fn map_pos(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
