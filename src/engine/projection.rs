use glam::{IVec2, Vec2};

use crate::{
    engine::{
        clip::clip_wall,
        types::{ProjPlane, Screen, Viewer},
    },
    world::{Camera, EPSILON, Scene, Sector, WallId},
};

/// Horizontal projection of a camera-space `(x, depth)` point.
#[inline]
pub fn x_projection(cam: &Camera, p: Vec2) -> f32 {
    p.x * cam.near / (p.y + EPSILON)
}

/// Projected `(top, bottom)` of a sector span seen at `depth`.
///
/// Heights are absolute; the eye height is taken from `cam.position.y`.
#[inline]
pub fn y_projection(cam: &Camera, depth: f32, floor: f32, ceil: f32) -> Vec2 {
    let eye = cam.position.y;
    Vec2::new(ceil - eye, floor - eye) * (cam.near / (depth + EPSILON))
}

/// Projection plane → pixel. Higher world y maps to a smaller screen y.
#[inline]
pub fn to_screen(projected: Vec2, plane: ProjPlane, screen: Screen) -> IVec2 {
    let sx = (projected.x / plane.w + 0.5) * (screen.w - 1) as f32;
    let sy = (1.0 - (projected.y / plane.h + 0.5)) * (screen.h - 1) as f32;
    IVec2::new(sx.round() as i32, sy.round() as i32)
}

/// Screen-space quad of one clipped wall.
///
/// `corners` follow the wall's own direction, counter-clockwise:
///
/// ```text
///   0 ── 3      0 = p0 ceiling   3 = p1 ceiling
///   │    │
///   1 ── 2      1 = p0 floor     2 = p1 floor
/// ```
///
/// `depth` holds the camera-space depth of p0 and p1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallQuad {
    pub corners: [IVec2; 4],
    pub depth: [f32; 2],
}

impl WallQuad {
    /// p1 projects to the left of p0.
    #[inline]
    pub fn reversed(&self) -> bool {
        self.corners[2].x < self.corners[0].x
    }

    /// Leftmost and rightmost column.
    pub fn x_span(&self) -> (i32, i32) {
        let (l, r) = (self.corners[0].x, self.corners[2].x);
        if self.reversed() { (r, l) } else { (l, r) }
    }

    /// Depth at the leftmost and rightmost column.
    pub fn z_span(&self) -> (f32, f32) {
        let [z0, z1] = self.depth;
        if self.reversed() { (z1, z0) } else { (z0, z1) }
    }

    /// Corners reordered left to right: top-left, bottom-left,
    /// bottom-right, top-right.
    pub fn mask_corners(&self) -> [IVec2; 4] {
        let (x1, x2) = self.x_span();
        let c = &self.corners;
        let ys = if self.reversed() {
            [c[3].y, c[2].y, c[1].y, c[0].y]
        } else {
            [c[0].y, c[1].y, c[2].y, c[3].y]
        };
        [
            IVec2::new(x1, ys[0]),
            IVec2::new(x1, ys[1]),
            IVec2::new(x2, ys[2]),
            IVec2::new(x2, ys[3]),
        ]
    }
}

/// Transform, clip and project wall `wall_id` as seen inside `sector`.
///
/// `None` when the wall is culled for this frame.
pub fn project_wall(view: &Viewer, scene: &Scene, wall_id: WallId, sector: &Sector) -> Option<WallQuad> {
    let cam = &view.camera;
    let [a, b] = scene.wall_points(wall_id);
    let (a, b) = (cam.to_cam(a), cam.to_cam(b));

    let [c0, c1] = clip_wall([Vec2::new(a.x, a.z), Vec2::new(b.x, b.z)], cam)?;

    let x0 = x_projection(cam, c0);
    let x1 = x_projection(cam, c1);
    let y0 = y_projection(cam, c0.y, sector.floor_height, sector.ceil_height);
    let y1 = y_projection(cam, c1.y, sector.floor_height, sector.ceil_height);

    let projected = [
        Vec2::new(x0, y0.x),
        Vec2::new(x0, y0.y),
        Vec2::new(x1, y1.y),
        Vec2::new(x1, y1.x),
    ];

    Some(WallQuad {
        corners: projected.map(|p| to_screen(p, view.plane, view.screen)),
        depth: [c0.y, c1.y],
    })
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
