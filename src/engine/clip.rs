//! Camera-space clipping of wall segments.
//!
//! Points are `(x, depth)`: `x` is the lateral offset, `y` the distance along
//! the view axis. The view volume is the wedge between the two ±fov/2 rays,
//! cut at depth 0 and at the far distance.

use glam::Vec2;

use crate::world::{Camera, is_zero, segment_intersection};

/// Clip `seg` to the view volume. `None` when nothing visible is left.
pub fn clip_wall(seg: [Vec2; 2], cam: &Camera) -> Option<[Vec2; 2]> {
    let [a, b] = seg;
    if (a.y < 0.0 && b.y < 0.0) || (a.y > cam.far && b.y > cam.far) {
        return None;
    }

    let mut seg = seg;
    clip_depth(&mut seg, 0.0, |z| z < 0.0)?;
    clip_depth(&mut seg, cam.far, |z| z > cam.far)?;
    clip_frustum(&mut seg, cam)?;

    let d = seg[1] - seg[0];
    if is_zero(d.x) && is_zero(d.y) {
        return None;
    }
    Some(seg)
}

/// Pull the endpoint lying on the `outside` side of `depth = plane` onto it.
///
/// At most one endpoint can be outside; both-outside is rejected up front.
fn clip_depth(seg: &mut [Vec2; 2], plane: f32, outside: impl Fn(f32) -> bool) -> Option<()> {
    for (out, keep) in [(0, 1), (1, 0)] {
        if outside(seg[out].y) {
            let dir = seg[out] - seg[keep];
            if is_zero(dir.y) {
                return None;
            }
            let t = (plane - seg[keep].y) / dir.y;
            seg[out] = Vec2::new(seg[keep].x + dir.x * t, plane);
            break;
        }
    }
    Some(())
}

/// Trim against the two side rays of the view wedge.
fn clip_frustum(seg: &mut [Vec2; 2], cam: &Camera) -> Option<()> {
    let half = cam.fov * 0.5;
    let theta = [seg[0].x.atan2(seg[0].y), seg[1].x.atan2(seg[1].y)];

    if (theta[0] > half && theta[1] > half) || (theta[0] < -half && theta[1] < -half) {
        return None; // fully past one side
    }

    let reach = cam.far * half.tan();
    let right = segment_intersection(seg[0], seg[1], Vec2::ZERO, Vec2::new(reach, cam.far));
    let left = segment_intersection(seg[0], seg[1], Vec2::ZERO, Vec2::new(-reach, cam.far));

    // left→right walls keep their start on the left ray and end on the right
    let ascending = theta[0] <= theta[1];
    if let Some((p, _)) = right {
        seg[if ascending { 1 } else { 0 }] = p;
    }
    if let Some((p, _)) = left {
        seg[if ascending { 0 } else { 1 }] = p;
    }
    Some(())
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
