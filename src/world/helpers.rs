use glam::Vec2;

use super::{Scene, SectorId};

/// Tolerance shared by every clip and intersection test.
pub const EPSILON: f32 = 1e-6;

#[inline]
pub fn is_zero(n: f32) -> bool {
    n < EPSILON && n > -EPSILON
}

/// Clamp that tolerates `lo > hi` (then `lo` wins).
#[inline]
pub fn clamp_to(v: i32, lo: i32, hi: i32) -> i32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// `a + (b - a)·t`, rounded half away from zero.
#[inline]
pub fn lerp_round(a: i32, b: i32, t: f32) -> i32 {
    (a as f32 + (b as f32 - a as f32) * t).round() as i32
}

/// Intersection of segments `a0→a1` and `b0→b1`.
///
/// Returns the point and its parameter `t ∈ [0, 1]` along `a`. Parallel
/// (|r × s| < ε) or non-overlapping segments yield `None`.
pub fn segment_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<(Vec2, f32)> {
    let r = a1 - a0;
    let s = b1 - b0;

    let r_cross_s = r.perp_dot(s);
    if is_zero(r_cross_s) {
        return None;
    }

    let qp = b0 - a0;
    let t = qp.perp_dot(s) / r_cross_s;
    let u = qp.perp_dot(r) / r_cross_s;

    if !((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)) {
        return None;
    }
    Some((a0 + r * t, t))
}

// ──────────────────────────────────────────────────────────────────────────
//                       Scene – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl Scene {
    /// Sector the viewer ends up in after moving `from → to` on the map plane.
    ///
    /// Only portal walls of `current` are considered; crossing one hands the
    /// viewer to the sector on its far side. A move that stops on a portal
    /// keeps `current`; the hand-over happens once `to` is strictly past it.
    /// Solid walls are ignored, that is collision response and belongs to
    /// the caller.
    pub fn sector_after_move(&self, current: SectorId, from: Vec2, to: Vec2) -> SectorId {
        let Some(sector) = self.sectors.get(current as usize) else {
            return current;
        };

        for &wall_id in &sector.walls {
            let wall = &self.walls[wall_id as usize];
            let Some(next) = wall.other_side(current).filter(|_| wall.is_portal) else {
                continue;
            };
            let [p0, p1] = self.wall_points(wall_id);
            let side = |p: Vec2| (p1 - p0).perp_dot(p - p0);

            let to_side = side(to);
            if is_zero(to_side) || segment_intersection(p0, p1, to, from).is_none() {
                continue;
            }
            let from_side = side(from);
            let crossed = if is_zero(from_side) {
                // starting on the portal: only stepping into `next` counts
                self.sector_contains(next, to)
            } else {
                from_side.signum() != to_side.signum()
            };
            if crossed {
                return next;
            }
        }
        current
    }

    /// Even-odd point-in-sector test over every wall cycle of `sector`.
    pub fn sector_contains(&self, sector: SectorId, p: Vec2) -> bool {
        let Some(sector) = self.sectors.get(sector as usize) else {
            return false;
        };
        let mut inside = false;
        for &wall_id in &sector.walls {
            let [a, b] = self.wall_points(wall_id);
            if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y) {
                inside = !inside;
            }
        }
        inside
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
