//! Portal masks: the screen region a sector may draw into.
//!
//! Every mask node is the quad of the portal it was seen through, chained to
//! the mask of the sector that portal belongs to. Effective bounds are the
//! node's own bounds clamped by each ancestor in turn.

use glam::IVec2;
use crate::{
    engine::{
        arena::{ArenaId, FrameArena},
        types::Screen,
    },
    world::{SectorId, clamp_to, lerp_round},
};

pub type MaskId = ArenaId<PortalMask>;
pub type Masks = FrameArena<PortalMask>;

/// Screen quad ordered top-left, bottom-left, bottom-right, top-right.
/// Coordinates are unclamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortalMask {
    pub corners: [IVec2; 4],
    pub parent: Option<MaskId>,
    /// Sector drawn through this mask.
    pub sector: SectorId,
}

impl PortalMask {
    /// The whole surface, no ancestor.
    pub fn root(screen: Screen, sector: SectorId) -> Self {
        let (r, b) = (screen.w - 1, screen.h - 1);
        Self {
            corners: [
                IVec2::new(0, 0),
                IVec2::new(0, b),
                IVec2::new(r, b),
                IVec2::new(r, 0),
            ],
            parent: None,
            sector,
        }
    }

    #[inline]
    pub fn x_range(&self) -> (i32, i32) {
        (self.corners[0].x, self.corners[3].x)
    }

    /// `(top, bottom)` of this node alone at column `x`; `None` when the node
    /// has no horizontal extent.
    pub fn height_at(&self, x: i32) -> Option<(i32, i32)> {
        let [tl, bl, br, tr] = self.corners;
        // corners of walls touching depth 0 can sit near i32::MIN / MAX
        let l = i64::from(tr.x) - i64::from(tl.x);
        if l == 0 {
            return None;
        }
        let t = (i64::from(x) - i64::from(tl.x)) as f32 / l as f32;
        Some((lerp_round(tl.y, tr.y, t), lerp_round(bl.y, br.y, t)))
    }
}

/// Walk from `id` up to the root.
pub fn chain(masks: &Masks, id: MaskId) -> impl Iterator<Item = &PortalMask> {
    let mut next = Some(id);
    std::iter::from_fn(move || {
        let node = masks.get(next?);
        next = node.parent;
        Some(node)
    })
}

/// Effective `[x0, x1]` column range of `id`; `None` when empty.
pub fn draw_width(masks: &Masks, id: MaskId) -> Option<(i32, i32)> {
    let mut nodes = chain(masks, id);
    let (mut x0, mut x1) = nodes.next()?.x_range();
    for node in nodes {
        let (lo, hi) = node.x_range();
        x0 = clamp_to(x0, lo, hi);
        x1 = clamp_to(x1, lo, hi);
    }
    (x1 > x0).then_some((x0, x1))
}

/// Effective `(top, bottom)` rows of `id` at column `x`.
///
/// `None` when any node in the chain has zero width.
pub fn draw_height(masks: &Masks, id: MaskId, x: i32) -> Option<(i32, i32)> {
    let mut nodes = chain(masks, id);
    let (mut top, mut bottom) = nodes.next()?.height_at(x)?;
    for node in nodes {
        let (lo, hi) = node.height_at(x)?;
        top = clamp_to(top, lo, hi);
        bottom = clamp_to(bottom, lo, hi);
    }
    Some((top, bottom))
}

/// Is `sector` already drawn somewhere along the chain of `id`?
pub fn on_path(masks: &Masks, id: MaskId, sector: SectorId) -> bool {
    chain(masks, id).any(|m| m.sector == sector)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x0: i32, x1: i32, top: i32, bottom: i32) -> [IVec2; 4] {
        [
            IVec2::new(x0, top),
            IVec2::new(x0, bottom),
            IVec2::new(x1, bottom),
            IVec2::new(x1, top),
        ]
    }

    fn setup() -> (Masks, MaskId) {
        let mut masks = Masks::default();
        let root = masks.alloc(PortalMask::root(Screen { w: 100, h: 50 }, 0));
        (masks, root)
    }

    #[test]
    fn root_covers_surface() {
        let (masks, root) = setup();
        assert_eq!(draw_width(&masks, root), Some((0, 99)));
        assert_eq!(draw_height(&masks, root, 0), Some((0, 49)));
        assert_eq!(draw_height(&masks, root, 99), Some((0, 49)));
    }

    #[test]
    fn child_is_clamped_by_ancestors() {
        let (mut masks, root) = setup();
        let a = masks.alloc(PortalMask {
            corners: quad(-20, 60, -10, 30),
            parent: Some(root),
            sector: 1,
        });
        let b = masks.alloc(PortalMask {
            corners: quad(40, 80, 5, 45),
            parent: Some(a),
            sector: 2,
        });

        assert_eq!(draw_width(&masks, a), Some((0, 60)));
        assert_eq!(draw_width(&masks, b), Some((40, 60)));
        assert_eq!(draw_height(&masks, a, 10), Some((0, 30)));
        assert_eq!(draw_height(&masks, b, 50), Some((5, 30)));
    }

    #[test]
    fn slanted_height_interpolates() {
        let (mut masks, root) = setup();
        let m = masks.alloc(PortalMask {
            corners: [
                IVec2::new(10, 10),
                IVec2::new(10, 40),
                IVec2::new(30, 30),
                IVec2::new(30, 20),
            ],
            parent: Some(root),
            sector: 1,
        });
        assert_eq!(draw_height(&masks, m, 10), Some((10, 40)));
        assert_eq!(draw_height(&masks, m, 20), Some((15, 35)));
        assert_eq!(draw_height(&masks, m, 30), Some((20, 30)));
    }

    #[test]
    fn zero_width_node_aborts() {
        let (mut masks, root) = setup();
        let thin = masks.alloc(PortalMask {
            corners: quad(20, 20, 0, 40),
            parent: Some(root),
            sector: 1,
        });
        let child = masks.alloc(PortalMask {
            corners: quad(10, 30, 0, 40),
            parent: Some(thin),
            sector: 2,
        });
        assert_eq!(draw_width(&masks, thin), None);
        assert_eq!(draw_height(&masks, child, 20), None);
    }

    #[test]
    fn disjoint_child_has_no_width() {
        let (mut masks, root) = setup();
        let a = masks.alloc(PortalMask {
            corners: quad(10, 20, 0, 40),
            parent: Some(root),
            sector: 1,
        });
        let b = masks.alloc(PortalMask {
            corners: quad(30, 40, 0, 40),
            parent: Some(a),
            sector: 2,
        });
        assert_eq!(draw_width(&masks, b), None);
    }

    #[test]
    fn on_path_walks_every_ancestor() {
        let (mut masks, root) = setup();
        let a = masks.alloc(PortalMask {
            corners: quad(10, 20, 0, 40),
            parent: Some(root),
            sector: 3,
        });
        assert_eq!(chain(&masks, a).map(|m| m.sector).collect::<Vec<_>>(), vec![3, 0]);
        assert!(on_path(&masks, a, 0));
        assert!(!on_path(&masks, a, 7));
    }
}
