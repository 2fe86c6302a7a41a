//! Per-column wall rasterizer.

use crate::{
    engine::{
        mask::{self, MaskId, Masks},
        projection::WallQuad,
    },
    renderer::{
        PixelFormat, Rgba,
        palette::{CEILING, FLOOR, shade},
        target::ColumnBand,
    },
    world::{clamp_to, lerp_round},
};

/// What a wall paints besides the floor / ceiling strips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    /// Depth-tested wall face.
    Solid,
    /// Opening; only the steps where this sector is tighter than the
    /// camera's sector are painted.
    Portal { upper: bool, lower: bool },
}

/// Everything one column job needs to paint its share of a wall.
#[derive(Clone, Copy, Debug)]
pub struct WallSection {
    pub quad: WallQuad,
    /// Unclamped left / right column of the whole wall.
    pub x1: i32,
    pub x2: i32,
    /// Camera depth at `x1` / `x2`.
    pub z1: f32,
    pub z2: f32,
    pub far: f32,
    pub mask: MaskId,
    pub colour: Rgba,
    pub kind: SectionKind,
}

impl WallSection {
    pub fn new(quad: WallQuad, far: f32, mask: MaskId, colour: Rgba, kind: SectionKind) -> Self {
        let (x1, x2) = quad.x_span();
        let (z1, z2) = quad.z_span();
        Self {
            quad,
            x1,
            x2,
            z1,
            z2,
            far,
            mask,
            colour,
            kind,
        }
    }

    /// Paint the columns of `band` this wall covers. Returns how many columns
    /// were painted.
    pub fn draw(&self, band: &mut ColumnBand<'_>, masks: &Masks, format: &PixelFormat) -> usize {
        let Some((w0, w1)) = mask::draw_width(masks, self.mask) else {
            return 0;
        };
        let (b0, b1) = band.range();
        let lo = self.x1.max(w0).max(b0);
        let hi = self.x2.min(w1).min(b1);

        let solid = self.kind == SectionKind::Solid;
        let span = self.x2 as f32 - self.x1 as f32;
        let [c0, c1, c2, c3] = self.quad.corners;
        let ceiling = format.pack(CEILING);
        let floor = format.pack(FLOOR);

        let mut painted = 0;
        for x in lo..=hi {
            let mut t = if span == 0.0 { 0.0 } else { (x as f32 - self.x1 as f32) / span };
            let depth = (self.z1 + (self.z2 - self.z1) * t) / self.far;

            if solid && depth > band.depth(x) {
                continue;
            }
            if self.quad.reversed() {
                t = 1.0 - t;
            }
            let Some((top, bottom)) = mask::draw_height(masks, self.mask, x) else {
                continue;
            };
            if solid {
                band.set_depth(x, depth);
            }

            let y0 = clamp_to(lerp_round(c0.y, c3.y, t), top, bottom);
            let y1 = clamp_to(lerp_round(c1.y, c2.y, t), top, bottom);
            let face = format.pack(shade(self.colour, depth));

            band.vline(x, top, y0, ceiling);
            band.vline(x, y1, bottom, floor);
            match self.kind {
                SectionKind::Solid => band.vline(x, y0, y1, face),
                SectionKind::Portal { upper, lower } => {
                    if upper {
                        band.vline(x, top, y0, face);
                    }
                    if lower {
                        band.vline(x, y1, bottom, face);
                    }
                }
            }
            painted += 1;
        }
        painted
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
