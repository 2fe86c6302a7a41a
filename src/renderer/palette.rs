//! Placeholder wall colours.
//!
//! A pure function of the wall index: the same wall gets the same colour in
//! every frame and on every thread, with no RNG state anywhere.

use crate::{renderer::Rgba, world::WallId};

pub const PALETTE_SEED: u64 = 6_942_080_085;

/// Dim grey painted above walls.
pub const CEILING: Rgba = [35, 35, 35, 255];
/// Dark red painted below walls.
pub const FLOOR: Rgba = [100, 24, 24, 255];

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Opaque colour of wall `index`.
pub fn wall_colour(index: WallId) -> Rgba {
    let bits = splitmix64(PALETTE_SEED ^ u64::from(index).wrapping_mul(0x9E37_79B9));
    let [r, g, b, ..] = bits.to_le_bytes();
    [r, g, b, 255]
}

/// `colour` faded linearly towards black; `depth` is 0 at the eye, 1 at far.
#[inline]
pub fn shade(colour: Rgba, depth: f32) -> Rgba {
    let k = 1.0 - depth;
    let [r, g, b, _] = colour;
    [
        (r as f32 * k) as u8,
        (g as f32 * k) as u8,
        (b as f32 * k) as u8,
        255,
    ]
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_are_stable_and_opaque() {
        for i in 0..64 {
            assert_eq!(wall_colour(i), wall_colour(i));
            assert_eq!(wall_colour(i)[3], 255);
        }
    }

    #[test]
    fn neighbours_differ() {
        let distinct: std::collections::HashSet<Rgba> = (0..64).map(wall_colour).collect();
        assert!(distinct.len() > 60);
    }

    #[test]
    fn shade_fades_to_black() {
        let c = [200, 100, 50, 7];
        assert_eq!(shade(c, 0.0), [200, 100, 50, 255]);
        assert_eq!(shade(c, 0.5), [100, 50, 25, 255]);
        assert_eq!(shade(c, 1.0), [0, 0, 0, 255]);
    }
}
