//! ---------------------------------------------------------------------------
//! Column bands: disjoint x-ranges of one surface + depth buffer
//!
//! * [`ColumnTarget`] borrows the surface pixels and the per-column depth
//!   buffer for one frame.
//! * [`ColumnTarget::bands`] splits a column range into contiguous,
//!   non-overlapping [`ColumnBand`]s that can be handed to different threads.
//!
//! Safety: bands keep raw pointers into the borrowed buffers. Every access is
//! checked against the band's own x-range, ranges never overlap, and the
//! bands borrow the target mutably, so no two live bands can touch the same
//! pixel or depth slot.
//! ---------------------------------------------------------------------------

use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::renderer::Surface;

pub struct ColumnTarget<'a> {
    pixels: *mut u8,
    depth: *mut f32,
    width: i32,
    height: i32,
    stride: usize,
    _borrow: PhantomData<(&'a mut [u8], &'a mut [f32])>,
}

impl<'a> ColumnTarget<'a> {
    /// `depth` must hold exactly one slot per surface column.
    pub fn new(surface: &'a mut Surface<'_>, depth: &'a mut [f32]) -> Self {
        assert_eq!(depth.len(), surface.width(), "depth buffer / surface width mismatch");
        let (width, height) = (surface.width() as i32, surface.height() as i32);
        let stride = surface.stride();
        Self {
            pixels: surface.raw_pixels().as_mut_ptr(),
            depth: depth.as_mut_ptr(),
            width,
            height,
            stride,
            _borrow: PhantomData,
        }
    }

    /// Split `[lo, hi]` (clamped to the surface) into at most `parts`
    /// contiguous bands, left to right. Empty when nothing is on screen.
    pub fn bands(&mut self, lo: i32, hi: i32, parts: usize) -> SmallVec<[ColumnBand<'_>; 16]> {
        let lo = lo.max(0);
        let hi = hi.min(self.width - 1);
        let mut out = SmallVec::new();
        if hi < lo {
            return out;
        }

        let columns = (hi - lo + 1) as usize;
        let parts = parts.clamp(1, columns);
        let (size, extra) = (columns / parts, columns % parts);

        let mut start = lo;
        for i in 0..parts {
            let len = (size + usize::from(i < extra)) as i32;
            out.push(ColumnBand {
                pixels: self.pixels,
                depth: self.depth,
                lo: start,
                hi: start + len - 1,
                height: self.height,
                stride: self.stride,
                _borrow: PhantomData,
            });
            start += len;
        }
        out
    }
}

/// Exclusive access to the columns `lo..=hi`.
pub struct ColumnBand<'t> {
    pixels: *mut u8,
    depth: *mut f32,
    lo: i32,
    hi: i32,
    height: i32,
    stride: usize,
    _borrow: PhantomData<&'t mut ()>,
}

// SAFETY: a band only dereferences its own columns (asserted on every
// access) and bands from one `bands()` call are disjoint.
unsafe impl Send for ColumnBand<'_> {}

impl ColumnBand<'_> {
    #[inline]
    pub fn range(&self) -> (i32, i32) {
        (self.lo, self.hi)
    }

    #[inline]
    fn check(&self, x: i32) -> usize {
        assert!(
            (self.lo..=self.hi).contains(&x),
            "column {x} outside band {}..={}",
            self.lo,
            self.hi
        );
        x as usize
    }

    pub fn depth(&self, x: i32) -> f32 {
        let x = self.check(x);
        // SAFETY: x is inside this band, hence inside the depth buffer.
        unsafe { *self.depth.add(x) }
    }

    pub fn set_depth(&mut self, x: i32, d: f32) {
        let x = self.check(x);
        // SAFETY: as in `depth`; no other band owns column x.
        unsafe { *self.depth.add(x) = d }
    }

    /// Fill rows `y1..=y2` of column `x` (ends in either order, clamped to
    /// the surface). Nothing is drawn when the clamped ends coincide.
    pub fn vline(&mut self, x: i32, y1: i32, y2: i32, colour: u32) {
        let x = self.check(x);
        let (y1, y2) = if y2 < y1 { (y2, y1) } else { (y1, y2) };
        let y1 = y1.clamp(0, self.height - 1);
        let y2 = y2.clamp(0, self.height - 1);
        if y1 == y2 {
            return;
        }
        for y in y1..=y2 {
            let offset = y as usize * self.stride + x * 4;
            // SAFETY: (x, y) is on the surface and column x belongs to this band.
            unsafe { self.pixels.add(offset).cast::<u32>().write_unaligned(colour) }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::PixelFormat;

    fn ranges(target: &mut ColumnTarget<'_>, lo: i32, hi: i32, parts: usize) -> Vec<(i32, i32)> {
        target.bands(lo, hi, parts).iter().map(ColumnBand::range).collect()
    }

    #[test]
    fn bands_partition_without_overlap() {
        let mut fb = vec![0u32; 10 * 2];
        let mut surface = Surface::from_u32(10, 2, PixelFormat::xrgb8888(), &mut fb).expect("valid");
        let mut depth = vec![f32::INFINITY; 10];
        let mut target = ColumnTarget::new(&mut surface, &mut depth);

        assert_eq!(ranges(&mut target, 0, 9, 3), vec![(0, 3), (4, 6), (7, 9)]);
        assert_eq!(ranges(&mut target, -5, 20, 1), vec![(0, 9)]);
        // more workers than columns
        assert_eq!(ranges(&mut target, 2, 4, 8), vec![(2, 2), (3, 3), (4, 4)]);
        assert!(ranges(&mut target, 12, 20, 4).is_empty());
        assert!(ranges(&mut target, 5, 4, 4).is_empty());
    }

    #[test]
    fn vline_clamps_and_skips_single_row() {
        let mut fb = vec![0u32; 3 * 4];
        let mut surface = Surface::from_u32(3, 4, PixelFormat::xrgb8888(), &mut fb).expect("valid");
        let mut depth = vec![f32::INFINITY; 3];
        {
            let mut target = ColumnTarget::new(&mut surface, &mut depth);
            let mut bands = target.bands(0, 2, 1);
            let band = &mut bands[0];
            band.vline(1, 10, -3, 7); // swapped and clamped to 0..=3
            band.vline(0, 2, 2, 9); // single row: nothing
            band.vline(2, -1, 0, 5); // clamps to 0..=0: nothing
            band.set_depth(1, 0.5);
            assert_eq!(band.depth(1), 0.5);
        }
        assert_eq!(depth[1], 0.5);
        assert!((0..4).all(|y| surface.pixel(1, y) == 7));
        assert!((0..4).all(|y| surface.pixel(0, y) == 0));
        assert!((0..4).all(|y| surface.pixel(2, y) == 0));
    }

    #[test]
    #[should_panic(expected = "outside band")]
    fn band_refuses_foreign_columns() {
        let mut fb = vec![0u32; 8];
        let mut surface = Surface::from_u32(8, 1, PixelFormat::xrgb8888(), &mut fb).expect("valid");
        let mut depth = vec![0.0; 8];
        let mut target = ColumnTarget::new(&mut surface, &mut depth);
        let mut bands = target.bands(0, 7, 2);
        bands[0].set_depth(6, 1.0);
    }

    #[test]
    fn bands_paint_in_parallel() {
        use rayon::prelude::*;

        let mut fb = vec![0u32; 64 * 8];
        let mut surface = Surface::from_u32(64, 8, PixelFormat::xrgb8888(), &mut fb).expect("valid");
        let mut depth = vec![f32::INFINITY; 64];
        {
            let mut target = ColumnTarget::new(&mut surface, &mut depth);
            let mut bands = target.bands(0, 63, 4);
            bands.par_iter_mut().for_each(|band| {
                let (lo, hi) = band.range();
                for x in lo..=hi {
                    band.vline(x, 0, 7, x as u32);
                    band.set_depth(x, x as f32);
                }
            });
        }
        assert!((0..64).all(|x| surface.pixel(x, 5) == x as u32));
        assert!(depth.iter().enumerate().all(|(x, &d)| d == x as f32));
    }
}
