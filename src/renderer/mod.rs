//! Pixel surface the renderer paints into.
//!
//! * The caller owns the pixel memory; the renderer never resizes it.
//! * Only 4-byte packed formats are accepted; colours are packed through
//!   [`PixelFormat::pack`] and stored native-endian.
//! * Column work is split over [`target::ColumnBand`]s so that several
//!   workers can paint one wall at once.

pub mod columns;
pub mod palette;
pub mod target;

use thiserror::Error;

/// 8-bit channels, `[r, g, b, a]`.
pub type Rgba = [u8; 4];

/// Channel layout of a packed pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u8,
    pub bytes_per_pixel: u8,

    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,

    pub r_bits: u8,
    pub g_bits: u8,
    pub b_bits: u8,
    pub a_bits: u8,

    pub r_shift: u8,
    pub g_shift: u8,
    pub b_shift: u8,
    pub a_shift: u8,
}

impl PixelFormat {
    /// `0x00RRGGBB`, what most window back-ends expect.
    pub const fn xrgb8888() -> Self {
        Self {
            bits_per_pixel: 32,
            bytes_per_pixel: 4,
            r_mask: 0x00FF_0000,
            g_mask: 0x0000_FF00,
            b_mask: 0x0000_00FF,
            a_mask: 0,
            r_bits: 8,
            g_bits: 8,
            b_bits: 8,
            a_bits: 0,
            r_shift: 16,
            g_shift: 8,
            b_shift: 0,
            a_shift: 0,
        }
    }

    /// `0xAARRGGBB`.
    pub const fn argb8888() -> Self {
        Self {
            a_mask: 0xFF00_0000,
            a_bits: 8,
            a_shift: 24,
            ..Self::xrgb8888()
        }
    }

    /// Pack one colour; alpha is only stored when the format has alpha bits.
    #[inline]
    pub fn pack(&self, [r, g, b, a]: Rgba) -> u32 {
        let mut c = (r as u32) << self.r_shift | (g as u32) << self.g_shift | (b as u32) << self.b_shift;
        if self.a_bits > 0 {
            c |= (a as u32) << self.a_shift;
        }
        c
    }

    /// Inverse of [`pack`](Self::pack) for 8-bit channels.
    #[inline]
    pub fn unpack(&self, c: u32) -> Rgba {
        let ch = |mask: u32, shift: u8| ((c & mask) >> shift) as u8;
        let a = if self.a_bits > 0 { ch(self.a_mask, self.a_shift) } else { 0xFF };
        [
            ch(self.r_mask, self.r_shift),
            ch(self.g_mask, self.g_shift),
            ch(self.b_mask, self.b_shift),
            a,
        ]
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("unsupported pixel format: {0} bytes per pixel (need 4)")]
    UnsupportedFormat(u8),

    #[error("surface size {width}x{height} is not drawable")]
    BadSize { width: usize, height: usize },

    #[error("stride {stride} narrower than a row of {row} bytes")]
    StrideTooSmall { stride: usize, row: usize },

    #[error("pixel buffer holds {len} bytes, {needed} needed")]
    BufferTooSmall { len: usize, needed: usize },
}

/// Borrowed pixel memory plus its layout.
#[derive(Debug)]
pub struct Surface<'a> {
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
    pixels: &'a mut [u8],
}

impl<'a> Surface<'a> {
    /// `stride` is the distance between rows in bytes.
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
        pixels: &'a mut [u8],
    ) -> Result<Self, SurfaceError> {
        if format.bytes_per_pixel != 4 {
            return Err(SurfaceError::UnsupportedFormat(format.bytes_per_pixel));
        }
        if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(SurfaceError::BadSize { width, height });
        }
        let row = width * 4;
        if stride < row {
            return Err(SurfaceError::StrideTooSmall { stride, row });
        }
        let needed = stride * (height - 1) + row;
        if pixels.len() < needed {
            return Err(SurfaceError::BufferTooSmall {
                len: pixels.len(),
                needed,
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            pixels,
        })
    }

    /// Tightly packed `u32` frame-buffer, e.g. a window back-buffer.
    pub fn from_u32(
        width: usize,
        height: usize,
        format: PixelFormat,
        pixels: &'a mut [u32],
    ) -> Result<Self, SurfaceError> {
        Self::new(width, height, width * 4, format, bytemuck::cast_slice_mut(pixels))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * 4
    }

    /// Packed pixel at `(x, y)`. Panics outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) outside surface");
        let o = self.offset(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[o..o + 4]);
        u32::from_ne_bytes(px)
    }

    pub fn fill(&mut self, colour: Rgba) {
        let px = self.format.pack(colour).to_ne_bytes();
        for y in 0..self.height {
            let row = self.offset(0, y);
            for chunk in self.pixels[row..row + self.width * 4].chunks_exact_mut(4) {
                chunk.copy_from_slice(&px);
            }
        }
    }

    /// Raw parts for [`target::ColumnTarget`].
    pub(crate) fn raw_pixels(&mut self) -> &mut [u8] {
        self.pixels
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_skips_alpha_without_alpha_bits() {
        let c = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(PixelFormat::xrgb8888().pack(c), 0x0012_3456);
        assert_eq!(PixelFormat::argb8888().pack(c), 0x7812_3456);
    }

    #[test]
    fn unpack_inverts_pack() {
        let f = PixelFormat::argb8888();
        assert_eq!(f.unpack(f.pack([1, 2, 3, 4])), [1, 2, 3, 4]);
        let f = PixelFormat::xrgb8888();
        assert_eq!(f.unpack(f.pack([9, 8, 7, 0])), [9, 8, 7, 255]);
    }

    #[test]
    fn rejects_bad_layouts() {
        let mut buf = vec![0u8; 64];
        let mut f3 = PixelFormat::xrgb8888();
        f3.bytes_per_pixel = 3;
        assert_eq!(
            Surface::new(4, 4, 16, f3, &mut buf).unwrap_err(),
            SurfaceError::UnsupportedFormat(3)
        );
        assert_eq!(
            Surface::new(4, 4, 12, PixelFormat::xrgb8888(), &mut buf).unwrap_err(),
            SurfaceError::StrideTooSmall { stride: 12, row: 16 }
        );
        assert_eq!(
            Surface::new(4, 5, 16, PixelFormat::xrgb8888(), &mut buf).unwrap_err(),
            SurfaceError::BufferTooSmall { len: 64, needed: 80 }
        );
        assert_eq!(
            Surface::new(0, 4, 16, PixelFormat::xrgb8888(), &mut buf).unwrap_err(),
            SurfaceError::BadSize { width: 0, height: 4 }
        );
    }

    #[test]
    fn padded_rows_are_respected() {
        // 2x2 surface with 4 bytes of padding per row
        let mut buf = vec![0xAAu8; 12 + 8];
        let mut s = Surface::new(2, 2, 12, PixelFormat::xrgb8888(), &mut buf).expect("valid");
        s.fill([0, 0, 0xFF, 0]);
        assert_eq!(s.pixel(1, 1), 0xFF);
        drop(s);
        assert_eq!(&buf[8..12], &[0xAA; 4]);
    }

    #[test]
    fn u32_buffer_view() {
        let mut fb = vec![0u32; 6];
        let mut s = Surface::from_u32(3, 2, PixelFormat::xrgb8888(), &mut fb).expect("valid");
        s.fill([0x10, 0x20, 0x30, 0]);
        drop(s);
        assert!(fb.iter().all(|&p| p == 0x0010_2030));
    }
}
