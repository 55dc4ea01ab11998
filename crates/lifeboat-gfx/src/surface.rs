//! Owned staging surface.
//!
//! The compositor draws every frame into a [`Surface`] and hands it to the
//! display layer, which converts into whatever the panel actually wants.
//! Staging pixels are always 32-bit in the [`ChannelLayout::RGBX`] layout,
//! regardless of the device format, so draw code never branches on depth.

use lifeboat_types::color::Color;
use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::geom::Rect;
use lifeboat_types::pixel::ChannelLayout;

/// Bytes per staging pixel. Fixed; device depth is handled at flip time.
pub const BYTES_PER_PIXEL: usize = 4;

/// An owned pixel buffer with explicit row stride.
///
/// The stride is allowed to exceed `width * 4` so tests can exercise the
/// padded-row handling that real framebuffers exhibit. Rows never alias.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    row_bytes: usize,
    data: Vec<u8>,
}

impl Surface {
    /// Create a surface with a tight stride, cleared to black.
    pub fn new(width: u32, height: u32) -> Self {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        Surface {
            width,
            height,
            row_bytes,
            data: vec![0; row_bytes * height as usize],
        }
    }

    /// Create a surface with an explicit stride.
    ///
    /// Fails when the stride cannot hold a full row. Extra bytes past the
    /// visible row are left untouched by all draw calls.
    pub fn with_stride(width: u32, height: u32, row_bytes: usize) -> Result<Self> {
        if row_bytes < width as usize * BYTES_PER_PIXEL {
            return Err(ConsoleError::Config(format!(
                "stride {row_bytes} too small for width {width}"
            )));
        }
        Ok(Surface {
            width,
            height,
            row_bytes,
            data: vec![0; row_bytes * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Full surface rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Raw backing bytes, row-major with stride padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One visible row, without stride padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.row_bytes;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.row_bytes + x as usize * BYTES_PER_PIXEL
    }

    /// Write one pixel. Out-of-bounds coordinates are ignored.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let off = self.offset(x as u32, y as u32);
        let packed = ChannelLayout::RGBX.pack(color);
        self.data[off..off + BYTES_PER_PIXEL].copy_from_slice(&packed.to_le_bytes());
    }

    /// Read one pixel back. Out of bounds reads as black.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Color::BLACK;
        }
        let off = self.offset(x as u32, y as u32);
        let mut raw = [0u8; BYTES_PER_PIXEL];
        raw.copy_from_slice(&self.data[off..off + BYTES_PER_PIXEL]);
        ChannelLayout::RGBX.unpack(u32::from_le_bytes(raw))
    }

    /// Fill a rectangle with a solid color, clipped to the surface.
    ///
    /// Does not allocate; degenerate or fully-clipped rectangles are no-ops.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(clipped) = rect.clamp_to(self.width, self.height) else {
            return;
        };
        let packed = ChannelLayout::RGBX.pack(color).to_le_bytes();
        for y in clipped.y..clipped.bottom() {
            let start = self.offset(clipped.x as u32, y as u32);
            let row = &mut self.data[start..start + clipped.w as usize * BYTES_PER_PIXEL];
            for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&packed);
            }
        }
    }

    /// Clear the whole surface to one color.
    pub fn clear(&mut self, color: Color) {
        self.fill_rect(self.bounds(), color);
    }

    /// Copy a rectangle from `src` to `(dst_x, dst_y)` on this surface.
    ///
    /// The source rectangle is clipped against both surfaces before any byte
    /// moves; a copy that clips down to zero area is a no-op. No blending,
    /// alpha is carried through verbatim.
    pub fn blit(&mut self, src: &Surface, src_rect: Rect, dst_x: i32, dst_y: i32) {
        let Some(sr) = src_rect.clamp_to(src.width, src.height) else {
            return;
        };
        // Shift by the amount clipping ate off the top-left corner.
        let dx = dst_x + (sr.x - src_rect.x);
        let dy = dst_y + (sr.y - src_rect.y);
        let Some(dr) = Rect::new(dx, dy, sr.w, sr.h).clamp_to(self.width, self.height) else {
            return;
        };
        let sx = sr.x + (dr.x - dx);
        let sy = sr.y + (dr.y - dy);
        let row_len = dr.w as usize * BYTES_PER_PIXEL;
        for line in 0..dr.h as i32 {
            let s = src.offset(sx as u32, (sy + line) as u32);
            let d = self.offset(dr.x as u32, (dr.y + line) as u32);
            self.data[d..d + row_len].copy_from_slice(&src.data[s..s + row_len]);
        }
    }

    /// Replace this surface's pixels with another's of identical geometry.
    ///
    /// Reuses the existing allocation. Used by the refresh worker to stage
    /// frames without allocating per flip.
    pub fn copy_from(&mut self, other: &Surface) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        if self.row_bytes == other.row_bytes {
            self.data.copy_from_slice(&other.data);
        } else {
            let row_len = self.width as usize * BYTES_PER_PIXEL;
            for y in 0..self.height {
                let s = other.offset(0, y);
                let d = self.offset(0, y);
                self.data[d..d + row_len].copy_from_slice(&other.data[s..s + row_len]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let mut s = Surface::new(4, 4);
        let c = Color::rgb(10, 20, 30);
        s.put_pixel(2, 3, c);
        assert_eq!(s.get_pixel(2, 3), c);
    }

    #[test]
    fn out_of_bounds_put_is_ignored() {
        let mut s = Surface::new(2, 2);
        s.put_pixel(-1, 0, Color::WHITE);
        s.put_pixel(0, 5, Color::WHITE);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(s.get_pixel(x, y), Color::BLACK);
            }
        }
    }

    #[test]
    fn stride_must_fit_row() {
        assert!(Surface::with_stride(10, 1, 39).is_err());
        assert!(Surface::with_stride(10, 1, 40).is_ok());
        assert!(Surface::with_stride(10, 1, 64).is_ok());
    }

    #[test]
    fn fill_rect_clips() {
        let mut s = Surface::new(4, 4);
        s.fill_rect(Rect::new(2, 2, 10, 10), Color::WHITE);
        assert_eq!(s.get_pixel(3, 3), Color::WHITE);
        assert_eq!(s.get_pixel(1, 1).r, 0);
    }

    #[test]
    fn fill_respects_stride_padding() {
        let mut s = Surface::with_stride(2, 2, 16).unwrap();
        s.fill_rect(Rect::new(0, 0, 2, 2), Color::WHITE);
        // Padding bytes between rows stay zero.
        assert_eq!(&s.data()[8..16], &[0u8; 8]);
        assert_eq!(s.get_pixel(1, 1), Color::WHITE);
    }

    #[test]
    fn blit_clips_both_sides() {
        let mut src = Surface::new(4, 4);
        src.clear(Color::rgb(200, 0, 0));
        let mut dst = Surface::new(4, 4);
        // Source rect hangs off the source; destination hangs off the left.
        dst.blit(&src, Rect::new(2, 2, 10, 10), -1, 0);
        assert_eq!(dst.get_pixel(0, 0).r, 200);
        assert_eq!(dst.get_pixel(1, 1).r, 200);
        assert_eq!(dst.get_pixel(2, 0).r, 0);
    }

    #[test]
    fn blit_zero_area_is_noop() {
        let src = Surface::new(4, 4);
        let mut dst = Surface::new(4, 4);
        let before = dst.data().to_vec();
        dst.blit(&src, Rect::new(4, 4, 0, 0), 0, 0);
        dst.blit(&src, Rect::new(-10, -10, 2, 2), 0, 0);
        assert_eq!(dst.data(), &before[..]);
    }

    #[test]
    fn copy_from_handles_stride_mismatch() {
        let mut a = Surface::with_stride(2, 2, 12).unwrap();
        let mut b = Surface::new(2, 2);
        b.put_pixel(1, 0, Color::rgb(1, 2, 3));
        a.copy_from(&b);
        assert_eq!(a.get_pixel(1, 0), Color::rgb(1, 2, 3));
    }
}
