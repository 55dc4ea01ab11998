//! Vertical gradient fills with rounded corners.
//!
//! Row colors come from integer interpolation between the top and bottom
//! colors, so the first row is exactly the top color and the last row
//! exactly the bottom color. Corner rounding uses a precomputed
//! quarter-circle coverage buffer (one byte per cell, radius squared cells)
//! for edge blending, with an integer square root deciding how many fully
//! outside pixels each row can skip.
//!
//! The engine owns its scratch buffers and reuses them between fills, so
//! steady-state fills do not allocate.

use bitflags::bitflags;

use lifeboat_types::color::{Color, lerp_color};
use lifeboat_types::geom::Rect;

use crate::dither::{DitherAccumulator, DitherMode};
use crate::surface::Surface;

bitflags! {
    /// Which corners of a fill are rounded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CornerMask: u8 {
        const TOP_LEFT = 1 << 0;
        const TOP_RIGHT = 1 << 1;
        const BOTTOM_LEFT = 1 << 2;
        const BOTTOM_RIGHT = 1 << 3;
        const TOP = Self::TOP_LEFT.bits() | Self::TOP_RIGHT.bits();
        const BOTTOM = Self::BOTTOM_LEFT.bits() | Self::BOTTOM_RIGHT.bits();
        const ALL = Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

/// Integer square root, rounding down.
fn isqrt(v: u32) -> u32 {
    if v == 0 {
        return 0;
    }
    let mut x = v;
    let mut last = 0u32;
    while x != last {
        last = x;
        x = (x + v / x) / 2;
    }
    // Newton can overshoot by one on non-squares.
    while x * x > v {
        x -= 1;
    }
    x
}

const COVERAGE_SAMPLES: u32 = 4;

/// Gradient fill engine with reusable scratch state.
pub struct GradientFill {
    coverage: Vec<u8>,
    coverage_radius: u32,
    dither: DitherAccumulator,
    dither_width: u32,
}

impl Default for GradientFill {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientFill {
    pub fn new() -> Self {
        GradientFill {
            coverage: Vec::new(),
            coverage_radius: 0,
            dither: DitherAccumulator::new(0),
            dither_width: 0,
        }
    }

    /// Fill `rect` with a vertical gradient from `top` to `bottom`.
    ///
    /// `radius` is clamped to half the shorter rectangle side. Corners not
    /// in `corners` stay square. Pixels outside the rounded outline are left
    /// untouched; partially covered edge pixels blend against what is
    /// already on the surface.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(
        &mut self,
        surface: &mut Surface,
        rect: Rect,
        top: Color,
        bottom: Color,
        radius: u32,
        corners: CornerMask,
        mode: DitherMode,
    ) {
        let Some(clipped) = rect.clamp_to(surface.width(), surface.height()) else {
            return;
        };
        // Rounding geometry is computed in the unclipped rect's space so a
        // partially visible panel keeps its shape.
        let w = rect.w;
        let h = rect.h;
        let r = radius.min(w / 2).min(h / 2);
        let corners = if r == 0 { CornerMask::empty() } else { corners };
        self.ensure_coverage(r);
        if mode == DitherMode::Rgb565 {
            self.ensure_dither(w);
        }

        for gy in clipped.y..clipped.bottom() {
            let dy = (gy - rect.y) as u32;
            let row_color = lerp_color(top, bottom, dy, h.saturating_sub(1));
            if mode == DitherMode::Rgb565 {
                self.dither.begin_row();
            }
            // Distance into the top or bottom corner band, if any.
            let band = if dy < r {
                Some(r - dy)
            } else if dy >= h - r && r > 0 {
                Some(r - (h - 1 - dy))
            } else {
                None
            };
            // Fully outside runs on rounded corners are skipped without a
            // coverage lookup.
            let (lskip, rskip) = match band {
                Some(ry) => {
                    let inset = Self::row_inset(r, ry);
                    let (lc, rc) = if dy < r {
                        (CornerMask::TOP_LEFT, CornerMask::TOP_RIGHT)
                    } else {
                        (CornerMask::BOTTOM_LEFT, CornerMask::BOTTOM_RIGHT)
                    };
                    (
                        if corners.contains(lc) { inset } else { 0 },
                        if corners.contains(rc) { inset } else { 0 },
                    )
                }
                None => (0, 0),
            };
            for gx in clipped.x..clipped.right() {
                let dx = (gx - rect.x) as u32;
                if dx < lskip || dx >= w - rskip {
                    continue;
                }
                let alpha = self.pixel_alpha(dx, dy, w, h, r, corners);
                if alpha == 0 {
                    continue;
                }
                let color = if alpha == 255 {
                    row_color
                } else {
                    let base = surface.get_pixel(gx, gy);
                    lerp_color(base, row_color, alpha as u32, 255)
                };
                let color = if mode == DitherMode::Rgb565 {
                    self.dither.apply(dx, color)
                } else {
                    color
                };
                surface.put_pixel(gx, gy, color);
            }
        }
    }

    /// Solid rounded fill; a gradient whose two colors coincide.
    pub fn fill_solid(
        &mut self,
        surface: &mut Surface,
        rect: Rect,
        color: Color,
        radius: u32,
        corners: CornerMask,
        mode: DitherMode,
    ) {
        self.fill(surface, rect, color, color, radius, corners, mode);
    }

    /// Conservative first column a corner row may touch. `ry` counts rows
    /// into the band, 1 at the band's inner edge up to `r` at the rect edge.
    /// Columns before the returned inset have zero coverage, including the
    /// anti-aliased bulge past the hard circle boundary.
    pub fn row_inset(r: u32, ry: u32) -> u32 {
        if r == 0 || ry == 0 {
            return 0;
        }
        let a = ry.min(r) - 1;
        r.saturating_sub(2 + isqrt(r * r - a * a))
    }

    fn pixel_alpha(&self, dx: u32, dy: u32, w: u32, h: u32, r: u32, corners: CornerMask) -> u8 {
        if r == 0 || (dy >= r && dy < h - r) {
            return 255;
        }
        // Mirror the pixel into top-left corner orientation.
        let (cx, cy, corner) = if dy < r {
            if dx < r {
                (dx, dy, CornerMask::TOP_LEFT)
            } else if dx >= w - r {
                (w - 1 - dx, dy, CornerMask::TOP_RIGHT)
            } else {
                return 255;
            }
        } else if dx < r {
            (dx, h - 1 - dy, CornerMask::BOTTOM_LEFT)
        } else if dx >= w - r {
            (w - 1 - dx, h - 1 - dy, CornerMask::BOTTOM_RIGHT)
        } else {
            return 255;
        };
        if !corners.contains(corner) {
            return 255;
        }
        self.coverage[(cy * r + cx) as usize]
    }

    fn ensure_coverage(&mut self, r: u32) {
        if r == self.coverage_radius && !self.coverage.is_empty() {
            return;
        }
        if r == 0 {
            self.coverage_radius = 0;
            self.coverage.clear();
            return;
        }
        self.coverage.clear();
        self.coverage.resize((r * r) as usize, 0);
        // Supersample each cell of the top-left quarter against the circle
        // centered at (r, r). All math in eighth-pixel units.
        let scale = COVERAGE_SAMPLES * 2;
        let r8 = r * scale;
        let limit = (r8 * r8) as u64;
        for cy in 0..r {
            for cx in 0..r {
                let mut inside = 0u32;
                for sy in 0..COVERAGE_SAMPLES {
                    for sx in 0..COVERAGE_SAMPLES {
                        let px = cx * scale + 2 * sx + 1;
                        let py = cy * scale + 2 * sy + 1;
                        let ddx = (r8 - px) as u64;
                        let ddy = (r8 - py) as u64;
                        if ddx * ddx + ddy * ddy <= limit {
                            inside += 1;
                        }
                    }
                }
                let total = COVERAGE_SAMPLES * COVERAGE_SAMPLES;
                self.coverage[(cy * r + cx) as usize] =
                    ((inside * 255 + total / 2) / total) as u8;
            }
        }
        self.coverage_radius = r;
    }

    fn ensure_dither(&mut self, width: u32) {
        if width > self.dither_width {
            self.dither = DitherAccumulator::new(width);
            self.dither_width = width;
        } else {
            // Stale carry belongs to a previous fill and must not leak in.
            self.dither.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeboat_types::pixel::quantize_rgb565;

    fn filled(surface: &Surface, x: i32, y: i32) -> bool {
        surface.get_pixel(x, y) != Color::BLACK
    }

    #[test]
    fn gradient_endpoint_rows_are_exact() {
        let mut s = Surface::new(8, 32);
        let mut g = GradientFill::new();
        let top = Color::rgb(10, 200, 50);
        let bottom = Color::rgb(240, 20, 110);
        g.fill(
            &mut s,
            Rect::new(0, 0, 8, 32),
            top,
            bottom,
            0,
            CornerMask::empty(),
            DitherMode::Exact,
        );
        for x in 0..8 {
            assert_eq!(s.get_pixel(x, 0), top);
            assert_eq!(s.get_pixel(x, 31), bottom);
        }
    }

    #[test]
    fn gradient_rows_are_monotone() {
        let mut s = Surface::new(4, 64);
        let mut g = GradientFill::new();
        g.fill(
            &mut s,
            Rect::new(0, 0, 4, 64),
            Color::rgb(0, 255, 30),
            Color::rgb(255, 0, 200),
            0,
            CornerMask::empty(),
            DitherMode::Exact,
        );
        let mut prev = s.get_pixel(0, 0);
        for y in 1..64 {
            let cur = s.get_pixel(0, y);
            assert!(cur.r >= prev.r, "red not rising at row {y}");
            assert!(cur.g <= prev.g, "green not falling at row {y}");
            assert!(cur.b >= prev.b, "blue not rising at row {y}");
            prev = cur;
        }
    }

    #[test]
    fn single_row_uses_top_color() {
        let mut s = Surface::new(4, 1);
        let mut g = GradientFill::new();
        let top = Color::rgb(5, 6, 7);
        g.fill(
            &mut s,
            Rect::new(0, 0, 4, 1),
            top,
            Color::WHITE,
            0,
            CornerMask::empty(),
            DitherMode::Exact,
        );
        assert_eq!(s.get_pixel(2, 0), top);
    }

    #[test]
    fn rounded_corners_leave_outside_untouched() {
        let mut s = Surface::new(20, 20);
        let mut g = GradientFill::new();
        g.fill_solid(
            &mut s,
            Rect::new(0, 0, 20, 20),
            Color::WHITE,
            4,
            CornerMask::ALL,
            DitherMode::Exact,
        );
        assert!(!filled(&s, 0, 0));
        assert!(!filled(&s, 19, 0));
        assert!(!filled(&s, 0, 19));
        assert!(!filled(&s, 19, 19));
        assert!(filled(&s, 10, 10));
        assert!(filled(&s, 0, 10));
        assert!(filled(&s, 10, 0));
    }

    #[test]
    fn corner_mask_selects_corners() {
        let mut s = Surface::new(20, 20);
        let mut g = GradientFill::new();
        g.fill_solid(
            &mut s,
            Rect::new(0, 0, 20, 20),
            Color::WHITE,
            4,
            CornerMask::TOP_LEFT,
            DitherMode::Exact,
        );
        assert!(!filled(&s, 0, 0));
        // Square corners are painted all the way out.
        assert!(filled(&s, 19, 0));
        assert!(filled(&s, 0, 19));
        assert!(filled(&s, 19, 19));
    }

    #[test]
    fn oversized_radius_clamps() {
        let mut s = Surface::new(10, 10);
        let mut g = GradientFill::new();
        g.fill_solid(
            &mut s,
            Rect::new(0, 0, 10, 10),
            Color::WHITE,
            100,
            CornerMask::ALL,
            DitherMode::Exact,
        );
        assert!(!filled(&s, 0, 0));
        assert!(filled(&s, 5, 5));
    }

    #[test]
    fn dithered_fill_stays_on_565_lattice() {
        let mut s = Surface::new(16, 16);
        let mut g = GradientFill::new();
        g.fill(
            &mut s,
            Rect::new(0, 0, 16, 16),
            Color::rgb(13, 77, 201),
            Color::rgb(199, 31, 45),
            0,
            CornerMask::empty(),
            DitherMode::Rgb565,
        );
        for y in 0..16 {
            for x in 0..16 {
                let c = s.get_pixel(x, y);
                assert_eq!(c, quantize_rgb565(c), "off lattice at ({x}, {y})");
            }
        }
    }

    #[test]
    fn partially_clipped_fill_keeps_shape() {
        let mut s = Surface::new(10, 10);
        let mut g = GradientFill::new();
        // Rect hangs off the left edge; visible part still fills.
        g.fill_solid(
            &mut s,
            Rect::new(-5, 2, 12, 6),
            Color::WHITE,
            2,
            CornerMask::ALL,
            DitherMode::Exact,
        );
        assert!(filled(&s, 0, 4));
        assert!(filled(&s, 3, 3));
        assert!(!filled(&s, 8, 0));
    }

    #[test]
    fn row_inset_shrinks_toward_band_edge() {
        // Deep in the band (ry near r) the inset is large; near the band
        // boundary it approaches zero.
        assert!(GradientFill::row_inset(8, 8) > GradientFill::row_inset(8, 2));
        assert_eq!(GradientFill::row_inset(8, 0), 0);
        assert_eq!(GradientFill::row_inset(0, 3), 0);
    }

    #[test]
    fn isqrt_matches_floor_sqrt() {
        for v in 0..2000u32 {
            let r = isqrt(v);
            assert!(r * r <= v);
            assert!((r + 1) * (r + 1) > v);
        }
    }
}
