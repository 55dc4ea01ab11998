//! Error-diffusion dithering for shallow color depths.
//!
//! RGB565 panels band badly on smooth vertical gradients. The gradient fill
//! engine runs every pixel through a [`DitherAccumulator`] when the target
//! depth is 16-bit: the pixel is quantized to the 565 lattice and the
//! residual error is pushed right (same row) and down (next row) so that the
//! average over an area matches the requested color.

use lifeboat_types::color::Color;
use lifeboat_types::pixel::quantize_rgb565;

/// Target depth for a gradient fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherMode {
    /// Store requested colors verbatim; for 32-bit panels.
    Exact,
    /// Quantize through the 565 lattice with error diffusion.
    Rgb565,
}

/// Per-fill diffusion state.
///
/// Scan order is fixed: rows top to bottom, pixels left to right, with
/// `begin_row` called between rows. Coordinates are local to the fill, so
/// every fill starts with a clean accumulator.
#[derive(Debug)]
pub struct DitherAccumulator {
    below: Vec<[i16; 3]>,
    right: [i16; 3],
}

impl DitherAccumulator {
    pub fn new(width: u32) -> Self {
        DitherAccumulator {
            below: vec![[0; 3]; width as usize],
            right: [0; 3],
        }
    }

    /// Start the next row. Drops the carry owed past the right edge.
    pub fn begin_row(&mut self) {
        self.right = [0; 3];
    }

    /// Clear all carried error, keeping the allocation.
    pub fn reset(&mut self) {
        for cell in &mut self.below {
            *cell = [0; 3];
        }
        self.right = [0; 3];
    }

    /// Quantize one pixel at local column `x`, absorbing carried error and
    /// emitting new carry right and down.
    pub fn apply(&mut self, x: u32, c: Color) -> Color {
        let x = x as usize;
        let want = [
            c.r as i16 + self.right[0] + self.below[x][0],
            c.g as i16 + self.right[1] + self.below[x][1],
            c.b as i16 + self.right[2] + self.below[x][2],
        ];
        let clamped = Color::rgba(
            want[0].clamp(0, 255) as u8,
            want[1].clamp(0, 255) as u8,
            want[2].clamp(0, 255) as u8,
            c.a,
        );
        let out = quantize_rgb565(clamped);
        let err = [
            clamped.r as i16 - out.r as i16,
            clamped.g as i16 - out.g as i16,
            clamped.b as i16 - out.b as i16,
        ];
        for ch in 0..3 {
            self.right[ch] = err[ch] / 2;
            self.below[x][ch] = err[ch] - err[ch] / 2;
        }
        out.with_alpha(c.a)
    }
}
