//! Pixel formats and display rotation.
//!
//! The staging surface is always 32-bit RGBX. Hardware buffers may use
//! RGB565 or a 32-bit layout with arbitrary channel positions; both are
//! described here so the swap path can convert at flip time. Which format a
//! device uses is runtime data queried from the hardware (or forced by
//! config), never a compile-time branch.

use crate::color::Color;
use crate::error::{ConsoleError, Result};

/// Bit positions of the color channels inside a 32-bit pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl ChannelLayout {
    /// Red in the low byte (RGBX little-endian byte order).
    pub const RGBX: ChannelLayout = ChannelLayout {
        red_shift: 0,
        green_shift: 8,
        blue_shift: 16,
    };

    /// Blue in the low byte (BGRX little-endian byte order).
    pub const BGRX: ChannelLayout = ChannelLayout {
        red_shift: 16,
        green_shift: 8,
        blue_shift: 0,
    };

    /// Pack a color into a 32-bit pixel. The unused byte stays zero.
    pub const fn pack(&self, c: Color) -> u32 {
        ((c.r as u32) << self.red_shift)
            | ((c.g as u32) << self.green_shift)
            | ((c.b as u32) << self.blue_shift)
    }

    /// Unpack a 32-bit pixel back into an opaque color.
    pub const fn unpack(&self, v: u32) -> Color {
        Color::rgb(
            ((v >> self.red_shift) & 0xFF) as u8,
            ((v >> self.green_shift) & 0xFF) as u8,
            ((v >> self.blue_shift) & 0xFF) as u8,
        )
    }
}

/// A pixel format the console can render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit 5-6-5, red in the high bits.
    Rgb565,
    /// 32-bit with one byte per channel at the given positions.
    Xrgb32(ChannelLayout),
}

impl PixelFormat {
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb32(_) => 4,
        }
    }

    /// Parse a config override name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<PixelFormat> {
        match name {
            "rgb565" => Some(PixelFormat::Rgb565),
            "rgbx" => Some(PixelFormat::Xrgb32(ChannelLayout::RGBX)),
            "bgrx" => Some(PixelFormat::Xrgb32(ChannelLayout::BGRX)),
            _ => None,
        }
    }
}

/// Fold an 8-8-8 color into a 16-bit 5-6-5 pixel.
pub const fn pack_rgb565(c: Color) -> u16 {
    (((c.r & 0xF8) as u16) << 8) | (((c.g & 0xFC) as u16) << 3) | ((c.b >> 3) as u16)
}

/// Expand a 5-6-5 pixel back to 8-8-8, replicating high bits into low bits.
pub const fn unpack_rgb565(v: u16) -> Color {
    let r5 = ((v >> 11) & 0x1F) as u8;
    let g6 = ((v >> 5) & 0x3F) as u8;
    let b5 = (v & 0x1F) as u8;
    Color::rgb((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
}

/// Quantize a color to what an RGB565 target can represent, returned in
/// 8-bit channels. Used by the dither accumulator to compute residual error.
pub const fn quantize_rgb565(c: Color) -> Color {
    unpack_rgb565(pack_rgb565(c))
}

/// Display rotation applied when copying the staging surface to hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw270,
}

impl Rotation {
    /// Map a config value in degrees. Only 0, 90 and 270 are supported.
    pub fn from_degrees(deg: u32) -> Result<Rotation> {
        match deg {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            270 => Ok(Rotation::Cw270),
            _ => Err(ConsoleError::Config(format!(
                "unsupported rotation {deg} (expected 0, 90 or 270)"
            ))),
        }
    }

    /// Whether this rotation swaps width and height.
    pub const fn transposes(&self) -> bool {
        !matches!(self, Rotation::None)
    }

    /// Map a staging-surface coordinate to the rotated device coordinate.
    ///
    /// `sw`/`sh` are the staging surface dimensions.
    pub const fn map(&self, x: u32, y: u32, sw: u32, sh: u32) -> (u32, u32) {
        match self {
            Rotation::None => (x, y),
            Rotation::Cw90 => (sh - 1 - y, x),
            Rotation::Cw270 => (y, sw - 1 - x),
        }
    }
}
