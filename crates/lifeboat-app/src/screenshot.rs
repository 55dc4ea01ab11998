//! Debug screenshots of the staging surface.
//!
//! Captured with the power + volume-down chord at the menu; useful for
//! filing UI bugs from devices without a display cable.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use lifeboat_gfx::Surface;
use lifeboat_types::error::{ConsoleError, Result};

/// Encode `surface` as an 8-bit RGBA PNG at `path`, creating parent
/// directories as needed.
pub fn save_png(surface: &Surface, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, surface.width(), surface.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut png_writer = encoder.write_header().map_err(encode_error)?;

    let mut rgba = Vec::with_capacity(surface.width() as usize * surface.height() as usize * 4);
    for y in 0..surface.height() as i32 {
        for x in 0..surface.width() as i32 {
            let c = surface.get_pixel(x, y);
            rgba.extend_from_slice(&[c.r, c.g, c.b, 0xFF]);
        }
    }
    png_writer.write_image_data(&rgba).map_err(encode_error)?;
    Ok(())
}

fn encode_error(err: png::EncodingError) -> ConsoleError {
    ConsoleError::Io(std::io::Error::other(err))
}
