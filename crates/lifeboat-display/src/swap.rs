//! Staging-to-device frame conversion and page flipping.

use lifeboat_gfx::Surface;
use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::pixel::{PixelFormat, Rotation, pack_rgb565};

use crate::device::{DeviceGeometry, DisplayDevice};

/// Owns a device plus the scratch buffer frames are packed into.
///
/// `flip` converts the whole staging surface (applying rotation and the
/// device pixel format), writes it to the inactive buffer and activates it.
/// On single-buffer hardware the one visible buffer is rewritten in place;
/// the image is correct after every flip either way, so flipping twice
/// without drawing in between is safe.
pub struct SwapChain {
    device: Box<dyn DisplayDevice>,
    rotation: Rotation,
    geometry: DeviceGeometry,
    active: u32,
    converted: Vec<u8>,
}

impl SwapChain {
    pub fn new(device: Box<dyn DisplayDevice>, rotation: Rotation) -> Self {
        let geometry = device.geometry();
        let converted = vec![0u8; geometry.buffer_len()];
        SwapChain {
            device,
            rotation,
            geometry,
            active: 0,
            converted,
        }
    }

    pub fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Staging surface extent: the device extent with rotation unapplied.
    pub fn staging_size(&self) -> (u32, u32) {
        if self.rotation.transposes() {
            (self.geometry.height, self.geometry.width)
        } else {
            (self.geometry.width, self.geometry.height)
        }
    }

    pub fn blank(&mut self, blank: bool) -> Result<()> {
        self.device.blank(blank)
    }

    /// Convert `staging` and make it visible.
    pub fn flip(&mut self, staging: &Surface) -> Result<()> {
        let (sw, sh) = self.staging_size();
        if staging.width() != sw || staging.height() != sh {
            return Err(ConsoleError::Config(format!(
                "staging surface is {}x{}, display wants {sw}x{sh}",
                staging.width(),
                staging.height()
            )));
        }
        self.convert(staging);
        let target = if self.geometry.buffers >= 2 {
            1 - self.active
        } else {
            0
        };
        self.device.write_buffer(target, &self.converted)?;
        self.device.activate_buffer(target)?;
        self.active = target;
        Ok(())
    }

    fn convert(&mut self, staging: &Surface) {
        let (sw, sh) = (staging.width(), staging.height());
        let stride = self.geometry.stride;
        match self.geometry.format {
            PixelFormat::Rgb565 => {
                for y in 0..sh {
                    for x in 0..sw {
                        let (dx, dy) = self.rotation.map(x, y, sw, sh);
                        let v = pack_rgb565(staging.get_pixel(x as i32, y as i32));
                        let off = dy as usize * stride + dx as usize * 2;
                        self.converted[off..off + 2].copy_from_slice(&v.to_le_bytes());
                    }
                }
            }
            PixelFormat::Xrgb32(layout) => {
                for y in 0..sh {
                    for x in 0..sw {
                        let (dx, dy) = self.rotation.map(x, y, sw, sh);
                        let v = layout.pack(staging.get_pixel(x as i32, y as i32));
                        let off = dy as usize * stride + dx as usize * 4;
                        self.converted[off..off + 4].copy_from_slice(&v.to_le_bytes());
                    }
                }
            }
        }
    }
}
