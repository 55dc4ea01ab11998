//! The display device abstraction.

use lifeboat_types::error::Result;
use lifeboat_types::pixel::PixelFormat;

/// What a device reports about itself at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Visible width in device pixels, before any rotation.
    pub width: u32,
    /// Visible height in device pixels.
    pub height: u32,
    /// Bytes per device row, padding included.
    pub stride: usize,
    /// Native pixel format of the buffers.
    pub format: PixelFormat,
    /// Number of flippable buffers. 1 means no page flip; writes go to the
    /// visible buffer and tearing is accepted.
    pub buffers: u32,
}

impl DeviceGeometry {
    /// Bytes in one full buffer.
    pub fn buffer_len(&self) -> usize {
        self.stride * self.height as usize
    }
}

/// A panel the console can push frames to.
///
/// Buffers are write-only: implementations expose no way to read pixels
/// back, and callers must always write a full buffer before activating it.
pub trait DisplayDevice: Send {
    fn geometry(&self) -> DeviceGeometry;

    /// Copy one full frame, already in device format and stride, into
    /// buffer `index`.
    fn write_buffer(&mut self, index: u32, frame: &[u8]) -> Result<()>;

    /// Make buffer `index` the visible one.
    fn activate_buffer(&mut self, index: u32) -> Result<()>;

    /// Turn the panel off (`true`) or back on (`false`).
    fn blank(&mut self, blank: bool) -> Result<()>;
}
