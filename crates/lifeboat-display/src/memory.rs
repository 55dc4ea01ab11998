//! In-memory display device.
//!
//! Backs tests and host-side development. Unlike real hardware it keeps
//! every buffer readable, so tests can assert on what a flip produced.

use std::sync::{Arc, Mutex};

use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::pixel::PixelFormat;

use crate::device::{DeviceGeometry, DisplayDevice};

#[derive(Debug)]
pub struct MemoryDisplay {
    geometry: DeviceGeometry,
    buffers: Vec<Vec<u8>>,
    active: u32,
    blanked: bool,
    flips: u64,
}

impl MemoryDisplay {
    pub fn new(width: u32, height: u32, format: PixelFormat, buffer_count: u32) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        let geometry = DeviceGeometry {
            width,
            height,
            stride,
            format,
            buffers: buffer_count.max(1),
        };
        let buffers = (0..geometry.buffers)
            .map(|_| vec![0u8; geometry.buffer_len()])
            .collect();
        MemoryDisplay {
            geometry,
            buffers,
            active: 0,
            blanked: false,
            flips: 0,
        }
    }

    /// A double-buffered RGB565 panel, the common hardware case.
    pub fn rgb565(width: u32, height: u32) -> Self {
        Self::new(width, height, PixelFormat::Rgb565, 2)
    }

    pub fn active_index(&self) -> u32 {
        self.active
    }

    /// Contents of the currently visible buffer.
    pub fn visible(&self) -> &[u8] {
        &self.buffers[self.active as usize]
    }

    pub fn buffer(&self, index: u32) -> &[u8] {
        &self.buffers[index as usize]
    }

    pub fn flip_count(&self) -> u64 {
        self.flips
    }

    pub fn is_blanked(&self) -> bool {
        self.blanked
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.geometry.buffers {
            return Err(ConsoleError::DeviceUnavailable(format!(
                "buffer {index} out of range ({} available)",
                self.geometry.buffers
            )));
        }
        Ok(())
    }
}

/// A memory display with a second handle left behind for inspection.
///
/// The swap chain takes ownership of its device, and the refresh worker
/// then moves the chain onto its own thread. Tests hand this wrapper to the
/// chain and keep a clone to look at the displayed frames afterwards.
#[derive(Debug, Clone)]
pub struct SharedMemoryDisplay(Arc<Mutex<MemoryDisplay>>);

impl SharedMemoryDisplay {
    pub fn new(display: MemoryDisplay) -> Self {
        SharedMemoryDisplay(Arc::new(Mutex::new(display)))
    }

    /// Run `f` against the underlying display.
    pub fn with<R>(&self, f: impl FnOnce(&MemoryDisplay) -> R) -> R {
        f(&self.0.lock().unwrap())
    }
}

impl DisplayDevice for SharedMemoryDisplay {
    fn geometry(&self) -> DeviceGeometry {
        self.0.lock().unwrap().geometry()
    }

    fn write_buffer(&mut self, index: u32, frame: &[u8]) -> Result<()> {
        self.0.lock().unwrap().write_buffer(index, frame)
    }

    fn activate_buffer(&mut self, index: u32) -> Result<()> {
        self.0.lock().unwrap().activate_buffer(index)
    }

    fn blank(&mut self, blank: bool) -> Result<()> {
        self.0.lock().unwrap().blank(blank)
    }
}

impl DisplayDevice for MemoryDisplay {
    fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    fn write_buffer(&mut self, index: u32, frame: &[u8]) -> Result<()> {
        self.check_index(index)?;
        let want = self.geometry.buffer_len();
        if frame.len() != want {
            return Err(ConsoleError::DeviceUnavailable(format!(
                "frame is {} bytes, device wants {want}",
                frame.len()
            )));
        }
        self.buffers[index as usize].copy_from_slice(frame);
        Ok(())
    }

    fn activate_buffer(&mut self, index: u32) -> Result<()> {
        self.check_index(index)?;
        self.active = index;
        self.flips += 1;
        Ok(())
    }

    fn blank(&mut self, blank: bool) -> Result<()> {
        self.blanked = blank;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_activate_flips() {
        let mut d = MemoryDisplay::rgb565(4, 4);
        let frame = vec![0xAB; d.geometry().buffer_len()];
        d.write_buffer(1, &frame).unwrap();
        d.activate_buffer(1).unwrap();
        assert_eq!(d.active_index(), 1);
        assert_eq!(d.visible(), &frame[..]);
        assert_eq!(d.flip_count(), 1);
    }

    #[test]
    fn wrong_frame_size_is_rejected() {
        let mut d = MemoryDisplay::rgb565(4, 4);
        assert!(d.write_buffer(0, &[0u8; 3]).is_err());
    }

    #[test]
    fn out_of_range_buffer_is_rejected() {
        let mut d = MemoryDisplay::new(2, 2, PixelFormat::Rgb565, 1);
        assert!(d.write_buffer(1, &[0u8; 8]).is_err());
        assert!(d.activate_buffer(1).is_err());
    }

    #[test]
    fn blank_round_trip() {
        let mut d = MemoryDisplay::rgb565(2, 2);
        d.blank(true).unwrap();
        assert!(d.is_blanked());
        d.blank(false).unwrap();
        assert!(!d.is_blanked());
    }
}
