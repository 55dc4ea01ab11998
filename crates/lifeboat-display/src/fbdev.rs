//! Linux framebuffer device.
//!
//! Talks to `/dev/fb*` through the classic fbdev UAPI: screen geometry via
//! `FBIOGET_*SCREENINFO`, page flips via `FBIOPAN_DISPLAY`, power via
//! `FBIOBLANK`, pixels via one `mmap` of the whole video memory. Double
//! buffering is requested by doubling `yres_virtual`; drivers that refuse
//! (or report too little video memory) degrade to a single buffer, which
//! [`crate::swap::SwapChain`] handles by rewriting the live buffer.

use std::ffi::c_void;
use std::fs::File;
use std::num::NonZeroUsize;
use std::os::fd::AsRawFd;
use std::ptr::NonNull;

use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};

use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::pixel::{ChannelLayout, PixelFormat};

use crate::device::{DeviceGeometry, DisplayDevice};

const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOPUT_VSCREENINFO: u32 = 0x4601;
const FBIOGET_FSCREENINFO: u32 = 0x4602;
const FBIOPAN_DISPLAY: u32 = 0x4606;
const FBIOBLANK: u32 = 0x4611;

const FB_BLANK_UNBLANK: i32 = 0;
const FB_BLANK_POWERDOWN: i32 = 4;

nix::ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, FbVarScreeninfo);
nix::ioctl_write_ptr_bad!(fbioput_vscreeninfo, FBIOPUT_VSCREENINFO, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, FbFixScreeninfo);
nix::ioctl_write_ptr_bad!(fbiopan_display, FBIOPAN_DISPLAY, FbVarScreeninfo);
nix::ioctl_write_int_bad!(fbioblank, FBIOBLANK);

/// `struct fb_bitfield` from `linux/fb.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo` from `linux/fb.h`. 160 bytes on every arch.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbVarScreeninfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `linux/fb.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbFixScreeninfo {
    pub id: [u8; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

fn ioctl_failed(what: &str, err: nix::Error) -> ConsoleError {
    ConsoleError::DeviceUnavailable(format!("{what} failed: {err}"))
}

/// Map the device's reported bitfields onto a [`PixelFormat`].
///
/// Only the layouts the console can convert into are accepted; anything
/// else is a hard startup error rather than a garbled screen.
fn probe_format(var: &FbVarScreeninfo) -> Result<PixelFormat> {
    match var.bits_per_pixel {
        16 => {
            let is_565 = var.red.offset == 11
                && var.red.length == 5
                && var.green.offset == 5
                && var.green.length == 6
                && var.blue.offset == 0
                && var.blue.length == 5;
            if is_565 {
                Ok(PixelFormat::Rgb565)
            } else {
                Err(ConsoleError::UnsupportedFormat(format!(
                    "16 bpp with bitfields r{}+{} g{}+{} b{}+{}",
                    var.red.offset,
                    var.red.length,
                    var.green.offset,
                    var.green.length,
                    var.blue.offset,
                    var.blue.length
                )))
            }
        }
        32 => {
            if var.red.length == 8 && var.green.length == 8 && var.blue.length == 8 {
                Ok(PixelFormat::Xrgb32(ChannelLayout {
                    red_shift: var.red.offset as u8,
                    green_shift: var.green.offset as u8,
                    blue_shift: var.blue.offset as u8,
                }))
            } else {
                Err(ConsoleError::UnsupportedFormat(format!(
                    "32 bpp with channel lengths r{} g{} b{}",
                    var.red.length, var.green.length, var.blue.length
                )))
            }
        }
        bpp => Err(ConsoleError::UnsupportedFormat(format!("{bpp} bpp"))),
    }
}

/// An opened, mapped framebuffer device.
pub struct FbdevDisplay {
    file: File,
    map: NonNull<c_void>,
    map_len: usize,
    var: FbVarScreeninfo,
    geometry: DeviceGeometry,
}

// SAFETY: the mapping is owned exclusively by this struct and only
// dereferenced through &mut self; moving the struct to another thread moves
// that exclusive access with it. The fd stays open as long as the mapping
// because `file` lives in the same struct.
unsafe impl Send for FbdevDisplay {}

impl FbdevDisplay {
    /// Open and map a framebuffer device node.
    ///
    /// `format_override` replaces the probed pixel layout for panels that
    /// misreport their bitfields.
    pub fn open(path: &str, format_override: Option<PixelFormat>) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| ConsoleError::DeviceUnavailable(format!("{path}: {e}")))?;
        let fd = file.as_raw_fd();

        let mut var = FbVarScreeninfo::default();
        unsafe { fbioget_vscreeninfo(fd, &mut var) }
            .map_err(|e| ioctl_failed("FBIOGET_VSCREENINFO", e))?;

        let format = match format_override {
            Some(forced) => {
                log::info!("forcing pixel format {forced:?} over device report");
                forced
            }
            None => probe_format(&var)?,
        };

        // Ask for two screens of virtual height; drivers are free to say no.
        let mut requested = var;
        requested.xres_virtual = var.xres;
        requested.yres_virtual = var.yres * 2;
        requested.xoffset = 0;
        requested.yoffset = 0;
        let accepted = unsafe { fbioput_vscreeninfo(fd, &requested) }.is_ok();

        // Re-read both structs: the driver may have clamped the virtual
        // size or changed the line length while honoring the request.
        unsafe { fbioget_vscreeninfo(fd, &mut var) }
            .map_err(|e| ioctl_failed("FBIOGET_VSCREENINFO", e))?;
        let mut fix = FbFixScreeninfo::default();
        unsafe { fbioget_fscreeninfo(fd, &mut fix) }
            .map_err(|e| ioctl_failed("FBIOGET_FSCREENINFO", e))?;

        let stride = fix.line_length as usize;
        let buffer_len = stride * var.yres as usize;
        if buffer_len == 0 {
            return Err(ConsoleError::DeviceUnavailable(format!(
                "{path}: zero-sized framebuffer"
            )));
        }

        let double = accepted
            && var.yres_virtual >= var.yres * 2
            && fix.smem_len as usize >= 2 * buffer_len;
        if !double {
            log::warn!("{path}: no second buffer, flips rewrite the live frame");
        }
        let buffers = if double { 2 } else { 1 };

        if (fix.smem_len as usize) < buffer_len {
            return Err(ConsoleError::DeviceUnavailable(format!(
                "{path}: {} bytes mapped memory for a {} byte frame",
                fix.smem_len, buffer_len
            )));
        }

        let map_len = fix.smem_len as usize;
        let length = NonZeroUsize::new(map_len).ok_or_else(|| {
            ConsoleError::DeviceUnavailable(format!("{path}: zero-sized framebuffer"))
        })?;
        // SAFETY: mapping a fresh region chosen by the kernel over the
        // device fd; no existing Rust memory is affected.
        let map = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                0,
            )
        }
        .map_err(|e| ConsoleError::DeviceUnavailable(format!("{path}: mmap: {e}")))?;

        let geometry = DeviceGeometry {
            width: var.xres,
            height: var.yres,
            stride,
            format,
            buffers,
        };
        log::info!(
            "framebuffer {path}: {}x{} {:?}, stride {stride}, {} buffer(s)",
            geometry.width,
            geometry.height,
            geometry.format,
            geometry.buffers
        );

        Ok(Self {
            file,
            map,
            map_len,
            var,
            geometry,
        })
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

impl DisplayDevice for FbdevDisplay {
    fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    fn write_buffer(&mut self, index: u32, frame: &[u8]) -> Result<()> {
        self.check_index(index)?;
        let len = self.geometry.buffer_len();
        if frame.len() != len {
            return Err(ConsoleError::DeviceUnavailable(format!(
                "frame is {} bytes, device wants {len}",
                frame.len()
            )));
        }
        let offset = index as usize * len;
        debug_assert!(offset + len <= self.map_len);
        // SAFETY: the range lies inside the mapping (checked above against
        // smem_len at open), and `&mut self` guarantees no other writer.
        unsafe {
            let dst = self.map.as_ptr().cast::<u8>().add(offset);
            std::ptr::copy_nonoverlapping(frame.as_ptr(), dst, len);
        }
        Ok(())
    }

    fn activate_buffer(&mut self, index: u32) -> Result<()> {
        self.check_index(index)?;
        if self.geometry.buffers < 2 {
            // Single buffer: writes land on the visible frame already.
            return Ok(());
        }
        self.var.xoffset = 0;
        self.var.yoffset = index * self.geometry.height;
        unsafe { fbiopan_display(self.file.as_raw_fd(), &self.var) }
            .map_err(|e| ioctl_failed("FBIOPAN_DISPLAY", e))?;
        Ok(())
    }

    fn blank(&mut self, blank: bool) -> Result<()> {
        let arg = if blank {
            FB_BLANK_POWERDOWN
        } else {
            FB_BLANK_UNBLANK
        };
        unsafe { fbioblank(self.file.as_raw_fd(), arg) }
            .map_err(|e| ioctl_failed("FBIOBLANK", e))?;
        Ok(())
    }
}

impl Drop for FbdevDisplay {
    fn drop(&mut self) {
        // SAFETY: `map`/`map_len` describe exactly the region mmap returned
        // and nothing else unmaps it.
        if let Err(e) = unsafe { munmap(self.map, self.map_len) } {
            log::warn!("munmap failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_16bpp_565() -> FbVarScreeninfo {
        FbVarScreeninfo {
            xres: 320,
            yres: 240,
            bits_per_pixel: 16,
            red: FbBitfield {
                offset: 11,
                length: 5,
                msb_right: 0,
            },
            green: FbBitfield {
                offset: 5,
                length: 6,
                msb_right: 0,
            },
            blue: FbBitfield {
                offset: 0,
                length: 5,
                msb_right: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn probes_rgb565() {
        assert_eq!(probe_format(&var_16bpp_565()).unwrap(), PixelFormat::Rgb565);
    }

    #[test]
    fn probes_bgrx_from_offsets() {
        let mut var = var_16bpp_565();
        var.bits_per_pixel = 32;
        var.red = FbBitfield {
            offset: 16,
            length: 8,
            msb_right: 0,
        };
        var.green = FbBitfield {
            offset: 8,
            length: 8,
            msb_right: 0,
        };
        var.blue = FbBitfield {
            offset: 0,
            length: 8,
            msb_right: 0,
        };
        assert_eq!(
            probe_format(&var).unwrap(),
            PixelFormat::Xrgb32(ChannelLayout::BGRX)
        );
    }

    #[test]
    fn rejects_odd_depths() {
        let mut var = var_16bpp_565();
        var.bits_per_pixel = 24;
        assert!(matches!(
            probe_format(&var),
            Err(ConsoleError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_argb1555() {
        let mut var = var_16bpp_565();
        var.red = FbBitfield {
            offset: 10,
            length: 5,
            msb_right: 0,
        };
        var.green = FbBitfield {
            offset: 5,
            length: 5,
            msb_right: 0,
        };
        assert!(matches!(
            probe_format(&var),
            Err(ConsoleError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn screeninfo_layouts_match_the_kernel_abi() {
        assert_eq!(std::mem::size_of::<FbVarScreeninfo>(), 160);
        assert_eq!(std::mem::size_of::<FbBitfield>(), 12);
    }
}
