//! Display output for the lifeboat recovery console.
//!
//! The chain is: draw into a staging [`lifeboat_gfx::Surface`], hand it to a
//! [`SwapChain`] that rotates and packs pixels into the device format, and
//! let the [`RefreshScheduler`] worker thread push frames so the UI thread
//! never blocks on the panel.
//!
//! Hardware buffers are write-only: the swap chain converts into its own
//! scratch buffer and copies whole frames out, never reading device memory
//! back. Real hardware goes through [`fbdev::FbdevDisplay`]; tests and
//! host-side development use [`memory::MemoryDisplay`].

pub mod device;
#[cfg(target_os = "linux")]
pub mod fbdev;
pub mod memory;
pub mod refresh;
pub mod swap;

pub use device::{DeviceGeometry, DisplayDevice};
pub use memory::{MemoryDisplay, SharedMemoryDisplay};
pub use refresh::RefreshScheduler;
pub use swap::SwapChain;
