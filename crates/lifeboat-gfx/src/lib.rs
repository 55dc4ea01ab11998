//! CPU rasterization for the lifeboat recovery console.
//!
//! Everything here draws into a [`Surface`]: an owned 32-bit staging buffer
//! that is later converted to the device format at flip time. The crate has
//! three parts: the surface itself with blit/fill primitives, the gradient
//! fill engine with error-diffusion dithering for shallow color depths, and
//! the markup text layout engine.
//!
//! All drawing is synchronous and single-threaded by design; the display
//! crate owns the thread that pushes finished frames to hardware.

pub mod dither;
pub mod gradient;
pub mod surface;
pub mod text;

pub use dither::DitherMode;
pub use gradient::CornerMask;
pub use surface::Surface;
