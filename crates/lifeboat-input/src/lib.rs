//! Input handling for the lifeboat recovery console.
//!
//! Raw key and touch streams are merged into one FIFO [`queue::EventQueue`]
//! by the [`InputRouter`], which also debounces key presses: only a full
//! press+release cycle on the same key, with nothing in between, becomes a
//! registered [`lifeboat_types::input::Event::Key`]. On hardware the
//! [`evdev::EvdevReader`] thread feeds the router from `/dev/input`; tests
//! call the router's handlers directly.

#[cfg(target_os = "linux")]
pub mod evdev;
pub mod queue;
pub mod router;

pub use queue::EventQueue;
pub use router::InputRouter;
