//! Boot control block and session artifacts.
//!
//! The console's crash safety rests on one fixed-size record on a raw
//! partition: before any side-effecting operation the pending command is
//! written and flushed there, and the record is only cleared after the
//! operation succeeds. The bootloader reads the same record to decide
//! whether to boot back into the console. This crate owns that record's
//! layout ([`block`]), the typed commands stored in it ([`pending`]), and
//! the end-of-session log/result files ([`artifacts`]).

pub mod artifacts;
pub mod block;
pub mod pending;

pub use block::{ControlBlock, ControlBlockStore};
pub use pending::{PendingOperation, RunningMarker};
