//! Foundation types for the lifeboat recovery console.
//!
//! This crate contains the dependency-light core types shared by all lifeboat
//! crates: colors and the semantic palette, rectangle geometry, pixel formats
//! and rotation, input events, configuration, error types, the bitmap font
//! tables, and the service traits that bound the console's collaborators.

pub mod color;
pub mod config;
pub mod error;
pub mod font;
pub mod geom;
pub mod input;
pub mod pixel;
pub mod services;
