//! Clipweave Common Utilities
//!
//! Shared infrastructure for all Clipweave crates:
//! - Error types and result aliases
//! - Wall clocks and drift measurement for playback synchronization
//! - Tracing/logging initialization
//! - Configuration loading (engine defaults, logging)

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
