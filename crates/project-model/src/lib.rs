//! Clipweave Project Model
//!
//! Defines the core data contracts for Clipweave projects:
//! - **Geometry:** Normalized points and canvas dimensions
//! - **Keyframes:** Time-valued properties and their interpolation
//! - **Project:** Tracks, clips, subtitle entries, and subtitle styling
//! - **Commands:** Edit operations expressed as whole-value replacements
//! - **Store:** The single writer that owns the current project value
//!
//! Clip positions are normalized to `[0.0, 1.0]` relative to the canvas so
//! they survive canvas resizes.

pub mod command;
pub mod geometry;
pub mod keyframe;
pub mod project;
pub mod store;

pub use command::*;
pub use geometry::*;
pub use keyframe::*;
pub use project::*;
pub use store::*;
