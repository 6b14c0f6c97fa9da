//! Clipweave Playback Engine
//!
//! Owns the logical playhead. A [`PlaybackController`] advances it from a
//! [`Clock`](clipweave_common::clock::Clock) once per scheduled frame, keeps
//! media handles loosely in sync, and asks the compositor to draw.
//!
//! ```text
//! FrameScheduler ──tick──▶ PlaybackController ──draw_frame──▶ Compositor ──▶ Surface
//!                               │
//!                               └── play/pause/seek ──▶ MediaRegistry
//! ```

pub mod controller;
pub mod scheduler;

pub use controller::*;
pub use scheduler::*;
