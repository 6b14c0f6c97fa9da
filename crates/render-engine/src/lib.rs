//! Clipweave Render Engine
//!
//! Turns a project value and a set of live media handles into pixels, and
//! serializes subtitle timing for the external transcoder.
//!
//! # Frame Pipeline
//!
//! ```text
//! Project ──────┐
//!               ├── compose(time) ── FrameComposition ──┐
//! MediaRegistry ┘        │                              │
//!                        │                              ├── paint ──▶ Surface
//!                        └── drift sync (video handles) │
//!                                                       │
//! subtitles + style ── layout_subtitle ─────────────────┘
//! ```
//!
//! Nothing in this crate owns time. The playback controller decides which
//! instant to draw; the compositor only nudges video handles toward it.

pub mod compositor;
pub mod export;
pub mod media;
pub mod subtitle_overlay;
pub mod surface;

pub use compositor::*;
pub use export::*;
pub use media::*;
pub use subtitle_overlay::*;
pub use surface::*;
