//! Clipweave Edit Geometry
//!
//! Turns pointer gestures into project edits:
//! - [`timeline`]: pixels on the timeline ↔ seconds; move and trim clips.
//! - [`preview`]: pixels on the preview ↔ canvas-normalized space; drag,
//!   resize, and rotate clips.
//! - [`ruler`]: tick spacing and labels for the timeline ruler.
//!
//! Every commit is computed against the project value current at commit
//! time and yields a [`GestureOutcome`].

pub mod gesture;
pub mod preview;
pub mod ruler;
pub mod timeline;

pub use gesture::*;
pub use preview::*;
pub use ruler::*;
pub use timeline::*;
