//! Result of committing a gesture.

use clipweave_project_model::{Project, ProjectStore};

/// Why a gesture produced no edit. The caller rolls back any visual
/// feedback it showed during the gesture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GestureRejection {
    #[error("Clip {id} is paired with a subtitle and cannot be edited directly")]
    SubtitleClip { id: String },

    #[error("Clip not found: {id}")]
    ClipNotFound { id: String },

    #[error("Preview viewport is degenerate")]
    DegenerateViewport,
}

/// Outcome of a gesture commit.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The next project value.
    Committed(Project),
    /// The gesture resolved to the current value; nothing to write.
    Unchanged,
    Rejected(GestureRejection),
}

impl GestureOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, GestureOutcome::Committed(_))
    }

    pub fn rejection(&self) -> Option<&GestureRejection> {
        match self {
            GestureOutcome::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Write a committed value into `store`. Returns the new version, or
    /// `None` when nothing was written.
    pub fn apply_to(self, store: &mut ProjectStore) -> Option<u64> {
        match self {
            GestureOutcome::Committed(project) => Some(store.update(move |_| project)),
            GestureOutcome::Unchanged => None,
            GestureOutcome::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Gesture rejected");
                None
            }
        }
    }
}
