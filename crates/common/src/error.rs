//! Error types shared across Clipweave crates.

/// Top-level error type for Clipweave operations.
///
/// The engine core absorbs playback and geometry faults locally; this type is
/// for the ambient surface (I/O, configuration, lookups from the CLI).
#[derive(Debug, thiserror::Error)]
pub enum ClipweaveError {
    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Media error: {message}")]
    Media { message: String },

    #[error("Edit error: {message}")]
    Edit { message: String },

    #[error("Subtitle error: {message}")]
    Subtitle { message: String },

    #[error("Clip not found: {id}")]
    ClipNotFound { id: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClipweaveError.
pub type ClipweaveResult<T> = Result<T, ClipweaveError>;

impl ClipweaveError {
    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media {
            message: msg.into(),
        }
    }

    pub fn edit(msg: impl Into<String>) -> Self {
        Self::Edit {
            message: msg.into(),
        }
    }

    pub fn subtitle(msg: impl Into<String>) -> Self {
        Self::Subtitle {
            message: msg.into(),
        }
    }

    pub fn clip_not_found(id: impl Into<String>) -> Self {
        Self::ClipNotFound { id: id.into() }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
