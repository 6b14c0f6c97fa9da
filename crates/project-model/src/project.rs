//! Project data model: tracks, clips, subtitles, and on-disk persistence.
//!
//! A project is an immutable value. Every edit produces a new `Project` (see
//! [`crate::command`]) and the whole value is swapped in by the
//! [`crate::store::ProjectStore`].

use std::path::{Path, PathBuf};

use clipweave_common::config::EngineDefaults;
use serde::{Deserialize, Serialize};

use crate::geometry::{CanvasSize, Vec2};
use crate::keyframe::{
    interpolate_scalar, interpolate_vec2, is_normalized, AnimatedProperty, KeyframeMap,
    KeyframeValue, KEYFRAME_EPSILON,
};

/// Current schema version written to `project.json`.
pub const SCHEMA_VERSION: &str = "1.0";

/// Shortest duration a clip may have, in seconds.
pub const MIN_CLIP_DURATION: f64 = 0.1;

/// Duration given to new image and text clips, in seconds.
pub const DEFAULT_CLIP_DURATION: f64 = 5.0;

/// Edit limits in effect for a store. Defaults match the constants above;
/// configured values come from [`EngineDefaults`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditLimits {
    pub min_clip_duration: f64,
    pub default_clip_duration: f64,
    pub keyframe_epsilon: f64,
}

impl Default for EditLimits {
    fn default() -> Self {
        Self {
            min_clip_duration: MIN_CLIP_DURATION,
            default_clip_duration: DEFAULT_CLIP_DURATION,
            keyframe_epsilon: KEYFRAME_EPSILON,
        }
    }
}

impl From<&EngineDefaults> for EditLimits {
    fn from(engine: &EngineDefaults) -> Self {
        let fallback = Self::default();
        let positive = |value: f64, default: f64, field: &'static str| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                tracing::warn!(field, value, default, "Ignoring invalid engine limit");
                default
            }
        };
        let min_clip_duration = positive(
            engine.min_clip_duration,
            fallback.min_clip_duration,
            "min_clip_duration",
        );
        Self {
            min_clip_duration,
            default_clip_duration: positive(
                engine.default_clip_duration,
                fallback.default_clip_duration,
                "default_clip_duration",
            )
            .max(min_clip_duration),
            keyframe_epsilon: positive(
                engine.keyframe_epsilon,
                fallback.keyframe_epsilon,
                "keyframe_epsilon",
            ),
        }
    }
}

/// Duration of a freshly added video before its metadata is known.
pub const PENDING_MEDIA_DURATION: f64 = 0.01;

/// Base box of a text clip without intrinsic size.
pub const DEFAULT_TEXT_SIZE: (f64, f64) = (300.0, 80.0);

/// Base box of a media clip whose size is not yet known.
pub const DEFAULT_MEDIA_SIZE: (f64, f64) = (100.0, 100.0);

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// Output canvas size in pixels.
    pub canvas: CanvasSize,

    /// Cached maximum clip end time. Recomputed by every edit.
    #[serde(default)]
    pub total_duration: f64,

    /// Playback speed multiplier.
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,

    /// Whether media audio is muted in preview.
    #[serde(default)]
    pub muted: bool,

    /// Tracks in paint order (first track is painted first).
    pub tracks: Vec<Track>,

    /// Timed subtitle entries.
    #[serde(default)]
    pub subtitles: Vec<SubtitleEntry>,

    /// Styling applied to the subtitle overlay and subtitle export.
    #[serde(default)]
    pub subtitle_style: SubtitleStyle,

    /// Whether the subtitle overlay is painted.
    #[serde(default = "default_true")]
    pub subtitles_visible: bool,
}

/// An ordered list of clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// Kind of content a clip shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Video,
    Image,
    Text,
}

impl ClipKind {
    /// Video and image clips are backed by a media handle.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Video | Self::Image)
    }
}

impl std::str::FromStr for ClipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown clip kind: {other}")),
        }
    }
}

/// Where a clip's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ClipSource {
    /// Remote or relative media location.
    Url(String),
    /// Key of an in-memory handle owned by the host.
    Handle(String),
    /// Literal text content.
    Text(String),
}

/// Base (un-animated) transform of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Center of the clip, normalized to the canvas.
    pub position: Vec2,
    /// Per-axis scale factor.
    pub scale: Vec2,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    /// Opacity in `[0.0, 1.0]`.
    pub opacity: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::CENTER,
            scale: Vec2::ONE,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

impl Transform {
    /// Resolve every property at `time`, using keyframes where present.
    pub fn at(&self, time: f64, keyframes: &KeyframeMap) -> Transform {
        Transform {
            position: interpolate_vec2(
                keyframes.get(&AnimatedProperty::Position),
                time,
                self.position,
            ),
            scale: interpolate_vec2(keyframes.get(&AnimatedProperty::Scale), time, self.scale),
            rotation: interpolate_scalar(
                keyframes.get(&AnimatedProperty::Rotation),
                time,
                self.rotation,
            ),
            opacity: interpolate_scalar(
                keyframes.get(&AnimatedProperty::Opacity),
                time,
                self.opacity,
            )
            .clamp(0.0, 1.0),
        }
    }

    /// Base value of a property as a keyframe value.
    pub fn value_of(&self, property: AnimatedProperty) -> KeyframeValue {
        match property {
            AnimatedProperty::Position => KeyframeValue::Vector(self.position),
            AnimatedProperty::Scale => KeyframeValue::Vector(self.scale),
            AnimatedProperty::Rotation => KeyframeValue::Scalar(self.rotation),
            AnimatedProperty::Opacity => KeyframeValue::Scalar(self.opacity),
        }
    }

    /// Copy with one property replaced. `None` if the value has the wrong shape
    /// for the property.
    pub fn with_value(&self, property: AnimatedProperty, value: &KeyframeValue) -> Option<Transform> {
        let mut next = *self;
        match (property, value) {
            (AnimatedProperty::Position, KeyframeValue::Vector(v)) => next.position = *v,
            (AnimatedProperty::Scale, KeyframeValue::Vector(v)) => next.scale = *v,
            (AnimatedProperty::Rotation, KeyframeValue::Scalar(v)) => next.rotation = *v,
            (AnimatedProperty::Opacity, KeyframeValue::Scalar(v)) => {
                next.opacity = v.clamp(0.0, 1.0)
            }
            _ => return None,
        }
        Some(next)
    }
}

/// Pixel size reported for a media source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
}

impl IntrinsicSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Font settings of a text clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_family: String,
    /// Base font size in pixels before scale.
    pub font_size: f64,
    pub color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 40.0,
            color: "#FFFFFF".to_string(),
        }
    }
}

/// A time-bounded piece of content on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub kind: ClipKind,
    pub source: ClipSource,
    #[serde(default)]
    pub name: String,

    /// Timeline start in seconds.
    pub start_time: f64,
    /// Length in seconds.
    pub duration: f64,
    /// Always `start_time + duration`.
    pub end_time: f64,

    #[serde(default)]
    pub transform: Transform,

    #[serde(default)]
    pub keyframes: KeyframeMap,

    /// Source pixel size when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsic_size: Option<IntrinsicSize>,

    /// Length of the source media when known (video only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_duration: Option<f64>,

    /// Source position shown at `start_time`, in seconds. Non-zero for the
    /// right half of a split.
    #[serde(default)]
    pub media_offset: f64,

    /// Font settings (text clips).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<TextStyle>,
}

impl Clip {
    /// New media clip. Videos start with a placeholder duration until their
    /// metadata arrives.
    pub fn new_media(
        kind: ClipKind,
        source: ClipSource,
        name: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: new_clip_id(),
            kind,
            source,
            name: name.into(),
            start_time,
            duration,
            end_time: start_time + duration,
            transform: Transform::default(),
            keyframes: KeyframeMap::new(),
            intrinsic_size: None,
            media_duration: None,
            media_offset: 0.0,
            text_style: None,
        }
    }

    /// New text clip.
    pub fn new_text(text: impl Into<String>, start_time: f64, duration: f64) -> Self {
        Self {
            id: new_clip_id(),
            kind: ClipKind::Text,
            source: ClipSource::Text(text.into()),
            name: "Text Clip".to_string(),
            start_time,
            duration,
            end_time: start_time + duration,
            transform: Transform::default(),
            keyframes: KeyframeMap::new(),
            intrinsic_size: None,
            media_duration: None,
            media_offset: 0.0,
            text_style: Some(TextStyle::default()),
        }
    }

    /// Active on the half-open interval `[start_time, end_time)`.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// Position inside the clip's own media for a timeline time.
    pub fn local_time(&self, time: f64) -> f64 {
        self.media_offset + (time - self.start_time).max(0.0)
    }

    /// Copy with new timing; `end_time` follows.
    pub fn with_timing(&self, start_time: f64, duration: f64) -> Clip {
        Clip {
            start_time,
            duration,
            end_time: start_time + duration,
            ..self.clone()
        }
    }

    /// Text content for text clips.
    pub fn text(&self) -> Option<&str> {
        match &self.source {
            ClipSource::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Transform resolved at a timeline time.
    pub fn transform_at(&self, time: f64) -> Transform {
        self.transform.at(time, &self.keyframes)
    }

    /// Whether a property is animated.
    pub fn has_keyframes(&self, property: AnimatedProperty) -> bool {
        self.keyframes
            .get(&property)
            .is_some_and(|list| !list.is_empty())
    }

    /// Base box used for layout: clip metadata, else `fallback` (usually the
    /// media handle's natural size), else the kind default.
    pub fn base_size(&self, fallback: Option<IntrinsicSize>) -> IntrinsicSize {
        if let Some(size) = self.intrinsic_size.filter(IntrinsicSize::is_usable) {
            return size;
        }
        if let Some(size) = fallback.filter(IntrinsicSize::is_usable) {
            return size;
        }
        let (w, h) = match self.kind {
            ClipKind::Text => DEFAULT_TEXT_SIZE,
            _ => DEFAULT_MEDIA_SIZE,
        };
        IntrinsicSize::new(w, h)
    }

    /// A video clip that is still waiting for its media metadata.
    pub fn is_pending_media(&self) -> bool {
        self.kind == ClipKind::Video && self.media_duration.is_none()
    }
}

/// A timed subtitle line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: format!("sub-{}", uuid::Uuid::new_v4().simple()),
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Active on `[start_time, end_time)`.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

/// Horizontal alignment of subtitle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl std::str::FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown alignment: {other}")),
        }
    }
}

/// Subtitle styling shared by the overlay and the exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font_family: String,
    /// Point size used by exported subtitle scripts.
    pub font_size: f64,
    pub align: TextAlign,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// CSS color of the text fill.
    pub color: String,
    /// CSS color of the box behind the text; `None` disables it.
    pub background_color: Option<String>,
    pub outline_color: String,
    pub outline_width: f64,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 40.0,
            align: TextAlign::Center,
            bold: false,
            italic: false,
            underline: false,
            color: "#FFFFFF".to_string(),
            background_color: Some("rgba(0, 0, 0, 0.7)".to_string()),
            outline_color: "#000000".to_string(),
            outline_width: 2.0,
        }
    }
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Generate a clip identifier.
pub fn new_clip_id() -> String {
    format!("clip-{}", uuid::Uuid::new_v4().simple())
}

/// Generate a track identifier.
pub fn new_track_id() -> String {
    format!("track-{}", uuid::Uuid::new_v4().simple())
}

/// Maximum clip end time across all tracks; `0.0` for an empty project.
pub fn compute_total_duration(tracks: &[Track]) -> f64 {
    tracks
        .iter()
        .flat_map(|track| track.clips.iter())
        .map(|clip| clip.end_time)
        .filter(|end| end.is_finite())
        .fold(0.0, f64::max)
}

impl Project {
    /// Create an empty project with one track.
    pub fn new(name: impl Into<String>, canvas: CanvasSize) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: SCHEMA_VERSION.to_string(),
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.clone(),
            modified_at: now,
            canvas,
            total_duration: 0.0,
            playback_rate: 1.0,
            muted: false,
            tracks: vec![Track {
                id: new_track_id(),
                clips: vec![],
            }],
            subtitles: vec![],
            subtitle_style: SubtitleStyle::default(),
            subtitles_visible: true,
        }
    }

    /// Copy with `total_duration` recomputed and `modified_at` bumped.
    pub fn touched(mut self) -> Self {
        self.total_duration = compute_total_duration(&self.tracks);
        self.modified_at = chrono::Utc::now().to_rfc3339();
        self
    }

    /// Iterate all clips in paint order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|track| track.clips.iter())
    }

    /// `(track index, clip index)` of a clip.
    pub fn locate_clip(&self, clip_id: &str) -> Option<(usize, usize)> {
        self.tracks.iter().enumerate().find_map(|(ti, track)| {
            track
                .clips
                .iter()
                .position(|clip| clip.id == clip_id)
                .map(|ci| (ti, ci))
        })
    }

    /// Look up a clip by id.
    pub fn find_clip(&self, clip_id: &str) -> Option<&Clip> {
        self.locate_clip(clip_id)
            .map(|(ti, ci)| &self.tracks[ti].clips[ci])
    }

    /// A text clip whose id matches a subtitle entry.
    pub fn is_subtitle_clip(&self, clip: &Clip) -> bool {
        clip.kind == ClipKind::Text && self.subtitles.iter().any(|sub| sub.id == clip.id)
    }

    /// First subtitle entry active at `time`.
    pub fn active_subtitle(&self, time: f64) -> Option<&SubtitleEntry> {
        self.subtitles.iter().find(|sub| sub.is_active_at(time))
    }

    /// Clamp a playhead time to `[0, total_duration]`.
    pub fn clamp_time(&self, time: f64) -> f64 {
        let total = if self.total_duration.is_finite() {
            self.total_duration.max(0.0)
        } else {
            0.0
        };
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, total)
    }

    /// Report invariant violations. An empty list means the project is valid.
    pub fn validation_issues(&self) -> Vec<String> {
        self.validation_issues_with(&EditLimits::default())
    }

    /// [`validation_issues`](Self::validation_issues) against configured limits.
    pub fn validation_issues_with(&self, limits: &EditLimits) -> Vec<String> {
        let min_duration = limits.min_clip_duration;
        let mut issues = vec![];

        if !self.canvas.is_valid() {
            issues.push(format!(
                "Canvas size {}x{} is not positive",
                self.canvas.width, self.canvas.height
            ));
        }

        if self.tracks.is_empty() {
            issues.push("Project has no tracks".to_string());
        }

        for clip in self.clips() {
            if !clip.start_time.is_finite() || clip.start_time < 0.0 {
                issues.push(format!(
                    "Clip {}: start time {} is invalid",
                    clip.id, clip.start_time
                ));
            }
            if clip.duration < min_duration - 1e-9 && !clip.is_pending_media() {
                issues.push(format!(
                    "Clip {}: duration {:.3}s is below the {min_duration}s minimum",
                    clip.id, clip.duration
                ));
            }
            if (clip.end_time - (clip.start_time + clip.duration)).abs() > 1e-6 {
                issues.push(format!(
                    "Clip {}: end time {:.3} does not match start {:.3} + duration {:.3}",
                    clip.id, clip.end_time, clip.start_time, clip.duration
                ));
            }
            for (property, list) in &clip.keyframes {
                if !is_normalized(list, limits.keyframe_epsilon) {
                    issues.push(format!(
                        "Clip {}: {} keyframes are unsorted or share a timestamp",
                        clip.id,
                        property.name()
                    ));
                }
            }
        }

        for sub in &self.subtitles {
            if sub.end_time < sub.start_time {
                issues.push(format!(
                    "Subtitle {}: end {:.3} precedes start {:.3}",
                    sub.id, sub.end_time, sub.start_time
                ));
            }
        }

        let expected = compute_total_duration(&self.tracks);
        if (self.total_duration - expected).abs() > 1e-6 {
            issues.push(format!(
                "Total duration {:.3} is stale (expected {:.3})",
                self.total_duration, expected
            ));
        }

        issues
    }
}

/// A project together with its directory on disk.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project value.
    pub project: Project,
}

impl LoadedProject {
    /// Load a project from a directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();
        let project_path = root.join("meta").join("project.json");

        let project_json =
            std::fs::read_to_string(&project_path).map_err(|e| ProjectError::IoError {
                path: project_path.clone(),
                source: e,
            })?;

        let project: Project =
            serde_json::from_str(&project_json).map_err(|e| ProjectError::ParseError {
                path: project_path,
                source: e,
            })?;

        tracing::debug!(
            name = %project.name,
            clips = project.clips().count(),
            "Loaded project"
        );

        Ok(Self { root, project })
    }

    /// Save the project to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.root.join("meta");
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;

        let project_path = meta_dir.join("project.json");
        let project_json =
            serde_json::to_string_pretty(&self.project).map_err(|e| ProjectError::ParseError {
                path: project_path.clone(),
                source: e,
            })?;
        std::fs::write(&project_path, project_json).map_err(|e| ProjectError::IoError {
            path: project_path,
            source: e,
        })?;

        Ok(())
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        canvas: CanvasSize,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        if !canvas.is_valid() {
            return Err(ProjectError::ValidationError {
                message: format!("canvas {}x{} must be non-zero", canvas.width, canvas.height),
            });
        }

        for subdir in &["meta", "media", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| ProjectError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let loaded = Self {
            root,
            project: Project::new(name, canvas),
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Directory for rendered outputs.
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Invariant violations plus local media sources that are missing.
    pub fn validate(&self) -> Vec<String> {
        self.validate_with(&EditLimits::default())
    }

    /// [`validate`](Self::validate) against configured limits.
    pub fn validate_with(&self, limits: &EditLimits) -> Vec<String> {
        let mut errors = self.project.validation_issues_with(limits);

        for clip in self.project.clips() {
            if let ClipSource::Url(location) = &clip.source {
                if location.contains("://") {
                    continue;
                }
                let path = self.root.join(location);
                if !path.exists() {
                    errors.push(format!("Clip {}: media source missing: {location}", clip.id));
                }
            }
        }

        errors
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

impl From<ProjectError> for clipweave_common::ClipweaveError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::IoError { source, .. } => Self::Io(source),
            ProjectError::ParseError { source, .. } => Self::Json(source),
            ProjectError::ValidationError { message } => Self::project(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;

    fn clip_at(start: f64, duration: f64) -> Clip {
        Clip::new_media(
            ClipKind::Image,
            ClipSource::Url("media/a.png".into()),
            "a",
            start,
            duration,
        )
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Test", CanvasSize::new(1920, 1080));
        assert_eq!(project.name, "Test");
        assert_eq!(project.tracks.len(), 1);
        assert_eq!(project.total_duration, 0.0);
        assert!(project.subtitles_visible);
        assert!(project.validation_issues().is_empty());
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Test", CanvasSize::default());
        project.tracks[0].clips.push(clip_at(0.0, 2.0));
        project.tracks[0].clips.push(Clip::new_text("hello", 1.0, 5.0));
        let project = project.touched();

        let json = serde_json::to_string_pretty(&project).unwrap();
        let parsed: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, project);
        assert!(json.contains(r#""type": "text""#));
    }

    #[test]
    fn test_legacy_file_defaults() {
        let mut value = serde_json::to_value(Project::new("Legacy", CanvasSize::default())).unwrap();
        let object = value.as_object_mut().unwrap();
        for key in ["playback_rate", "muted", "subtitles", "subtitle_style", "subtitles_visible"] {
            object.remove(key);
        }
        let parsed: Project = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.playback_rate, 1.0);
        assert!(!parsed.muted);
        assert!(parsed.subtitles_visible);
        assert_eq!(parsed.subtitle_style, SubtitleStyle::default());
    }

    #[test]
    fn test_total_duration() {
        let mut project = Project::new("T", CanvasSize::default());
        project.tracks[0].clips.push(clip_at(0.0, 3.0));
        project.tracks.push(Track {
            id: new_track_id(),
            clips: vec![clip_at(4.0, 2.5)],
        });
        assert!((compute_total_duration(&project.tracks) - 6.5).abs() < 1e-9);
        assert_eq!(compute_total_duration(&[]), 0.0);
    }

    #[test]
    fn test_clip_active_interval_is_half_open() {
        let clip = clip_at(1.0, 2.0);
        assert!(!clip.is_active_at(0.999));
        assert!(clip.is_active_at(1.0));
        assert!(clip.is_active_at(2.999));
        assert!(!clip.is_active_at(3.0));
    }

    #[test]
    fn test_transform_at_uses_keyframes() {
        let mut clip = clip_at(0.0, 10.0);
        clip.keyframes.insert(
            AnimatedProperty::Opacity,
            vec![Keyframe::new(0.0, 0.0), Keyframe::new(10.0, 1.0)],
        );
        let t = clip.transform_at(5.0);
        assert!((t.opacity - 0.5).abs() < 1e-9);
        assert_eq!(t.position, Vec2::CENTER);
    }

    #[test]
    fn test_transform_with_value_rejects_wrong_shape() {
        let t = Transform::default();
        assert!(t
            .with_value(AnimatedProperty::Rotation, &KeyframeValue::Vector(Vec2::ONE))
            .is_none());
        let rotated = t
            .with_value(AnimatedProperty::Rotation, &KeyframeValue::Scalar(45.0))
            .unwrap();
        assert_eq!(rotated.rotation, 45.0);
    }

    #[test]
    fn test_base_size_fallbacks() {
        let text = Clip::new_text("hi", 0.0, 1.0);
        assert_eq!(text.base_size(None), IntrinsicSize::new(300.0, 80.0));

        let mut image = clip_at(0.0, 1.0);
        assert_eq!(image.base_size(None), IntrinsicSize::new(100.0, 100.0));
        assert_eq!(
            image.base_size(Some(IntrinsicSize::new(640.0, 480.0))),
            IntrinsicSize::new(640.0, 480.0)
        );
        image.intrinsic_size = Some(IntrinsicSize::new(0.0, 0.0));
        assert_eq!(image.base_size(None), IntrinsicSize::new(100.0, 100.0));
    }

    #[test]
    fn test_subtitle_pairing() {
        let mut project = Project::new("T", CanvasSize::default());
        let text = Clip::new_text("line", 0.0, 2.0);
        let mut sub = SubtitleEntry::new(0.0, 2.0, "line");
        sub.id = text.id.clone();
        project.tracks[0].clips.push(text.clone());
        project.subtitles.push(sub);
        assert!(project.is_subtitle_clip(&text));
        assert!(!project.is_subtitle_clip(&clip_at(0.0, 1.0)));
    }

    #[test]
    fn test_clamp_time() {
        let mut project = Project::new("T", CanvasSize::default());
        project.tracks[0].clips.push(clip_at(0.0, 20.0));
        let project = project.touched();
        assert_eq!(project.clamp_time(-5.0), 0.0);
        assert_eq!(project.clamp_time(999.0), 20.0);
        assert_eq!(project.clamp_time(f64::NAN), 0.0);
    }

    #[test]
    fn test_validation_reports_issues() {
        let mut project = Project::new("T", CanvasSize::default());
        let mut short = clip_at(0.0, 0.05);
        short.end_time = 9.0;
        short.keyframes.insert(
            AnimatedProperty::Rotation,
            vec![Keyframe::new(2.0, 0.0), Keyframe::new(1.0, 0.0)],
        );
        project.tracks[0].clips.push(short);
        project.subtitles.push(SubtitleEntry::new(3.0, 1.0, "x"));

        let issues = project.validation_issues();
        assert!(issues.iter().any(|i| i.contains("below the")));
        assert!(issues.iter().any(|i| i.contains("does not match")));
        assert!(issues.iter().any(|i| i.contains("rotation keyframes")));
        assert!(issues.iter().any(|i| i.contains("precedes start")));
        assert!(issues.iter().any(|i| i.contains("stale")));
    }

    #[test]
    fn test_pending_video_is_not_flagged() {
        let mut project = Project::new("T", CanvasSize::default());
        project.tracks[0].clips.push(Clip::new_media(
            ClipKind::Video,
            ClipSource::Url("https://cdn.example/v.mp4".into()),
            "v",
            0.0,
            PENDING_MEDIA_DURATION,
        ));
        let project = project.touched();
        assert!(project.validation_issues().is_empty());
    }

    #[test]
    fn test_loaded_project_create_and_load() {
        let dir = std::env::temp_dir().join("clipweave_test_project");
        let _ = std::fs::remove_dir_all(&dir);

        let created = LoadedProject::create(&dir, "Integration Test", CanvasSize::default()).unwrap();
        assert_eq!(created.project.name, "Integration Test");
        assert!(dir.join("media").is_dir());
        assert!(dir.join("exports").is_dir());

        let loaded = LoadedProject::load(&dir).unwrap();
        assert_eq!(loaded.project, created.project);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_create_rejects_empty_canvas() {
        let dir = std::env::temp_dir().join("clipweave_test_empty_canvas");
        let result = LoadedProject::create(&dir, "Bad", CanvasSize::new(0, 720));
        assert!(matches!(result, Err(ProjectError::ValidationError { .. })));
    }

    #[test]
    fn test_validate_reports_missing_media() {
        let dir = std::env::temp_dir().join("clipweave_test_validate");
        let _ = std::fs::remove_dir_all(&dir);

        let mut loaded = LoadedProject::create(&dir, "Validate Test", CanvasSize::default()).unwrap();
        loaded.project.tracks[0].clips.push(clip_at(0.0, 1.0));
        loaded.project = loaded.project.clone().touched();

        let errors = loaded.validate();
        assert!(errors.iter().any(|e| e.contains("media source missing")));

        std::fs::remove_dir_all(&dir).ok();
    }
}
