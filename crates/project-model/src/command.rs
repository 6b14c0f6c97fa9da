//! Edit operations over a [`Project`] value.
//!
//! A [`ProjectCommand`] never mutates its input: [`ProjectCommand::apply`]
//! reads the current project and returns the next one, with
//! `total_duration` recomputed. Commands are applied in order by
//! [`crate::store::ProjectStore`].

use serde::{Deserialize, Serialize};

use crate::geometry::CanvasSize;
use crate::keyframe::{
    insert_keyframe, interpolate, remove_keyframe_at, AnimatedProperty, Keyframe, KeyframeValue,
};
use crate::project::{
    compute_total_duration, new_clip_id, new_track_id, Clip, ClipKind, ClipSource, EditLimits,
    IntrinsicSize, Project, SubtitleEntry, SubtitleStyle, Track, PENDING_MEDIA_DURATION,
};

/// An edit to the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ProjectCommand {
    /// Append a video or image clip after the last clip on the first track.
    AddMediaClip {
        kind: ClipKind,
        source: ClipSource,
        name: String,
        /// Known media length; videos without it get a placeholder duration.
        duration: Option<f64>,
    },

    /// Add a text clip starting at `at` (usually the playhead).
    AddTextClip { text: String, at: f64 },

    DeleteClip { clip_id: String },

    /// Cut a clip in two at a timeline time.
    SplitClip { clip_id: String, at: f64 },

    /// Set the base value of a transform property.
    SetTransformProperty {
        clip_id: String,
        property: AnimatedProperty,
        value: KeyframeValue,
    },

    /// Insert a keyframe, replacing one at the same time.
    SetKeyframe {
        clip_id: String,
        property: AnimatedProperty,
        time: f64,
        value: KeyframeValue,
    },

    /// Insert a keyframe holding the property's current value at `time`.
    CaptureKeyframe {
        clip_id: String,
        property: AnimatedProperty,
        time: f64,
    },

    RemoveKeyframe {
        clip_id: String,
        property: AnimatedProperty,
        time: f64,
    },

    SetClipText { clip_id: String, text: String },

    /// Metadata reported by the media provider once a source has loaded.
    SetMediaMetadata {
        clip_id: String,
        intrinsic_size: Option<IntrinsicSize>,
        duration: Option<f64>,
    },

    /// Replace all subtitle entries (transcription delivery).
    SetSubtitles { entries: Vec<SubtitleEntry> },

    AddSubtitle { entry: SubtitleEntry },

    /// Replace the entry with the same id; a paired text clip follows it.
    UpdateSubtitle { entry: SubtitleEntry },

    DeleteSubtitle { id: String },

    /// Join an entry with the one that follows it in time.
    MergeSubtitleWithNext { id: String },

    SetSubtitleStyle { style: SubtitleStyle },

    SetSubtitlesVisible { visible: bool },

    SetCanvasSize { canvas: CanvasSize },

    SetPlaybackRate { rate: f64 },

    SetMuted { muted: bool },

    /// Swap in a whole new project value.
    Replace { project: Box<Project> },
}

/// Why a command left the project unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Clip not found: {id}")]
    ClipNotFound { id: String },

    #[error("Clip {id} is paired with a subtitle entry")]
    SubtitleClip { id: String },

    #[error("Subtitle not found: {id}")]
    SubtitleNotFound { id: String },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}

impl CommandError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: msg.into(),
        }
    }
}

impl From<CommandError> for clipweave_common::ClipweaveError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::ClipNotFound { id } => Self::clip_not_found(id),
            CommandError::SubtitleNotFound { id } => Self::subtitle(format!("not found: {id}")),
            other => Self::edit(other.to_string()),
        }
    }
}

impl ProjectCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddMediaClip { .. } => "add_media_clip",
            Self::AddTextClip { .. } => "add_text_clip",
            Self::DeleteClip { .. } => "delete_clip",
            Self::SplitClip { .. } => "split_clip",
            Self::SetTransformProperty { .. } => "set_transform_property",
            Self::SetKeyframe { .. } => "set_keyframe",
            Self::CaptureKeyframe { .. } => "capture_keyframe",
            Self::RemoveKeyframe { .. } => "remove_keyframe",
            Self::SetClipText { .. } => "set_clip_text",
            Self::SetMediaMetadata { .. } => "set_media_metadata",
            Self::SetSubtitles { .. } => "set_subtitles",
            Self::AddSubtitle { .. } => "add_subtitle",
            Self::UpdateSubtitle { .. } => "update_subtitle",
            Self::DeleteSubtitle { .. } => "delete_subtitle",
            Self::MergeSubtitleWithNext { .. } => "merge_subtitle_with_next",
            Self::SetSubtitleStyle { .. } => "set_subtitle_style",
            Self::SetSubtitlesVisible { .. } => "set_subtitles_visible",
            Self::SetCanvasSize { .. } => "set_canvas_size",
            Self::SetPlaybackRate { .. } => "set_playback_rate",
            Self::SetMuted { .. } => "set_muted",
            Self::Replace { .. } => "replace",
        }
    }

    /// Produce the next project value under the default limits.
    pub fn apply(&self, project: &Project) -> Result<Project, CommandError> {
        self.apply_with(project, &EditLimits::default())
    }

    /// Produce the next project value.
    pub fn apply_with(&self, project: &Project, limits: &EditLimits) -> Result<Project, CommandError> {
        let next = match self {
            Self::AddMediaClip {
                kind,
                source,
                name,
                duration,
            } => add_media_clip(project, *kind, source, name, *duration, limits)?,

            Self::AddTextClip { text, at } => {
                let start = if at.is_finite() { at.max(0.0) } else { 0.0 };
                let clip = Clip::new_text(text.clone(), start, limits.default_clip_duration);
                append_to_first_track(project.clone(), clip)
            }

            Self::DeleteClip { clip_id } => delete_clip(project, clip_id)?,

            Self::SplitClip { clip_id, at } => split_clip(project, clip_id, *at, limits)?,

            Self::SetTransformProperty {
                clip_id,
                property,
                value,
            } => update_clip(project, clip_id, |clip| {
                let transform = clip.transform.with_value(*property, value).ok_or_else(|| {
                    CommandError::invalid(format!("{value:?} does not fit {}", property.name()))
                })?;
                Ok(Clip {
                    transform,
                    ..clip.clone()
                })
            })?,

            Self::SetKeyframe {
                clip_id,
                property,
                time,
                value,
            } => update_clip(project, clip_id, |clip| {
                set_keyframe(clip, *property, *time, value.clone(), limits)
            })?,

            Self::CaptureKeyframe {
                clip_id,
                property,
                time,
            } => update_clip(project, clip_id, |clip| {
                let base = clip.transform.value_of(*property);
                let current = match clip.keyframes.get(property) {
                    Some(list) => interpolate(list, *time, &base),
                    None => base,
                };
                set_keyframe(clip, *property, *time, current, limits)
            })?,

            Self::RemoveKeyframe {
                clip_id,
                property,
                time,
            } => update_clip(project, clip_id, |clip| {
                let mut next = clip.clone();
                if let Some(list) = clip.keyframes.get(property) {
                    let remaining = remove_keyframe_at(list, *time, limits.keyframe_epsilon);
                    if remaining.is_empty() {
                        next.keyframes.remove(property);
                    } else {
                        next.keyframes.insert(*property, remaining);
                    }
                }
                Ok(next)
            })?,

            Self::SetClipText { clip_id, text } => update_clip(project, clip_id, |clip| {
                if clip.kind != ClipKind::Text {
                    return Err(CommandError::invalid(format!("clip {} is not text", clip.id)));
                }
                Ok(Clip {
                    source: ClipSource::Text(text.clone()),
                    ..clip.clone()
                })
            })?,

            Self::SetMediaMetadata {
                clip_id,
                intrinsic_size,
                duration,
            } => update_clip(project, clip_id, |clip| {
                let mut next = clip.clone();
                if let Some(size) = intrinsic_size.filter(IntrinsicSize::is_usable) {
                    next.intrinsic_size = Some(size);
                }
                if let Some(d) = duration.filter(|d| d.is_finite() && *d > 0.0) {
                    if clip.kind == ClipKind::Video {
                        if clip.is_pending_media() {
                            next = next.with_timing(clip.start_time, d.max(limits.min_clip_duration));
                        }
                        next.media_duration = Some(d);
                    }
                }
                Ok(next)
            })?,

            Self::SetSubtitles { entries } => {
                let mut next = project.clone();
                next.subtitles = sorted_subtitles(entries.clone());
                next
            }

            Self::AddSubtitle { entry } => {
                check_subtitle_timing(entry)?;
                let mut next = project.clone();
                next.subtitles.push(entry.clone());
                next.subtitles = sorted_subtitles(next.subtitles);
                next
            }

            Self::UpdateSubtitle { entry } => update_subtitle(project, entry, limits)?,

            Self::DeleteSubtitle { id } => {
                if !project.subtitles.iter().any(|sub| &sub.id == id) {
                    return Err(CommandError::SubtitleNotFound { id: id.clone() });
                }
                let mut next = project.clone();
                next.subtitles.retain(|sub| &sub.id != id);
                remove_paired_clip(&mut next, id);
                next
            }

            Self::MergeSubtitleWithNext { id } => merge_subtitle_with_next(project, id, limits)?,

            Self::SetSubtitleStyle { style } => Project {
                subtitle_style: style.clone(),
                ..project.clone()
            },

            Self::SetSubtitlesVisible { visible } => Project {
                subtitles_visible: *visible,
                ..project.clone()
            },

            Self::SetCanvasSize { canvas } => {
                if !canvas.is_valid() {
                    return Err(CommandError::invalid(format!(
                        "canvas {}x{} must be non-zero",
                        canvas.width, canvas.height
                    )));
                }
                Project {
                    canvas: *canvas,
                    ..project.clone()
                }
            }

            Self::SetPlaybackRate { rate } => {
                if !rate.is_finite() || *rate <= 0.0 {
                    return Err(CommandError::invalid(format!("playback rate {rate}")));
                }
                Project {
                    playback_rate: *rate,
                    ..project.clone()
                }
            }

            Self::SetMuted { muted } => Project {
                muted: *muted,
                ..project.clone()
            },

            Self::Replace { project: next } => next.as_ref().clone(),
        };

        Ok(next.touched())
    }
}

fn add_media_clip(
    project: &Project,
    kind: ClipKind,
    source: &ClipSource,
    name: &str,
    duration: Option<f64>,
    limits: &EditLimits,
) -> Result<Project, CommandError> {
    if !kind.is_media() {
        return Err(CommandError::invalid("text clips are added with add_text_clip"));
    }

    let start = compute_total_duration(&project.tracks);
    let known = duration.filter(|d| d.is_finite() && *d > 0.0);
    let clip_duration = match (kind, known) {
        (_, Some(d)) => d.max(limits.min_clip_duration),
        (ClipKind::Video, None) => PENDING_MEDIA_DURATION,
        _ => limits.default_clip_duration,
    };

    let mut clip = Clip::new_media(kind, source.clone(), name, start, clip_duration);
    if kind == ClipKind::Video {
        clip.media_duration = known;
    }
    Ok(append_to_first_track(project.clone(), clip))
}

fn append_to_first_track(mut project: Project, clip: Clip) -> Project {
    match project.tracks.first_mut() {
        Some(track) => track.clips.push(clip),
        None => project.tracks.push(Track {
            id: new_track_id(),
            clips: vec![clip],
        }),
    }
    project
}

/// Apply `f` to one clip. Subtitle-paired clips are refused.
fn update_clip(
    project: &Project,
    clip_id: &str,
    f: impl FnOnce(&Clip) -> Result<Clip, CommandError>,
) -> Result<Project, CommandError> {
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or_else(|| CommandError::ClipNotFound {
            id: clip_id.to_string(),
        })?;
    let clip = &project.tracks[ti].clips[ci];
    if project.is_subtitle_clip(clip) {
        return Err(CommandError::SubtitleClip {
            id: clip_id.to_string(),
        });
    }

    let updated = f(clip)?;
    let mut next = project.clone();
    next.tracks[ti].clips[ci] = updated;
    Ok(next)
}

fn set_keyframe(
    clip: &Clip,
    property: AnimatedProperty,
    time: f64,
    value: KeyframeValue,
    limits: &EditLimits,
) -> Result<Clip, CommandError> {
    if !time.is_finite() {
        return Err(CommandError::invalid(format!("keyframe time {time}")));
    }
    if clip.transform.with_value(property, &value).is_none() {
        return Err(CommandError::invalid(format!(
            "{value:?} does not fit {}",
            property.name()
        )));
    }

    let mut next = clip.clone();
    let existing = clip.keyframes.get(&property).cloned().unwrap_or_default();
    next.keyframes.insert(
        property,
        insert_keyframe(&existing, Keyframe { time, value }, limits.keyframe_epsilon),
    );
    Ok(next)
}

fn delete_clip(project: &Project, clip_id: &str) -> Result<Project, CommandError> {
    let clip = project
        .find_clip(clip_id)
        .ok_or_else(|| CommandError::ClipNotFound {
            id: clip_id.to_string(),
        })?;
    if project.is_subtitle_clip(clip) {
        return Err(CommandError::SubtitleClip {
            id: clip_id.to_string(),
        });
    }

    let mut next = project.clone();
    let single_track = next.tracks.len() == 1;
    for track in &mut next.tracks {
        track.clips.retain(|c| c.id != clip_id);
    }
    if !single_track {
        next.tracks.retain(|track| !track.clips.is_empty());
    }
    if next.tracks.is_empty() {
        next.tracks.push(Track {
            id: new_track_id(),
            clips: vec![],
        });
    }
    Ok(next)
}

fn split_clip(
    project: &Project,
    clip_id: &str,
    at: f64,
    limits: &EditLimits,
) -> Result<Project, CommandError> {
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or_else(|| CommandError::ClipNotFound {
            id: clip_id.to_string(),
        })?;
    let clip = &project.tracks[ti].clips[ci];
    if project.is_subtitle_clip(clip) {
        return Err(CommandError::SubtitleClip {
            id: clip_id.to_string(),
        });
    }

    let min_duration = limits.min_clip_duration;
    let left_duration = at - clip.start_time;
    let right_duration = clip.end_time - at;
    if !at.is_finite() || left_duration < min_duration || right_duration < min_duration {
        return Err(CommandError::invalid(format!(
            "split at {at:.3}s must leave {min_duration}s on both sides of clip {clip_id}"
        )));
    }

    let left = clip.with_timing(clip.start_time, left_duration);
    let mut right = clip.with_timing(at, right_duration);
    right.id = new_clip_id();
    right.media_offset = clip.media_offset + left_duration;

    let mut next = project.clone();
    let clips = &mut next.tracks[ti].clips;
    clips[ci] = left;
    clips.insert(ci + 1, right);
    Ok(next)
}

fn sorted_subtitles(mut entries: Vec<SubtitleEntry>) -> Vec<SubtitleEntry> {
    entries.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    entries
}

fn check_subtitle_timing(entry: &SubtitleEntry) -> Result<(), CommandError> {
    if entry.end_time < entry.start_time {
        return Err(CommandError::invalid(format!(
            "subtitle {} ends before it starts",
            entry.id
        )));
    }
    Ok(())
}

fn update_subtitle(
    project: &Project,
    entry: &SubtitleEntry,
    limits: &EditLimits,
) -> Result<Project, CommandError> {
    check_subtitle_timing(entry)?;
    let idx = project
        .subtitles
        .iter()
        .position(|sub| sub.id == entry.id)
        .ok_or_else(|| CommandError::SubtitleNotFound {
            id: entry.id.clone(),
        })?;

    let mut next = project.clone();
    next.subtitles[idx] = entry.clone();
    next.subtitles = sorted_subtitles(next.subtitles);
    sync_paired_clip(&mut next, entry, limits);
    Ok(next)
}

/// Retime and retext the text clip paired with `entry`, if any.
fn sync_paired_clip(project: &mut Project, entry: &SubtitleEntry, limits: &EditLimits) {
    if let Some((ti, ci)) = project.locate_clip(&entry.id) {
        let paired = &project.tracks[ti].clips[ci];
        if paired.kind == ClipKind::Text {
            let duration = (entry.end_time - entry.start_time).max(limits.min_clip_duration);
            let mut synced = paired.with_timing(entry.start_time, duration);
            synced.source = ClipSource::Text(entry.text.clone());
            project.tracks[ti].clips[ci] = synced;
        }
    }
}

fn merge_subtitle_with_next(
    project: &Project,
    id: &str,
    limits: &EditLimits,
) -> Result<Project, CommandError> {
    let ordered = sorted_subtitles(project.subtitles.clone());
    let idx = ordered
        .iter()
        .position(|sub| sub.id == id)
        .ok_or_else(|| CommandError::SubtitleNotFound { id: id.to_string() })?;
    let following = ordered
        .get(idx + 1)
        .ok_or_else(|| CommandError::invalid(format!("subtitle {id} has no following entry")))?;

    let current = &ordered[idx];
    let text = format!("{} {}", current.text.trim_end(), following.text.trim_start());
    let merged = SubtitleEntry {
        id: current.id.clone(),
        start_time: current.start_time,
        end_time: current.end_time.max(following.end_time),
        text: text.trim().to_string(),
    };
    let removed_id = following.id.clone();

    let mut next = project.clone();
    next.subtitles = ordered
        .iter()
        .filter(|sub| sub.id != removed_id)
        .map(|sub| if sub.id == id { merged.clone() } else { sub.clone() })
        .collect();
    remove_paired_clip(&mut next, &removed_id);
    sync_paired_clip(&mut next, &merged, limits);
    Ok(next)
}

fn remove_paired_clip(project: &mut Project, id: &str) {
    for track in &mut project.tracks {
        track
            .clips
            .retain(|clip| !(clip.kind == ClipKind::Text && clip.id == id));
    }
}
