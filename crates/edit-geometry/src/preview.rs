//! Preview geometry: container pixels ↔ canvas-normalized coordinates, and
//! drag/resize/rotate of the selected clip.
//!
//! The canvas is drawn at `zoom` and centered inside its container; a point
//! in the container maps to the canvas by removing the centering offset and
//! dividing by the zoom. Committed values go to the property's keyframe at
//! the current time when the property is animated, otherwise to the clip's
//! base transform.

use clipweave_project_model::{
    AnimatedProperty, CanvasSize, Clip, EditLimits, IntrinsicSize, KeyframeValue, Project,
    ProjectCommand, Rect, Vec2,
};
use serde::{Deserialize, Serialize};

use crate::gesture::{GestureOutcome, GestureRejection};

/// Fixed zoom levels offered besides fit and fill.
pub const PREVIEW_ZOOM_LEVELS: [f64; 11] = [0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0, 8.0, 16.0];

/// Changes smaller than this are not committed.
pub const PREVIEW_CHANGE_EPSILON: f64 = 1e-4;

/// Smallest scale a resize can produce.
pub const MIN_PREVIEW_SCALE: f64 = 0.01;

/// How the preview canvas is sized inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "level", rename_all = "snake_case")]
pub enum PreviewZoomMode {
    /// Whole canvas visible.
    #[default]
    Fit,
    /// Container covered, canvas cropped.
    Fill,
    /// Fixed factor.
    Level(f64),
}

impl PreviewZoomMode {
    /// Parse a UI label: `fit`, `fill`, or a percentage such as `150%`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "fit" => Some(Self::Fit),
            "fill" => Some(Self::Fill),
            other => {
                let pct: f64 = other.trim_end_matches('%').trim().parse().ok()?;
                (pct.is_finite() && pct > 0.0).then(|| Self::Level(pct / 100.0))
            }
        }
    }

    /// Next larger fixed level after `zoom`.
    pub fn step_in(zoom: f64, levels: &[f64]) -> Self {
        levels
            .iter()
            .copied()
            .find(|level| *level > zoom + 1e-9)
            .or_else(|| levels.last().copied())
            .map_or(Self::Level(zoom), Self::Level)
    }

    /// Next smaller fixed level before `zoom`.
    pub fn step_out(zoom: f64, levels: &[f64]) -> Self {
        levels
            .iter()
            .rev()
            .copied()
            .find(|level| *level < zoom - 1e-9)
            .or_else(|| levels.first().copied())
            .map_or(Self::Level(zoom), Self::Level)
    }
}

/// Scale that shows the whole canvas inside the container.
pub fn fit_zoom(container_width: f64, container_height: f64, canvas: CanvasSize) -> f64 {
    zoom_ratios(container_width, container_height, canvas).map_or(1.0, |(sx, sy)| sx.min(sy))
}

/// Scale that covers the whole container with the canvas.
pub fn fill_zoom(container_width: f64, container_height: f64, canvas: CanvasSize) -> f64 {
    zoom_ratios(container_width, container_height, canvas).map_or(1.0, |(sx, sy)| sx.max(sy))
}

fn zoom_ratios(container_width: f64, container_height: f64, canvas: CanvasSize) -> Option<(f64, f64)> {
    let usable = container_width.is_finite()
        && container_height.is_finite()
        && container_width > 0.0
        && container_height > 0.0
        && canvas.is_valid();
    usable.then(|| {
        (
            container_width / canvas.width as f64,
            container_height / canvas.height as f64,
        )
    })
}

/// Placement of the canvas inside the preview container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewViewport {
    pub container_width: f64,
    pub container_height: f64,
    pub canvas: CanvasSize,
    pub zoom: f64,
}

impl PreviewViewport {
    pub fn new(container_width: f64, container_height: f64, canvas: CanvasSize, mode: PreviewZoomMode) -> Self {
        let zoom = match mode {
            PreviewZoomMode::Fit => fit_zoom(container_width, container_height, canvas),
            PreviewZoomMode::Fill => fill_zoom(container_width, container_height, canvas),
            PreviewZoomMode::Level(level) => level,
        };
        Self {
            container_width,
            container_height,
            canvas,
            zoom,
        }
    }

    /// The viewport can map points in both directions.
    pub fn is_usable(&self) -> bool {
        self.zoom.is_finite() && self.zoom > 0.0 && self.canvas.is_valid()
    }

    /// Top-left corner of the drawn canvas in container pixels.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(
            (self.container_width - self.canvas.width as f64 * self.zoom) / 2.0,
            (self.container_height - self.canvas.height as f64 * self.zoom) / 2.0,
        )
    }

    /// Container pixel → canvas pixel.
    pub fn container_to_canvas(&self, point: Vec2) -> Vec2 {
        let offset = self.offset();
        Vec2::new(
            (point.x - offset.x) / self.zoom,
            (point.y - offset.y) / self.zoom,
        )
    }

    /// Container pixel → canvas-normalized point.
    pub fn container_to_normalized(&self, point: Vec2) -> Vec2 {
        let canvas = self.container_to_canvas(point);
        Vec2::new(
            canvas.x / self.canvas.width as f64,
            canvas.y / self.canvas.height as f64,
        )
    }

    /// Canvas-normalized point → container pixel.
    pub fn normalized_to_container(&self, point: Vec2) -> Vec2 {
        let offset = self.offset();
        let canvas = self.canvas.to_pixels(point);
        Vec2::new(offset.x + canvas.x * self.zoom, offset.y + canvas.y * self.zoom)
    }

    /// Bounds of the drawn canvas in container pixels.
    pub fn canvas_rect(&self) -> Rect {
        let offset = self.offset();
        Rect::new(
            offset.x,
            offset.y,
            self.canvas.width as f64 * self.zoom,
            self.canvas.height as f64 * self.zoom,
        )
    }
}

/// Selection frame drawn over a clip in the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionOverlay {
    /// Un-rotated bounds in container pixels.
    pub rect: Rect,
    /// Clockwise rotation around the rect center, in degrees.
    pub rotation_deg: f64,
}

impl SelectionOverlay {
    /// Whether a container point falls inside the rotated frame.
    pub fn contains(&self, point: Vec2) -> bool {
        let center = self.rect.center();
        let (sin, cos) = (-self.rotation_deg.to_radians()).sin_cos();
        let (dx, dy) = (point.x - center.x, point.y - center.y);
        let local = Vec2::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos);
        self.rect.contains(local.x, local.y)
    }
}

/// Selection frame of `clip` at `time`. `natural_size` is the media handle's
/// reported size, used when the clip has none recorded.
pub fn selection_overlay(
    clip: &Clip,
    time: f64,
    viewport: &PreviewViewport,
    natural_size: Option<IntrinsicSize>,
) -> Option<SelectionOverlay> {
    if !viewport.is_usable() {
        return None;
    }
    let transform = clip.transform_at(time);
    let base = clip.base_size(natural_size);
    let center = viewport.normalized_to_container(transform.position);
    let rect = Rect::centered(
        center,
        base.width * transform.scale.x * viewport.zoom,
        base.height * transform.scale.y * viewport.zoom,
    );
    let finite = [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    finite.then_some(SelectionOverlay {
        rect,
        rotation_deg: transform.rotation,
    })
}

/// Topmost clip under a container point at `time`. Subtitle-paired clips are
/// not selectable.
pub fn clip_at_point<'p>(
    project: &'p Project,
    time: f64,
    point: Vec2,
    viewport: &PreviewViewport,
    natural_size: impl Fn(&Clip) -> Option<IntrinsicSize>,
) -> Option<&'p Clip> {
    let clips: Vec<&Clip> = project.clips().collect();
    clips.into_iter().rev().find(|clip| {
        clip.is_active_at(time)
            && !project.is_subtitle_clip(clip)
            && selection_overlay(clip, time, viewport, natural_size(clip))
                .is_some_and(|overlay| overlay.contains(point))
    })
}

/// A committed pointer gesture on the preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreviewGesture {
    /// Pointer moved from `from` to `to`, both in container pixels.
    Drag { from: Vec2, to: Vec2 },
    /// Frame resized to this on-screen size.
    Resize { width_px: f64, height_px: f64 },
    /// Frame rotated to this absolute angle.
    Rotate { degrees: f64 },
}

impl PreviewGesture {
    pub fn property(&self) -> AnimatedProperty {
        match self {
            PreviewGesture::Drag { .. } => AnimatedProperty::Position,
            PreviewGesture::Resize { .. } => AnimatedProperty::Scale,
            PreviewGesture::Rotate { .. } => AnimatedProperty::Rotation,
        }
    }

    /// Target value of the gesture's property, or `None` when the pointer
    /// data is unusable.
    pub fn target_value(
        &self,
        clip: &Clip,
        time: f64,
        viewport: &PreviewViewport,
        natural_size: Option<IntrinsicSize>,
    ) -> Option<KeyframeValue> {
        let current = clip.transform_at(time);
        match *self {
            PreviewGesture::Drag { from, to } => {
                let delta = viewport.container_to_normalized(to) - viewport.container_to_normalized(from);
                let next = current.position + delta;
                next.is_finite().then_some(KeyframeValue::Vector(next))
            }
            PreviewGesture::Resize { width_px, height_px } => {
                let base = clip.base_size(natural_size);
                let scale = if width_px.is_finite() && width_px > 0.0 {
                    width_px / (base.width * viewport.zoom)
                } else if height_px.is_finite() && height_px > 0.0 {
                    height_px / (base.height * viewport.zoom)
                } else {
                    return None;
                };
                let scale = scale.max(MIN_PREVIEW_SCALE);
                scale.is_finite().then_some(KeyframeValue::Vector(Vec2::splat(scale)))
            }
            PreviewGesture::Rotate { degrees } => degrees
                .is_finite()
                .then(|| KeyframeValue::Scalar(degrees.rem_euclid(360.0))),
        }
    }
}

/// Apply a preview gesture to `clip_id` at timeline time `time`.
pub fn commit_preview_gesture(
    project: &Project,
    clip_id: &str,
    gesture: PreviewGesture,
    time: f64,
    viewport: &PreviewViewport,
    natural_size: Option<IntrinsicSize>,
) -> GestureOutcome {
    commit_preview_gesture_with(
        project,
        clip_id,
        gesture,
        time,
        viewport,
        natural_size,
        &EditLimits::default(),
    )
}

/// [`commit_preview_gesture`] under configured edit limits.
pub fn commit_preview_gesture_with(
    project: &Project,
    clip_id: &str,
    gesture: PreviewGesture,
    time: f64,
    viewport: &PreviewViewport,
    natural_size: Option<IntrinsicSize>,
    limits: &EditLimits,
) -> GestureOutcome {
    let Some(clip) = project.find_clip(clip_id) else {
        return GestureOutcome::Rejected(GestureRejection::ClipNotFound {
            id: clip_id.to_string(),
        });
    };
    if project.is_subtitle_clip(clip) {
        return GestureOutcome::Rejected(GestureRejection::SubtitleClip {
            id: clip_id.to_string(),
        });
    }
    if !viewport.is_usable() {
        return GestureOutcome::Rejected(GestureRejection::DegenerateViewport);
    }

    let property = gesture.property();
    let Some(value) = gesture.target_value(clip, time, viewport, natural_size) else {
        tracing::debug!(clip_id, property = property.name(), "Ignoring unusable preview gesture");
        return GestureOutcome::Unchanged;
    };
    let current = clip.transform_at(time).value_of(property);
    if !differs(&current, &value) {
        return GestureOutcome::Unchanged;
    }

    let command = if clip.has_keyframes(property) {
        ProjectCommand::SetKeyframe {
            clip_id: clip_id.to_string(),
            property,
            time,
            value,
        }
    } else {
        ProjectCommand::SetTransformProperty {
            clip_id: clip_id.to_string(),
            property,
            value,
        }
    };

    tracing::debug!(
        clip_id,
        property = property.name(),
        keyframed = clip.has_keyframes(property),
        time,
        "Committing preview gesture"
    );
    match command.apply_with(project, limits) {
        Ok(next) => GestureOutcome::Committed(next),
        Err(e) => {
            tracing::warn!(clip_id, error = %e, "Preview gesture did not apply");
            GestureOutcome::Unchanged
        }
    }
}

fn differs(current: &KeyframeValue, next: &KeyframeValue) -> bool {
    match (current, next) {
        (KeyframeValue::Scalar(a), KeyframeValue::Scalar(b)) => (a - b).abs() >= PREVIEW_CHANGE_EPSILON,
        (KeyframeValue::Vector(a), KeyframeValue::Vector(b)) => !a.approx_eq(b, PREVIEW_CHANGE_EPSILON),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipweave_project_model::{ClipKind, ClipSource, Keyframe, SubtitleEntry};

    fn canvas() -> CanvasSize {
        CanvasSize::new(1280, 720)
    }

    fn project_with_image() -> (Project, String) {
        let mut project = Project::new("Preview", canvas());
        let mut clip = Clip::new_media(
            ClipKind::Image,
            ClipSource::Url("logo.png".into()),
            "logo.png",
            0.0,
            5.0,
        );
        clip.intrinsic_size = Some(IntrinsicSize::new(200.0, 100.0));
        let id = clip.id.clone();
        project.tracks[0].clips.push(clip);
        (project.touched(), id)
    }

    fn committed(outcome: GestureOutcome) -> Project {
        match outcome {
            GestureOutcome::Committed(project) => project,
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_and_fill_zoom() {
        assert_eq!(fit_zoom(640.0, 720.0, canvas()), 0.5);
        assert_eq!(fill_zoom(640.0, 720.0, canvas()), 1.0);
        assert_eq!(fit_zoom(0.0, 720.0, canvas()), 1.0);
        assert_eq!(fill_zoom(640.0, 720.0, CanvasSize::new(0, 720)), 1.0);
    }

    #[test]
    fn test_container_mapping_removes_centering_offset() {
        let viewport = PreviewViewport::new(800.0, 600.0, canvas(), PreviewZoomMode::Level(0.5));
        assert_eq!(viewport.offset(), Vec2::new(80.0, 120.0));
        let center = viewport.container_to_normalized(Vec2::new(400.0, 300.0));
        assert!(center.approx_eq(&Vec2::CENTER, 1e-12));
        let corner = viewport.normalized_to_container(Vec2::ONE);
        assert_eq!(corner, Vec2::new(720.0, 480.0));
    }

    #[test]
    fn test_zoom_mode_parse_and_steps() {
        assert_eq!(PreviewZoomMode::parse("Fit"), Some(PreviewZoomMode::Fit));
        assert_eq!(PreviewZoomMode::parse("150%"), Some(PreviewZoomMode::Level(1.5)));
        assert_eq!(PreviewZoomMode::parse("-5%"), None);
        assert_eq!(
            PreviewZoomMode::step_in(0.6, &PREVIEW_ZOOM_LEVELS),
            PreviewZoomMode::Level(0.75)
        );
        assert_eq!(
            PreviewZoomMode::step_out(1.0, &PREVIEW_ZOOM_LEVELS),
            PreviewZoomMode::Level(0.75)
        );
        assert_eq!(
            PreviewZoomMode::step_in(16.0, &PREVIEW_ZOOM_LEVELS),
            PreviewZoomMode::Level(16.0)
        );
    }

    #[test]
    fn test_drag_writes_base_position_when_not_animated() {
        let (project, id) = project_with_image();
        let viewport = PreviewViewport::new(640.0, 360.0, canvas(), PreviewZoomMode::Fit);
        let gesture = PreviewGesture::Drag {
            from: Vec2::new(320.0, 180.0),
            to: Vec2::new(352.0, 198.0),
        };

        let next = committed(commit_preview_gesture(&project, &id, gesture, 1.0, &viewport, None));
        let clip = next.find_clip(&id).unwrap();
        assert!(clip.transform.position.approx_eq(&Vec2::new(0.55, 0.55), 1e-9));
        assert!(!clip.has_keyframes(AnimatedProperty::Position));
    }

    #[test]
    fn test_drag_writes_keyframe_when_animated() {
        let (mut project, id) = project_with_image();
        project.tracks[0].clips[0].keyframes.insert(
            AnimatedProperty::Position,
            vec![
                Keyframe::new(0.0, Vec2::new(0.0, 0.5)),
                Keyframe::new(4.0, Vec2::new(1.0, 0.5)),
            ],
        );
        let viewport = PreviewViewport::new(1280.0, 720.0, canvas(), PreviewZoomMode::Fit);
        let gesture = PreviewGesture::Drag {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(0.0, 72.0),
        };

        let next = committed(commit_preview_gesture(&project, &id, gesture, 2.0, &viewport, None));
        let clip = next.find_clip(&id).unwrap();
        let frames = &clip.keyframes[&AnimatedProperty::Position];
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].time, 2.0);
        let value = frames[1].value.as_vec2().unwrap();
        assert!(value.approx_eq(&Vec2::new(0.5, 0.6), 1e-9));
        assert_eq!(clip.transform.position, Vec2::CENTER);
    }

    #[test]
    fn test_keyframe_epsilon_comes_from_limits() {
        let (mut project, id) = project_with_image();
        project.tracks[0].clips[0].keyframes.insert(
            AnimatedProperty::Position,
            vec![
                Keyframe::new(0.0, Vec2::new(0.0, 0.5)),
                Keyframe::new(2.2, Vec2::new(0.55, 0.5)),
                Keyframe::new(4.0, Vec2::new(1.0, 0.5)),
            ],
        );
        let viewport = PreviewViewport::new(1280.0, 720.0, canvas(), PreviewZoomMode::Fit);
        let gesture = PreviewGesture::Drag {
            from: Vec2::new(0.0, 0.0),
            to: Vec2::new(0.0, 72.0),
        };

        let next = committed(commit_preview_gesture(&project, &id, gesture, 2.0, &viewport, None));
        assert_eq!(next.find_clip(&id).unwrap().keyframes[&AnimatedProperty::Position].len(), 4);

        let limits = EditLimits {
            keyframe_epsilon: 0.5,
            ..EditLimits::default()
        };
        let next = committed(commit_preview_gesture_with(
            &project, &id, gesture, 2.0, &viewport, None, &limits,
        ));
        let frames = &next.find_clip(&id).unwrap().keyframes[&AnimatedProperty::Position];
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].time, 2.0);
    }

    #[test]
    fn test_resize_is_uniform_and_floored() {
        let (project, id) = project_with_image();
        let viewport = PreviewViewport::new(640.0, 360.0, canvas(), PreviewZoomMode::Fit);

        let gesture = PreviewGesture::Resize {
            width_px: 200.0,
            height_px: 10.0,
        };
        let next = committed(commit_preview_gesture(&project, &id, gesture, 0.0, &viewport, None));
        assert_eq!(next.find_clip(&id).unwrap().transform.scale, Vec2::splat(2.0));

        let gesture = PreviewGesture::Resize {
            width_px: 0.0001,
            height_px: f64::NAN,
        };
        let next = committed(commit_preview_gesture(&project, &id, gesture, 0.0, &viewport, None));
        assert_eq!(
            next.find_clip(&id).unwrap().transform.scale,
            Vec2::splat(MIN_PREVIEW_SCALE)
        );
    }

    #[test]
    fn test_rotation_is_normalized_and_tiny_changes_are_ignored() {
        let (project, id) = project_with_image();
        let viewport = PreviewViewport::new(1280.0, 720.0, canvas(), PreviewZoomMode::Fit);

        let next = committed(commit_preview_gesture(
            &project,
            &id,
            PreviewGesture::Rotate { degrees: -90.0 },
            0.0,
            &viewport,
            None,
        ));
        assert_eq!(next.find_clip(&id).unwrap().transform.rotation, 270.0);

        let outcome = commit_preview_gesture(
            &project,
            &id,
            PreviewGesture::Rotate { degrees: 0.00001 },
            0.0,
            &viewport,
            None,
        );
        assert_eq!(outcome, GestureOutcome::Unchanged);
    }

    #[test]
    fn test_subtitle_clip_and_bad_viewport_are_rejected() {
        let (mut project, id) = project_with_image();
        let text = Clip::new_text("caption", 0.0, 2.0);
        let mut entry = SubtitleEntry::new(0.0, 2.0, "caption");
        entry.id = text.id.clone();
        let text_id = text.id.clone();
        project.tracks[0].clips.push(text);
        project.subtitles.push(entry);

        let viewport = PreviewViewport::new(1280.0, 720.0, canvas(), PreviewZoomMode::Fit);
        let drag = PreviewGesture::Drag {
            from: Vec2::ZERO,
            to: Vec2::new(10.0, 10.0),
        };
        assert!(matches!(
            commit_preview_gesture(&project, &text_id, drag, 1.0, &viewport, None),
            GestureOutcome::Rejected(GestureRejection::SubtitleClip { .. })
        ));

        let broken = PreviewViewport::new(1280.0, 720.0, canvas(), PreviewZoomMode::Level(0.0));
        assert_eq!(
            commit_preview_gesture(&project, &id, drag, 1.0, &broken, None).rejection(),
            Some(&GestureRejection::DegenerateViewport)
        );
    }

    #[test]
    fn test_overlay_and_hit_testing() {
        let (mut project, id) = project_with_image();
        project.tracks[0].clips[0].transform.rotation = 90.0;
        let viewport = PreviewViewport::new(1280.0, 720.0, canvas(), PreviewZoomMode::Fit);
        let clip = project.find_clip(&id).unwrap();

        let overlay = selection_overlay(clip, 1.0, &viewport, None).unwrap();
        assert_eq!(overlay.rect, Rect::new(540.0, 310.0, 200.0, 100.0));

        // Rotated a quarter turn, the frame is 100 wide and 200 tall.
        assert!(overlay.contains(Vec2::new(640.0, 440.0)));
        assert!(!overlay.contains(Vec2::new(730.0, 360.0)));

        let hit = clip_at_point(&project, 1.0, Vec2::new(640.0, 360.0), &viewport, |_| None);
        assert_eq!(hit.map(|c| c.id.as_str()), Some(id.as_str()));
        let miss = clip_at_point(&project, 6.0, Vec2::new(640.0, 360.0), &viewport, |_| None);
        assert!(miss.is_none());
    }
}
