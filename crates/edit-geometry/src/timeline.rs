//! Timeline geometry: pixels ↔ seconds, clip move and trim.
//!
//! Gestures are committed against the project value current at commit time,
//! looked up by clip id. Invalid geometry is clamped to the nearest valid
//! value; only subtitle-paired or missing clips are rejected.

use clipweave_common::EngineDefaults;
use clipweave_project_model::{Clip, EditLimits, Project, Rect, MIN_CLIP_DURATION};
use serde::{Deserialize, Serialize};

use crate::gesture::{GestureOutcome, GestureRejection};

/// Zoom multiplier for one zoom-in / zoom-out step.
pub const ZOOM_STEP: f64 = 1.5;

/// Upper bound for stepped zoom.
pub const MAX_PX_PER_SEC: f64 = 1000.0;

/// Lower bound for stepped zoom-out.
pub const MIN_STEPPED_PX_PER_SEC: f64 = 10.0;

/// Timeline zoom in pixels per second of project time, plus the shortest
/// clip a trim may leave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineZoom {
    px_per_sec: f64,
    min_px_per_sec: f64,
    #[serde(default = "default_min_clip_duration")]
    min_clip_duration: f64,
}

fn default_min_clip_duration() -> f64 {
    MIN_CLIP_DURATION
}

impl Default for TimelineZoom {
    fn default() -> Self {
        Self::from(&EngineDefaults::default())
    }
}

impl From<&EngineDefaults> for TimelineZoom {
    fn from(defaults: &EngineDefaults) -> Self {
        let min = if defaults.min_px_per_sec.is_finite() && defaults.min_px_per_sec > 0.0 {
            defaults.min_px_per_sec
        } else {
            1.0
        };
        Self {
            px_per_sec: min,
            min_px_per_sec: min,
            min_clip_duration: EditLimits::from(defaults).min_clip_duration,
        }
        .with_px_per_sec(defaults.default_px_per_sec)
    }
}

impl TimelineZoom {
    /// Zoom with the default floor of one pixel per second.
    pub fn new(px_per_sec: f64) -> Self {
        Self {
            px_per_sec: 1.0,
            min_px_per_sec: 1.0,
            min_clip_duration: MIN_CLIP_DURATION,
        }
        .with_px_per_sec(px_per_sec)
    }

    /// Shortest clip duration a gesture can produce.
    pub fn min_clip_duration(&self) -> f64 {
        self.min_clip_duration
    }

    /// Copy with a new zoom, floor-clamped. Non-finite input keeps the
    /// current value.
    pub fn with_px_per_sec(mut self, px_per_sec: f64) -> Self {
        if px_per_sec.is_finite() {
            self.px_per_sec = px_per_sec.max(self.min_px_per_sec);
        } else {
            tracing::warn!(px_per_sec, "Ignoring non-finite timeline zoom");
        }
        self
    }

    pub fn px_per_sec(&self) -> f64 {
        self.px_per_sec
    }

    pub fn zoom_in(self) -> Self {
        if self.px_per_sec >= MAX_PX_PER_SEC {
            return self;
        }
        self.with_px_per_sec((self.px_per_sec * ZOOM_STEP).min(MAX_PX_PER_SEC))
    }

    pub fn zoom_out(self) -> Self {
        let floor = MIN_STEPPED_PX_PER_SEC.max(self.min_px_per_sec);
        if self.px_per_sec <= floor {
            return self;
        }
        self.with_px_per_sec((self.px_per_sec / ZOOM_STEP).max(floor))
    }

    /// Seconds covered by a pixel distance. Non-finite input is zero.
    pub fn px_to_secs(&self, px: f64) -> f64 {
        if px.is_finite() {
            px / self.px_per_sec
        } else {
            0.0
        }
    }

    pub fn secs_to_px(&self, secs: f64) -> f64 {
        secs * self.px_per_sec
    }

    /// Horizontal placement of a clip on its lane; `y`/`height` come from
    /// the lane.
    pub fn clip_rect(&self, clip: &Clip, lane_top: f64, lane_height: f64) -> Rect {
        Rect::new(
            self.secs_to_px(clip.start_time),
            lane_top,
            self.secs_to_px(clip.duration),
            lane_height,
        )
    }

    /// Full width of the timeline content for a project.
    pub fn content_width(&self, project: &Project) -> f64 {
        let total = if project.total_duration.is_finite() {
            project.total_duration.max(0.0)
        } else {
            0.0
        };
        self.secs_to_px(total)
    }

    /// Playhead time under a pointer, clamped to the timeline.
    pub fn time_at(&self, x_px: f64, project: &Project) -> f64 {
        project.clamp_time(self.px_to_secs(x_px))
    }
}

/// A committed pointer gesture on a timeline clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineGesture {
    /// Horizontal drag of the whole clip.
    Move { delta_px: f64 },
    /// Drag of the left edge.
    ResizeLeading { delta_px: f64 },
    /// Drag of the right edge, reported as the new clip width.
    ResizeTrailing { new_width_px: f64 },
}

impl TimelineGesture {
    /// New `(start, duration)` for a clip under this gesture.
    pub fn retime(&self, clip: &Clip, zoom: &TimelineZoom) -> (f64, f64) {
        let min_duration = zoom.min_clip_duration;
        let start = finite_or(clip.start_time, 0.0);
        let duration = finite_or(clip.duration, min_duration).max(min_duration);
        match *self {
            TimelineGesture::Move { delta_px } => {
                let new_start = (start + zoom.px_to_secs(delta_px)).max(0.0);
                (new_start, duration)
            }
            TimelineGesture::ResizeLeading { delta_px } => {
                let end = start + duration;
                let new_start = (start + zoom.px_to_secs(delta_px))
                    .min(end - min_duration)
                    .max(0.0);
                (new_start, (end - new_start).max(min_duration))
            }
            TimelineGesture::ResizeTrailing { new_width_px } if new_width_px.is_finite() => {
                (start, zoom.px_to_secs(new_width_px).max(min_duration))
            }
            TimelineGesture::ResizeTrailing { .. } => (start, duration),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TimelineGesture::Move { .. } => "move",
            TimelineGesture::ResizeLeading { .. } => "resize_leading",
            TimelineGesture::ResizeTrailing { .. } => "resize_trailing",
        }
    }
}

/// Apply a timeline gesture to the clip `clip_id` of `project`.
///
/// The edited track is re-sorted by start time and `total_duration` is
/// recomputed. Overlapping clips are left as they are.
pub fn commit_timeline_gesture(
    project: &Project,
    clip_id: &str,
    gesture: TimelineGesture,
    zoom: &TimelineZoom,
) -> GestureOutcome {
    let Some((ti, ci)) = project.locate_clip(clip_id) else {
        return GestureOutcome::Rejected(GestureRejection::ClipNotFound {
            id: clip_id.to_string(),
        });
    };
    let clip = &project.tracks[ti].clips[ci];
    if project.is_subtitle_clip(clip) {
        return GestureOutcome::Rejected(GestureRejection::SubtitleClip {
            id: clip_id.to_string(),
        });
    }

    let (start, duration) = gesture.retime(clip, zoom);
    if start == clip.start_time && duration == clip.duration && clip.end_time == start + duration {
        return GestureOutcome::Unchanged;
    }

    tracing::debug!(
        clip_id,
        gesture = gesture.name(),
        from_start = clip.start_time,
        from_duration = clip.duration,
        start,
        duration,
        "Committing timeline gesture"
    );

    let mut next = project.clone();
    let track = &mut next.tracks[ti];
    track.clips[ci] = clip.with_timing(start, duration);
    track
        .clips
        .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    GestureOutcome::Committed(next.touched())
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipweave_project_model::{CanvasSize, ClipKind, ClipSource, SubtitleEntry};

    fn project_with(clips: Vec<Clip>) -> Project {
        let mut project = Project::new("Timeline", CanvasSize::default());
        project.tracks[0].clips = clips;
        project.touched()
    }

    fn image(start: f64, duration: f64) -> Clip {
        Clip::new_media(
            ClipKind::Image,
            ClipSource::Url("still.png".into()),
            "still.png",
            start,
            duration,
        )
    }

    fn committed(outcome: GestureOutcome) -> Project {
        match outcome {
            GestureOutcome::Committed(project) => project,
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_zoom_is_floor_clamped() {
        assert_eq!(TimelineZoom::new(0.2).px_per_sec(), 1.0);
        assert_eq!(TimelineZoom::new(-40.0).px_per_sec(), 1.0);
        assert_eq!(TimelineZoom::new(f64::NAN).px_per_sec(), 1.0);
        assert_eq!(TimelineZoom::default().px_per_sec(), 50.0);
    }

    #[test]
    fn test_zoom_steps_are_bounded() {
        let zoom = TimelineZoom::new(50.0);
        assert_eq!(zoom.zoom_in().px_per_sec(), 75.0);
        assert!((zoom.zoom_out().px_per_sec() - 50.0 / 1.5).abs() < 1e-9);
        assert_eq!(TimelineZoom::new(900.0).zoom_in().px_per_sec(), 1000.0);
        assert_eq!(TimelineZoom::new(12.0).zoom_out().px_per_sec(), 10.0);
        // Below the stepped floor, zooming out never zooms in.
        assert_eq!(TimelineZoom::new(4.0).zoom_out().px_per_sec(), 4.0);
    }

    #[test]
    fn test_move_clamps_at_zero_and_keeps_duration() {
        let clip = image(1.0, 3.0);
        let id = clip.id.clone();
        let project = project_with(vec![clip]);
        let zoom = TimelineZoom::new(50.0);

        let next = committed(commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::Move { delta_px: -500.0 },
            &zoom,
        ));
        let moved = next.find_clip(&id).unwrap();
        assert_eq!(moved.start_time, 0.0);
        assert_eq!(moved.duration, 3.0);
        assert_eq!(moved.end_time, 3.0);
        assert_eq!(next.total_duration, 3.0);
    }

    #[test]
    fn test_leading_resize_keeps_end_fixed() {
        let clip = image(2.0, 4.0);
        let id = clip.id.clone();
        let project = project_with(vec![clip]);
        let zoom = TimelineZoom::new(10.0);

        let next = committed(commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::ResizeLeading { delta_px: 10.0 },
            &zoom,
        ));
        let trimmed = next.find_clip(&id).unwrap();
        assert_eq!(trimmed.start_time, 3.0);
        assert_eq!(trimmed.duration, 3.0);
        assert_eq!(trimmed.end_time, 6.0);

        // Dragging past the end stops at the minimum duration.
        let next = committed(commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::ResizeLeading { delta_px: 1_000.0 },
            &zoom,
        ));
        let trimmed = next.find_clip(&id).unwrap();
        assert!((trimmed.duration - MIN_CLIP_DURATION).abs() < 1e-9);
        assert!((trimmed.end_time - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_resize_floors_duration() {
        let clip = image(0.0, 5.0);
        let id = clip.id.clone();
        let project = project_with(vec![clip]);
        let zoom = TimelineZoom::new(50.0);

        let next = committed(commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::ResizeTrailing { new_width_px: 1.0 },
            &zoom,
        ));
        assert_eq!(next.find_clip(&id).unwrap().duration, MIN_CLIP_DURATION);
        assert_eq!(next.total_duration, MIN_CLIP_DURATION);
    }

    #[test]
    fn test_configured_min_duration_floors_trim() {
        let clip = image(0.0, 5.0);
        let id = clip.id.clone();
        let project = project_with(vec![clip]);
        let engine = EngineDefaults {
            min_clip_duration: 0.5,
            ..EngineDefaults::default()
        };
        let zoom = TimelineZoom::from(&engine);
        assert_eq!(zoom.min_clip_duration(), 0.5);

        let next = committed(commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::ResizeTrailing { new_width_px: 1.0 },
            &zoom,
        ));
        assert_eq!(next.find_clip(&id).unwrap().duration, 0.5);

        let next = committed(commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::ResizeLeading { delta_px: 10_000.0 },
            &zoom,
        ));
        let clip = next.find_clip(&id).unwrap();
        assert!((clip.start_time - 4.5).abs() < 1e-9);
        assert!((clip.duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_pixels_do_not_move() {
        let clip = image(1.0, 2.0);
        let id = clip.id.clone();
        let project = project_with(vec![clip]);
        let zoom = TimelineZoom::default();

        for gesture in [
            TimelineGesture::Move { delta_px: f64::NAN },
            TimelineGesture::ResizeLeading {
                delta_px: f64::INFINITY,
            },
            TimelineGesture::ResizeTrailing {
                new_width_px: f64::NAN,
            },
        ] {
            assert_eq!(
                commit_timeline_gesture(&project, &id, gesture, &zoom),
                GestureOutcome::Unchanged
            );
        }
    }

    #[test]
    fn test_move_resorts_track_without_resolving_overlap() {
        let a = image(0.0, 2.0);
        let b = image(3.0, 2.0);
        let a_id = a.id.clone();
        let b_id = b.id.clone();
        let project = project_with(vec![a, b]);
        let zoom = TimelineZoom::new(10.0);

        let next = committed(commit_timeline_gesture(
            &project,
            &a_id,
            TimelineGesture::Move { delta_px: 40.0 },
            &zoom,
        ));
        let ids: Vec<_> = next.tracks[0].clips.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![b_id, a_id]);
        assert_eq!(next.tracks[0].clips[1].start_time, 4.0);
        assert_eq!(next.total_duration, 6.0);
    }

    #[test]
    fn test_subtitle_clip_is_rejected() {
        let clip = Clip::new_text("hello", 0.0, 2.0);
        let mut entry = SubtitleEntry::new(0.0, 2.0, "hello");
        entry.id = clip.id.clone();
        let id = clip.id.clone();
        let mut project = project_with(vec![clip]);
        project.subtitles.push(entry);

        let outcome = commit_timeline_gesture(
            &project,
            &id,
            TimelineGesture::Move { delta_px: 100.0 },
            &TimelineZoom::default(),
        );
        assert_eq!(
            outcome.rejection(),
            Some(&GestureRejection::SubtitleClip { id: id.clone() })
        );
    }

    #[test]
    fn test_missing_clip_is_rejected() {
        let project = project_with(vec![]);
        let outcome = commit_timeline_gesture(
            &project,
            "nope",
            TimelineGesture::Move { delta_px: 1.0 },
            &TimelineZoom::default(),
        );
        assert!(matches!(
            outcome,
            GestureOutcome::Rejected(GestureRejection::ClipNotFound { .. })
        ));
    }

    #[test]
    fn test_clip_rect_and_time_at() {
        let clip = image(2.0, 3.0);
        let project = project_with(vec![clip.clone()]);
        let zoom = TimelineZoom::new(20.0);
        let rect = zoom.clip_rect(&clip, 10.0, 40.0);
        assert_eq!(rect, Rect::new(40.0, 10.0, 60.0, 40.0));
        assert_eq!(zoom.content_width(&project), 100.0);
        assert_eq!(zoom.time_at(60.0, &project), 3.0);
        assert_eq!(zoom.time_at(10_000.0, &project), 5.0);
    }
}
