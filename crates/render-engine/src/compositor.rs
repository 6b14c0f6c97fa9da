//! Frame compositor: paints the clips active at a time onto a surface.
//!
//! [`Compositor::compose`] builds the frame plan without side effects;
//! [`Compositor::draw_frame`] syncs media, then paints that plan. Tracks
//! paint in order, clips in track order, and the subtitle overlay last.

use clipweave_common::config::EngineDefaults;
use clipweave_project_model::{CanvasSize, Clip, ClipKind, Project, Rect, TextAlign, Vec2};

use crate::media::{correct_drift, MediaKind, MediaRegistry};
use crate::subtitle_overlay::{layout_subtitle, paint_subtitle, SubtitleLayout};
use crate::surface::{FontSpec, MediaFrame, Surface};

/// Video positions past the media end by more than this are left alone.
const SYNC_END_SLACK_SECS: f64 = 0.1;

/// Drift tolerances used when syncing video handles during a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorConfig {
    /// Tolerance for a paused handle.
    pub paused_drift_secs: f64,
    /// Tolerance for a playing handle.
    pub playing_drift_secs: f64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            paused_drift_secs: 0.05,
            playing_drift_secs: 0.20,
        }
    }
}

impl From<&EngineDefaults> for CompositorConfig {
    fn from(defaults: &EngineDefaults) -> Self {
        Self {
            paused_drift_secs: defaults.paused_draw_drift_secs,
            playing_drift_secs: defaults.playing_draw_drift_secs,
        }
    }
}

/// What a layer paints.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    Media { media_time: f64 },
    Text {
        text: String,
        font: FontSpec,
        color: String,
    },
}

/// One clip, resolved for a single frame in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipLayer {
    pub clip_id: String,
    pub kind: ClipKind,
    pub center: Vec2,
    /// Scaled box size.
    pub width: f64,
    pub height: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub content: LayerContent,
}

impl ClipLayer {
    /// Axis-aligned box before rotation.
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.center, self.width, self.height)
    }
}

/// Everything painted for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameComposition {
    pub time: f64,
    pub canvas: CanvasSize,
    pub layers: Vec<ClipLayer>,
    pub subtitle: Option<SubtitleLayout>,
}

/// Stateless per-frame renderer.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    config: CompositorConfig,
}

impl Compositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Plan the frame at `time`. `measure` supplies text metrics.
    pub fn compose(
        &self,
        time: f64,
        project: &Project,
        media: &MediaRegistry,
        measure: &dyn Surface,
    ) -> FrameComposition {
        let canvas = project.canvas;
        let mut layers = Vec::new();

        for track in &project.tracks {
            for clip in &track.clips {
                if !clip.is_active_at(time) || project.is_subtitle_clip(clip) {
                    continue;
                }
                if let Some(layer) = resolve_layer(clip, time, canvas, media) {
                    layers.push(layer);
                }
            }
        }

        let subtitle = if project.subtitles_visible {
            project.active_subtitle(time).and_then(|entry| {
                layout_subtitle(entry, &project.subtitle_style, canvas, |text, font| {
                    measure.measure_text(text, font)
                })
            })
        } else {
            None
        };

        FrameComposition {
            time,
            canvas,
            layers,
            subtitle,
        }
    }

    /// Sync video handles to `time`, then paint the frame. Never edits the
    /// project.
    pub fn draw_frame(
        &self,
        time: f64,
        project: &Project,
        media: &mut MediaRegistry,
        surface: &mut dyn Surface,
        playing: bool,
    ) -> FrameComposition {
        let canvas = project.canvas;
        if surface.size() != (canvas.width, canvas.height) {
            surface.resize(canvas.width, canvas.height);
        }
        surface.clear();

        self.sync_media(time, project, media, playing);

        let frame = self.compose(time, project, media, &*surface);
        paint_frame(&frame, surface);
        frame
    }

    fn sync_media(&self, time: f64, project: &Project, media: &mut MediaRegistry, playing: bool) {
        let tolerance = if playing {
            self.config.playing_drift_secs
        } else {
            self.config.paused_drift_secs
        };

        for clip in project.clips() {
            if clip.kind != ClipKind::Video || !clip.is_active_at(time) {
                continue;
            }
            let Some(handle) = media.get_mut(&clip.id) else {
                continue;
            };
            if handle.kind() != MediaKind::Video || !handle.is_seekable() {
                continue;
            }
            let Some(duration) = handle.duration() else {
                continue;
            };
            let clip_time = clip.local_time(time);
            if clip_time <= duration + SYNC_END_SLACK_SECS {
                correct_drift(&clip.id, handle, clip_time, tolerance);
            }
        }
    }
}

fn resolve_layer(clip: &Clip, time: f64, canvas: CanvasSize, media: &MediaRegistry) -> Option<ClipLayer> {
    let handle = media.get(&clip.id);
    let transform = clip.transform_at(time);
    let content = match clip.kind {
        ClipKind::Video | ClipKind::Image => {
            let handle = handle?;
            if !handle.has_frame() {
                return None;
            }
            LayerContent::Media {
                media_time: if clip.kind == ClipKind::Video {
                    clip.local_time(time)
                } else {
                    0.0
                },
            }
        }
        ClipKind::Text => {
            let style = clip.text_style.clone().unwrap_or_default();
            LayerContent::Text {
                text: clip.text().unwrap_or_default().to_string(),
                font: FontSpec::new(style.font_family, style.font_size * transform.scale.x),
                color: style.color,
            }
        }
    };

    let base = clip.base_size(handle.and_then(|h| h.natural_size()));
    Some(ClipLayer {
        clip_id: clip.id.clone(),
        kind: clip.kind,
        center: Vec2::new(
            transform.position.x * canvas.width as f64,
            transform.position.y * canvas.height as f64,
        ),
        width: base.width * transform.scale.x,
        height: base.height * transform.scale.y,
        rotation_deg: transform.rotation,
        opacity: transform.opacity,
        content,
    })
}

/// Paint a planned frame onto `surface` without clearing it.
pub fn paint_frame(frame: &FrameComposition, surface: &mut dyn Surface) {
    for layer in &frame.layers {
        surface.save();
        surface.translate(layer.center.x, layer.center.y);
        surface.rotate(layer.rotation_deg.to_radians());
        surface.set_alpha(layer.opacity);

        match &layer.content {
            LayerContent::Media { media_time } => {
                let dest = Rect::new(
                    -layer.width / 2.0,
                    -layer.height / 2.0,
                    layer.width,
                    layer.height,
                );
                let media_frame = MediaFrame {
                    clip_id: layer.clip_id.clone(),
                    media_time: *media_time,
                };
                if let Err(e) = surface.draw_media(&media_frame, dest) {
                    tracing::warn!(clip_id = %layer.clip_id, error = %e, "Failed to draw clip");
                }
            }
            LayerContent::Text { text, font, color } => {
                surface.fill_text(text, Vec2::ZERO, font, TextAlign::Center, color);
            }
        }

        surface.restore();
    }

    if let Some(subtitle) = &frame.subtitle {
        paint_subtitle(subtitle, surface);
    }
}
