//! Drawing surface abstraction and a recording implementation.
//!
//! [`Surface`] mirrors the small subset of a 2D canvas context the
//! compositor needs: a transform stack, global alpha, media blits, text, and
//! filled rectangles. [`DisplayList`] records the calls so frames can be
//! inspected headlessly.

use clipweave_project_model::{Rect, TextAlign, Vec2};

/// Font used for text drawing and measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size_px: f64,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size_px: f64) -> Self {
        Self {
            family: family.into(),
            size_px,
            bold: false,
            italic: false,
        }
    }

    /// CSS shorthand, e.g. `italic bold 32px Arial`.
    pub fn css(&self) -> String {
        format!(
            "{}{}{}px {}",
            if self.italic { "italic " } else { "" },
            if self.bold { "bold " } else { "" },
            self.size_px,
            self.family
        )
    }
}

/// The frame of a media handle to blit.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFrame {
    pub clip_id: String,
    /// Position inside the media, in seconds.
    pub media_time: f64,
}

/// Errors from a surface backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Draw failed: {message}")]
    DrawFailed { message: String },
}

impl From<RenderError> for clipweave_common::ClipweaveError {
    fn from(err: RenderError) -> Self {
        Self::render(err.to_string())
    }
}

/// A 2D drawing target.
pub trait Surface {
    /// Current size in pixels.
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    /// Push the transform and alpha state.
    fn save(&mut self);

    /// Pop the transform and alpha state.
    fn restore(&mut self);

    fn translate(&mut self, x: f64, y: f64);

    fn rotate(&mut self, radians: f64);

    fn set_alpha(&mut self, alpha: f64);

    /// Blit a media frame into `dest` (current transform applies).
    fn draw_media(&mut self, frame: &MediaFrame, dest: Rect) -> Result<(), RenderError>;

    /// Width of `text` in pixels when drawn with `font`.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f64;

    fn fill_text(&mut self, text: &str, origin: Vec2, font: &FontSpec, align: TextAlign, color: &str);

    fn stroke_text(
        &mut self,
        text: &str,
        origin: Vec2,
        font: &FontSpec,
        align: TextAlign,
        color: &str,
        line_width: f64,
    );

    fn fill_rect(&mut self, rect: Rect, color: &str);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: &str, line_width: f64);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize { width: u32, height: u32 },
    Clear,
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Rotate { radians: f64 },
    SetAlpha { alpha: f64 },
    Media { frame: MediaFrame, dest: Rect },
    FillText {
        text: String,
        origin: Vec2,
        font: String,
        align: TextAlign,
        color: String,
    },
    StrokeText {
        text: String,
        origin: Vec2,
        font: String,
        color: String,
        line_width: f64,
    },
    FillRect { rect: Rect, color: String },
    Line {
        from: Vec2,
        to: Vec2,
        color: String,
        line_width: f64,
    },
}

/// Surface that records every call.
///
/// Text is measured as a fixed-advance font: half the font size per
/// character.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drop the recorded calls, keeping the size.
    pub fn reset(&mut self) {
        self.ops.clear();
    }

    /// Media blits in paint order.
    pub fn media_draws(&self) -> Vec<&MediaFrame> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Media { frame, .. } => Some(frame),
                _ => None,
            })
            .collect()
    }

    /// Filled text strings in paint order.
    pub fn filled_text(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Nesting depth after replaying the recorded save/restore calls.
    pub fn save_depth(&self) -> i64 {
        self.ops.iter().fold(0, |depth, op| match op {
            DrawOp::Save => depth + 1,
            DrawOp::Restore => depth - 1,
            _ => depth,
        })
    }
}

impl Surface for DisplayList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.ops.push(DrawOp::Resize { width, height });
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Translate { x, y });
    }

    fn rotate(&mut self, radians: f64) {
        self.ops.push(DrawOp::Rotate { radians });
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ops.push(DrawOp::SetAlpha { alpha });
    }

    fn draw_media(&mut self, frame: &MediaFrame, dest: Rect) -> Result<(), RenderError> {
        self.ops.push(DrawOp::Media {
            frame: frame.clone(),
            dest,
        });
        Ok(())
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px * 0.5
    }

    fn fill_text(&mut self, text: &str, origin: Vec2, font: &FontSpec, align: TextAlign, color: &str) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            origin,
            font: font.css(),
            align,
            color: color.to_string(),
        });
    }

    fn stroke_text(
        &mut self,
        text: &str,
        origin: Vec2,
        font: &FontSpec,
        _align: TextAlign,
        color: &str,
        line_width: f64,
    ) {
        self.ops.push(DrawOp::StrokeText {
            text: text.to_string(),
            origin,
            font: font.css(),
            color: color.to_string(),
            line_width,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: &str) {
        self.ops.push(DrawOp::FillRect {
            rect,
            color: color.to_string(),
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: &str, line_width: f64) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color: color.to_string(),
            line_width,
        });
    }
}
