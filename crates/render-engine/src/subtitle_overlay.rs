//! Subtitle overlay layout and painting.
//!
//! Layout is resolution independent: every size is a fraction of the
//! canvas. Lines stack upward from a baseline 5% above the bottom edge.

use clipweave_project_model::{CanvasSize, Rect, SubtitleEntry, SubtitleStyle, TextAlign, Vec2};

use crate::surface::{FontSpec, Surface};

/// Font size as a fraction of canvas height.
pub const SUBTITLE_FONT_RATIO: f64 = 0.045;

/// Line advance as a multiple of the font size.
pub const SUBTITLE_LINE_HEIGHT: f64 = 1.2;

/// Distance of the last baseline from the bottom, as a fraction of height.
pub const SUBTITLE_BOTTOM_MARGIN_RATIO: f64 = 0.05;

/// Wrap width as a fraction of canvas width.
pub const SUBTITLE_WRAP_RATIO: f64 = 0.8;

/// Left/right text origin inset as a fraction of canvas width.
pub const SUBTITLE_SIDE_MARGIN_RATIO: f64 = 0.05;

/// Background padding as a multiple of the font size.
pub const SUBTITLE_PADDING_RATIO: f64 = 0.2;

/// One wrapped line, positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleLine {
    pub text: String,
    /// Text origin; its meaning follows `align`.
    pub origin: Vec2,
    pub width: f64,
}

/// Everything needed to paint the active subtitle.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleLayout {
    pub font: FontSpec,
    pub align: TextAlign,
    pub line_height: f64,
    pub lines: Vec<SubtitleLine>,
    /// Background box and its color.
    pub background: Option<(Rect, String)>,
    pub color: String,
    pub outline_color: String,
    pub outline_width: f64,
    pub underline: bool,
}

/// Greedy word wrap. Explicit newlines always break; a single word wider
/// than `max_width` stays on its own line.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }

    for segment in text.split('\n') {
        let mut current = String::new();
        for (i, word) in segment.split(' ').enumerate() {
            if i == 0 {
                current = word.to_string();
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Lay out `entry` on a canvas. `None` when there is nothing to draw.
pub fn layout_subtitle(
    entry: &SubtitleEntry,
    style: &SubtitleStyle,
    canvas: CanvasSize,
    measure: impl Fn(&str, &FontSpec) -> f64,
) -> Option<SubtitleLayout> {
    let width = canvas.width as f64;
    let height = canvas.height as f64;

    let font = FontSpec {
        family: style.font_family.clone(),
        size_px: height * SUBTITLE_FONT_RATIO,
        bold: style.bold,
        italic: style.italic,
    };
    let font_size = font.size_px;

    let wrapped = wrap_lines(&entry.text, width * SUBTITLE_WRAP_RATIO, |s| measure(s, &font));
    if wrapped.is_empty() {
        return None;
    }

    let line_height = font_size * SUBTITLE_LINE_HEIGHT;
    let total_text_height = wrapped.len() as f64 * line_height;
    let x = match style.align {
        TextAlign::Left => width * SUBTITLE_SIDE_MARGIN_RATIO,
        TextAlign::Center => width / 2.0,
        TextAlign::Right => width * (1.0 - SUBTITLE_SIDE_MARGIN_RATIO),
    };
    let last_baseline = height - height * SUBTITLE_BOTTOM_MARGIN_RATIO;

    let count = wrapped.len();
    let lines: Vec<SubtitleLine> = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = measure(&text, &font);
            SubtitleLine {
                origin: Vec2::new(x, last_baseline - (count - 1 - i) as f64 * line_height),
                width,
                text,
            }
        })
        .collect();

    let background = style
        .background_color
        .as_deref()
        .filter(|color| !color.is_empty() && !color.eq_ignore_ascii_case("transparent"))
        .map(|color| {
            let max_width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
            let padding = font_size * SUBTITLE_PADDING_RATIO;
            let box_width = max_width + 2.0 * padding;
            let box_height = total_text_height + font_size * (SUBTITLE_LINE_HEIGHT - 1.0) * 0.5;
            let box_y = last_baseline - total_text_height + (line_height - font_size) / 2.0 - padding
                + font_size * (SUBTITLE_LINE_HEIGHT - 1.0) * 0.25;
            let box_x = match style.align {
                TextAlign::Left => x - padding,
                TextAlign::Right => x - max_width - padding,
                TextAlign::Center => x - box_width / 2.0,
            };
            (
                Rect::new(box_x, box_y, box_width, box_height),
                color.to_string(),
            )
        });

    Some(SubtitleLayout {
        font,
        align: style.align,
        line_height,
        lines,
        background,
        color: style.color.clone(),
        outline_color: style.outline_color.clone(),
        outline_width: style.outline_width,
        underline: style.underline,
    })
}

/// Paint a laid-out subtitle: background, then outline and fill per line,
/// then the optional underline.
pub fn paint_subtitle(layout: &SubtitleLayout, surface: &mut dyn Surface) {
    surface.save();

    if let Some((rect, color)) = &layout.background {
        surface.fill_rect(*rect, color);
    }

    let font_size = layout.font.size_px;
    for line in &layout.lines {
        if layout.outline_width > 0.0 && !layout.outline_color.is_empty() {
            surface.stroke_text(
                &line.text,
                line.origin,
                &layout.font,
                layout.align,
                &layout.outline_color,
                layout.outline_width,
            );
        }
        surface.fill_text(&line.text, line.origin, &layout.font, layout.align, &layout.color);

        if layout.underline {
            let start_x = match layout.align {
                TextAlign::Left => line.origin.x,
                TextAlign::Right => line.origin.x - line.width,
                TextAlign::Center => line.origin.x - line.width / 2.0,
            };
            let y = line.origin.y + (font_size * 0.08).max(2.0);
            surface.stroke_line(
                Vec2::new(start_x, y),
                Vec2::new(start_x + line.width, y),
                &layout.color,
                (font_size / 15.0).max(1.0),
            );
        }
    }

    surface.restore();
}
