//! Serializers handed to the external transcoder.
//!
//! Subtitles are written as ASS (styled, burned in), SRT, or WebVTT. The
//! [`ExportManifest`] describes the timeline the transcoder reassembles.

use std::path::Path;
use std::str::FromStr;

use clipweave_common::error::{ClipweaveError, ClipweaveResult};
use clipweave_project_model::{
    CanvasSize, ClipKind, ClipSource, KeyframeMap, Project, SubtitleEntry, SubtitleStyle,
    TextAlign, Transform,
};
use serde::{Deserialize, Serialize};

/// Subtitle file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Ass,
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// Format implied by a file extension. Unknown extensions default to SRT.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or(SubtitleFormat::Srt)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Ass => "ass",
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = ClipweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ass" | "ssa" => Ok(SubtitleFormat::Ass),
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            other => Err(ClipweaveError::unsupported(format!(
                "subtitle format '{other}'"
            ))),
        }
    }
}

/// Render subtitles in `format`.
pub fn generate_subtitles(project: &Project, format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Ass => generate_ass(project),
        SubtitleFormat::Srt => generate_srt(&project.subtitles),
        SubtitleFormat::Vtt => generate_vtt(&project.subtitles),
    }
}

/// Generate an ASS script with a single `Default` style.
pub fn generate_ass(project: &Project) -> String {
    let style = &project.subtitle_style;
    let title = if project.name.is_empty() {
        "Untitled Project"
    } else {
        project.name.as_str()
    };

    let mut output = String::new();
    output.push_str("[Script Info]\n");
    output.push_str(&format!("Title: {title}\n"));
    output.push_str("ScriptType: v4.00+\n");
    output.push_str(&format!("PlayResX: {}\n", project.canvas.width));
    output.push_str(&format!("PlayResY: {}\n", project.canvas.height));
    output.push_str("Collisions: Normal\n");
    output.push_str("WrapStyle: 0\n\n");

    output.push_str("[V4+ Styles]\n");
    output.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, BackColour, Bold, Italic, Underline, Alignment\n",
    );
    output.push_str(&format!(
        "Style: Default,{},{},{},{},{},{},{},{}\n\n",
        style.font_family,
        style.font_size,
        css_color_to_ass(&style.color),
        css_color_to_ass(style.background_color.as_deref().unwrap_or("transparent")),
        ass_flag(style.bold),
        ass_flag(style.italic),
        ass_flag(style.underline),
        ass_alignment(style.align),
    ));

    output.push_str("[Events]\n");
    output.push_str("Format: Start, End, Style, Text\n");
    for entry in &project.subtitles {
        output.push_str(&format!(
            "Dialogue: {},{},Default,{}\n",
            format_ass_time(entry.start_time),
            format_ass_time(entry.end_time),
            entry.text.replace('\n', "\\N"),
        ));
    }

    output
}

/// Generate SRT content from subtitle entries.
pub fn generate_srt(entries: &[SubtitleEntry]) -> String {
    let mut output = String::new();

    for (i, entry) in entries.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(entry.start_time),
            format_srt_time(entry.end_time),
        ));
        output.push_str(&entry.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT content from subtitle entries.
pub fn generate_vtt(entries: &[SubtitleEntry]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for entry in entries {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(entry.start_time),
            format_vtt_time(entry.end_time),
        ));
        output.push_str(&entry.text);
        output.push_str("\n\n");
    }

    output
}

/// Format seconds as an ASS timestamp: H:MM:SS.cc
pub fn format_ass_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00:00.00".to_string();
    }
    let total_cs = (secs * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let seconds = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

fn ass_flag(on: bool) -> i32 {
    if on {
        -1
    } else {
        0
    }
}

/// Numpad alignment on the bottom row.
pub fn ass_alignment(align: TextAlign) -> u8 {
    match align {
        TextAlign::Left => 1,
        TextAlign::Center => 2,
        TextAlign::Right => 3,
    }
}

/// Convert a CSS color (`#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb()`, `rgba()`,
/// `transparent`) to ASS `&HAABBGGRR`, where alpha `00` is opaque.
///
/// Unparseable input yields opaque black.
pub fn css_color_to_ass(color: &str) -> String {
    let color = color.trim();
    if color.is_empty() || color.eq_ignore_ascii_case("transparent") {
        return "&H00000000".to_string();
    }

    let (r, g, b, a) = parse_css_color(color).unwrap_or_else(|| {
        tracing::warn!(color, "Unsupported color for ASS conversion");
        (0, 0, 0, 255)
    });
    format!("&H{:02X}{:02X}{:02X}{:02X}", 255 - a, b, g, r)
}

fn parse_css_color(color: &str) -> Option<(u8, u8, u8, u8)> {
    if let Some(hex) = color.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| channel(&format!("{c}{c}")));
                Some((digits.next()??, digits.next()??, digits.next()??, 255))
            }
            6 => Some((
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some((
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        };
    }

    if color.to_ascii_lowercase().starts_with("rgb") {
        let open = color.find('(')?;
        let close = color.rfind(')')?;
        let parts: Vec<f64> = color[open + 1..close]
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if parts.len() < 3 {
            return None;
        }
        let clamp = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        let alpha = parts.get(3).map_or(255, |a| clamp(a * 255.0));
        return Some((clamp(parts[0]), clamp(parts[1]), clamp(parts[2]), alpha));
    }

    None
}

/// Write subtitles to `path`, choosing the format by extension.
pub fn save_subtitles(project: &Project, path: &Path) -> ClipweaveResult<SubtitleFormat> {
    let format = SubtitleFormat::from_path(path);
    std::fs::write(path, generate_subtitles(project, format))?;
    tracing::info!(
        path = %path.display(),
        format = format.extension(),
        entries = project.subtitles.len(),
        "Wrote subtitles"
    );
    Ok(format)
}

/// One clip as the transcoder sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestClip {
    pub id: String,
    pub track: usize,
    pub kind: ClipKind,
    pub source: ClipSource,
    pub start_time: f64,
    pub end_time: f64,
    /// Source position at `start_time`.
    pub media_offset: f64,
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "KeyframeMap::is_empty")]
    pub keyframes: KeyframeMap,
}

/// Timeline description consumed by the external transcoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub name: String,
    pub canvas: CanvasSize,
    pub duration: f64,
    pub muted: bool,
    /// Paint order: track order, then clip order.
    pub clips: Vec<ManifestClip>,
    pub subtitles: Vec<SubtitleEntry>,
    pub subtitle_style: SubtitleStyle,
    pub burn_subtitles: bool,
}

impl ExportManifest {
    /// Subtitle-paired text clips are left out; subtitles travel separately.
    pub fn from_project(project: &Project) -> Self {
        let clips = project
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(track, t)| t.clips.iter().map(move |clip| (track, clip)))
            .filter(|(_, clip)| !project.is_subtitle_clip(clip))
            .map(|(track, clip)| ManifestClip {
                id: clip.id.clone(),
                track,
                kind: clip.kind,
                source: clip.source.clone(),
                start_time: clip.start_time,
                end_time: clip.end_time,
                media_offset: clip.media_offset,
                transform: clip.transform,
                keyframes: clip.keyframes.clone(),
            })
            .collect();

        Self {
            name: project.name.clone(),
            canvas: project.canvas,
            duration: project.total_duration,
            muted: project.muted,
            clips,
            subtitles: project.subtitles.clone(),
            subtitle_style: project.subtitle_style.clone(),
            burn_subtitles: project.subtitles_visible && !project.subtitles.is_empty(),
        }
    }

    pub fn to_json(&self) -> ClipweaveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
