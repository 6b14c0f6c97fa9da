//! Show project information.

use std::path::PathBuf;

use clipweave_common::config::AppConfig;
use clipweave_edit_geometry::{format_ruler_label, format_timecode, ruler_ticks, TimelineZoom};
use clipweave_project_model::{AnimatedProperty, LoadedProject};

pub fn run(path: PathBuf, px_per_sec: Option<f64>, config: &AppConfig) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let p = &project.project;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!("  Canvas: {}x{}", p.canvas.width, p.canvas.height);
    println!("  Duration: {}", format_timecode(p.total_duration));
    println!("  Playback rate: {}x", p.playback_rate);
    println!("  Muted: {}", p.muted);
    println!();

    println!("Tracks:");
    for (i, track) in p.tracks.iter().enumerate() {
        println!("  Track {} ({} clips)", i + 1, track.clips.len());
        for clip in &track.clips {
            let animated: Vec<&str> = AnimatedProperty::ALL
                .iter()
                .filter(|prop| clip.has_keyframes(**prop))
                .map(|prop| prop.name())
                .collect();
            let subtitle = if p.is_subtitle_clip(clip) {
                " [subtitle]"
            } else {
                ""
            };
            println!(
                "    {} {:?} '{}' {:.2}s → {:.2}s{}",
                clip.id, clip.kind, clip.name, clip.start_time, clip.end_time, subtitle
            );
            if !animated.is_empty() {
                println!("      Animated: {}", animated.join(", "));
            }
        }
    }
    println!();

    println!("Subtitles: {}", p.subtitles.len());
    println!(
        "  Style: {} {}px, {:?}",
        p.subtitle_style.font_family, p.subtitle_style.font_size, p.subtitle_style.align
    );
    println!("  Visible: {}", p.subtitles_visible);
    println!();

    let zoom = TimelineZoom::from(&config.engine).with_px_per_sec(
        px_per_sec.unwrap_or(config.engine.default_px_per_sec),
    );
    let labels: Vec<String> = ruler_ticks(p.total_duration, zoom.px_per_sec())
        .into_iter()
        .map(format_ruler_label)
        .collect();
    println!("Ruler @ {} px/s:", zoom.px_per_sec());
    println!("  {}", labels.join("  "));

    Ok(())
}
