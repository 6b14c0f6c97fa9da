//! Timeline edits applied to a project on disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clipweave_common::config::AppConfig;
use clipweave_edit_geometry::{commit_timeline_gesture, GestureOutcome, TimelineGesture, TimelineZoom};
use clipweave_project_model::{
    ClipKind, ClipSource, EditLimits, IntrinsicSize, LoadedProject, ProjectCommand, ProjectStore,
};

fn load(path: &Path) -> anyhow::Result<LoadedProject> {
    LoadedProject::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}

/// Apply `f` through a store and write the result back.
fn edit(
    path: PathBuf,
    config: &AppConfig,
    f: impl FnOnce(&mut ProjectStore) -> anyhow::Result<()>,
) -> anyhow::Result<LoadedProject> {
    let loaded = load(&path)?;
    let mut store = ProjectStore::with_limits(loaded.project, EditLimits::from(&config.engine));
    f(&mut store)?;
    let saved = LoadedProject {
        root: loaded.root,
        project: store.into_project(),
    };
    saved
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
    Ok(saved)
}

fn parse_size(size: &str) -> anyhow::Result<IntrinsicSize> {
    let (w, h) = size
        .split_once(['x', 'X'])
        .with_context(|| format!("Size must look like 1920x1080, got '{size}'"))?;
    let size = IntrinsicSize::new(w.trim().parse()?, h.trim().parse()?);
    anyhow::ensure!(size.is_usable(), "Size must be positive");
    Ok(size)
}

pub fn add_media(
    path: PathBuf,
    source: String,
    kind: String,
    duration: Option<f64>,
    size: Option<String>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let kind: ClipKind = kind.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
    anyhow::ensure!(kind.is_media(), "Use add-text for text clips");
    let size = size.as_deref().map(parse_size).transpose()?;

    let name = PathBuf::from(&source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.clone());

    let saved = edit(path, config, |store| {
        store.apply(ProjectCommand::AddMediaClip {
            kind,
            source: ClipSource::Url(source.clone()),
            name,
            duration,
        })?;
        let clip_id = store
            .project()
            .tracks
            .first()
            .and_then(|t| t.clips.last())
            .map(|c| c.id.clone())
            .context("Clip was not added")?;
        if size.is_some() {
            store.apply(ProjectCommand::SetMediaMetadata {
                clip_id,
                intrinsic_size: size,
                duration,
            })?;
        }
        Ok(())
    })?;

    if let Some(clip) = saved.project.tracks.first().and_then(|t| t.clips.last()) {
        println!(
            "Added {:?} clip {} at {:.2}s ({:.2}s long)",
            clip.kind, clip.id, clip.start_time, clip.duration
        );
        if clip.is_pending_media() {
            println!("  Duration pending until media metadata is known");
        }
    }
    println!("Timeline duration: {:.2}s", saved.project.total_duration);
    Ok(())
}

pub fn add_text(path: PathBuf, text: String, at: f64, config: &AppConfig) -> anyhow::Result<()> {
    let saved = edit(path, config, |store| {
        store.apply(ProjectCommand::AddTextClip { text, at })?;
        Ok(())
    })?;
    if let Some(clip) = saved.project.tracks.first().and_then(|t| t.clips.last()) {
        println!(
            "Added text clip {} at {:.2}s ({:.2}s long)",
            clip.id, clip.start_time, clip.duration
        );
    }
    Ok(())
}

fn zoom_for(px_per_sec: Option<f64>, config: &AppConfig) -> TimelineZoom {
    let zoom = TimelineZoom::from(&config.engine);
    match px_per_sec {
        Some(pps) => zoom.with_px_per_sec(pps),
        None => zoom,
    }
}

fn commit(
    path: PathBuf,
    clip: String,
    gesture: TimelineGesture,
    zoom: TimelineZoom,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let saved = edit(path, config, |store| {
        match commit_timeline_gesture(store.project(), &clip, gesture, &zoom) {
            GestureOutcome::Committed(next) => {
                store.update(move |_| next);
                Ok(())
            }
            GestureOutcome::Unchanged => {
                println!("No change");
                Ok(())
            }
            GestureOutcome::Rejected(reason) => Err(reason.into()),
        }
    })?;

    if let Some(c) = saved.project.find_clip(&clip) {
        println!(
            "Clip {}: {:.3}s → {:.3}s ({:.3}s)",
            c.id, c.start_time, c.end_time, c.duration
        );
    }
    println!("Timeline duration: {:.3}s", saved.project.total_duration);
    Ok(())
}

pub fn move_clip(
    path: PathBuf,
    clip: String,
    delta_px: f64,
    px_per_sec: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    commit(
        path,
        clip,
        TimelineGesture::Move { delta_px },
        zoom_for(px_per_sec, config),
        config,
    )
}

pub fn trim_clip(
    path: PathBuf,
    clip: String,
    leading_px: Option<f64>,
    trailing_width_px: Option<f64>,
    px_per_sec: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let gesture = match (leading_px, trailing_width_px) {
        (Some(delta_px), None) => TimelineGesture::ResizeLeading { delta_px },
        (None, Some(new_width_px)) => TimelineGesture::ResizeTrailing { new_width_px },
        _ => anyhow::bail!("Pass exactly one of --leading-px or --trailing-width-px"),
    };
    commit(path, clip, gesture, zoom_for(px_per_sec, config), config)
}
