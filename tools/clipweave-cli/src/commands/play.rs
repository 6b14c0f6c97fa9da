//! Headless playback to the end of the timeline.
//!
//! Every media clip gets a simulated handle. By default a manual clock
//! advances one frame interval per tick so the run is deterministic. With
//! `--realtime` the loop is paced by a tokio interval and timed by the
//! system clock.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clipweave_common::clock::{Clock, ManualClock, SystemClock};
use clipweave_common::config::AppConfig;
use clipweave_edit_geometry::format_timecode;
use clipweave_playback_engine::{
    EditorMode, ManualScheduler, PlaybackConfig, PlaybackContext, PlaybackController, TickOutcome,
};
use clipweave_project_model::{ClipKind, EditLimits, IntrinsicSize, LoadedProject, ProjectStore};
use clipweave_render_engine::{DisplayList, MediaRegistry, SimulatedMedia};

/// Safety stop for projects whose duration cannot be reached.
const MAX_TICKS: u64 = 10_000_000;

pub async fn run(
    path: PathBuf,
    from: f64,
    rate: Option<f64>,
    fps: u32,
    realtime: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    anyhow::ensure!(fps > 0, "fps must be positive");

    let loaded =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let mut store = ProjectStore::with_limits(loaded.project, EditLimits::from(&config.engine));

    let mut media = MediaRegistry::new();
    let mut handles = Vec::new();
    for clip in store.project().clips() {
        let handle = match clip.kind {
            ClipKind::Video => SimulatedMedia::video(
                clip.media_duration.unwrap_or(clip.media_offset + clip.duration),
                clip.intrinsic_size,
            ),
            ClipKind::Image => SimulatedMedia::image(
                clip.intrinsic_size
                    .unwrap_or_else(|| IntrinsicSize::new(1280.0, 720.0)),
            ),
            ClipKind::Text => continue,
        };
        media.insert(clip.id.clone(), handle.boxed());
        handles.push(handle);
    }

    let canvas = store.project().canvas;
    let mut surface = DisplayList::new(canvas.width, canvas.height);
    let manual = Rc::new(ManualClock::new(0.0));
    let wall = realtime.then(SystemClock::start);
    let clock: Rc<dyn Clock> = match &wall {
        Some(wall) => Rc::new(wall.clone()) as Rc<dyn Clock>,
        None => Rc::clone(&manual) as Rc<dyn Clock>,
    };
    let mut playback = PlaybackController::new(
        Rc::clone(&clock),
        ManualScheduler::new(),
        PlaybackConfig::from(&config.engine),
    );
    playback.set_mode(EditorMode::Editor, &mut media);

    {
        let project = store.project().clone();
        playback.on_project_replaced(PlaybackContext::new(&project, &mut media, &mut surface));
    }
    if let Some(rate) = rate {
        anyhow::ensure!(
            playback.set_playback_rate(rate, &mut store, &mut media),
            "Playback rate {rate} is not one of {:?}",
            config.engine.playback_rates
        );
    }

    let project = store.project().clone();
    let start = playback.seek(from, PlaybackContext::new(&project, &mut media, &mut surface));
    println!(
        "Playing '{}' from {} to {} at {}x",
        project.name,
        format_timecode(start),
        format_timecode(project.total_duration),
        playback.playback_rate()
    );
    if let Some(wall) = &wall {
        println!("  Wall clock started at {}", wall.epoch_wall());
    }
    playback.toggle_play(PlaybackContext::new(&project, &mut media, &mut surface));

    let frame_ms = 1000.0 / f64::from(fps);
    let mut last_ms = clock.now_ms();
    let mut interval = tokio::time::interval(Duration::from_secs_f64(frame_ms / 1000.0));
    let mut ticks = 0u64;
    let outcome = loop {
        if realtime {
            interval.tick().await;
        }
        if playback.scheduler_mut().fire().is_none() && !playback.is_playing() {
            break TickOutcome::Idle;
        }
        if wall.is_none() {
            manual.advance_ms(frame_ms);
        }
        let now_ms = clock.now_ms();
        let elapsed_secs = (now_ms - last_ms) / 1000.0;
        last_ms = now_ms;
        for handle in &handles {
            handle.advance(elapsed_secs);
        }

        ticks += 1;
        match playback.tick(PlaybackContext::new(&project, &mut media, &mut surface)) {
            TickOutcome::Advanced { time } => {
                tracing::trace!(time, "Frame");
                if ticks >= MAX_TICKS {
                    tracing::warn!(ticks, "Tick limit reached, stopping playback");
                    break TickOutcome::Advanced { time };
                }
            }
            other => break other,
        }
    };

    let seeks: usize = handles.iter().map(|h| h.seek_count()).sum();
    playback.shutdown(&mut media);

    println!("Playback finished: {outcome:?}");
    println!("  Ticks: {ticks}");
    println!("  Frames drawn: {}", playback.frames_drawn());
    println!("  Final time: {}", format_timecode(playback.current_time()));
    println!("  Media corrections: {seeks}");
    if let Some(wall) = &wall {
        println!("  Wall time: {:.2}s", wall.elapsed_secs());
    }

    Ok(())
}
