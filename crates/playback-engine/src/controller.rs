//! Playback state machine.
//!
//! The controller holds the logical playhead and a `{paused, playing}` flag,
//! gated by the editor mode. While playing, each fired frame calls
//! [`PlaybackController::tick`], which advances the playhead by the clock
//! delta times the rate, syncs video handles, draws, and requests the next
//! frame. Faults in time state are repaired here and never reach the
//! compositor.

use clipweave_common::clock::{ms_to_secs, Clock};
use clipweave_common::config::EngineDefaults;
use clipweave_project_model::{ClipKind, Project, ProjectCommand, ProjectStore};
use clipweave_render_engine::{
    correct_drift, Compositor, CompositorConfig, MediaHandle, MediaRegistry, ReadyState, Surface,
};
use serde::{Deserialize, Serialize};

use crate::scheduler::{FrameHandle, FrameScheduler};

/// Video positions past the media end by more than this are not corrected.
const SYNC_END_SLACK_SECS: f64 = 0.1;

/// Editor-level mode. Playback only runs in [`EditorMode::Editor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    #[default]
    Initial,
    Uploading,
    Transcribing,
    ProcessingVideo,
    Editor,
}

/// Timing parameters of the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Drift tolerated on explicit seeks.
    pub seek_drift_secs: f64,
    /// Drift tolerated during ticks.
    pub tick_drift_secs: f64,
    /// Allowed playback rates.
    pub playback_rates: Vec<f64>,
    pub compositor: CompositorConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::from(&EngineDefaults::default())
    }
}

impl From<&EngineDefaults> for PlaybackConfig {
    fn from(defaults: &EngineDefaults) -> Self {
        Self {
            seek_drift_secs: defaults.seek_drift_tolerance_secs,
            tick_drift_secs: defaults.tick_drift_tolerance_secs,
            playback_rates: defaults.playback_rates.clone(),
            compositor: CompositorConfig::from(defaults),
        }
    }
}

impl PlaybackConfig {
    pub fn is_allowed_rate(&self, rate: f64) -> bool {
        self.playback_rates
            .iter()
            .any(|allowed| (allowed - rate).abs() < 1e-9)
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not playing or not in editor mode; nothing happened.
    Idle,
    /// Playhead advanced and the next frame was requested.
    Advanced { time: f64 },
    /// Reached the end of the timeline; playback stopped.
    Ended { time: f64 },
    /// Corrupt time state was found; playback stopped at a safe time.
    Repaired { time: f64 },
}

/// Borrowed state a playback action works on.
pub struct PlaybackContext<'a> {
    pub project: &'a Project,
    pub media: &'a mut MediaRegistry,
    pub surface: &'a mut dyn Surface,
}

impl<'a> PlaybackContext<'a> {
    pub fn new(
        project: &'a Project,
        media: &'a mut MediaRegistry,
        surface: &'a mut dyn Surface,
    ) -> Self {
        Self {
            project,
            media,
            surface,
        }
    }
}

/// Logical clock and play/pause state machine.
pub struct PlaybackController<C: Clock, S: FrameScheduler> {
    clock: C,
    scheduler: S,
    compositor: Compositor,
    config: PlaybackConfig,
    mode: EditorMode,
    playing: bool,
    current_time: f64,
    last_valid_time: f64,
    last_tick_ms: f64,
    rate: f64,
    pending_frame: Option<FrameHandle>,
    frames_drawn: u64,
}

impl<C: Clock, S: FrameScheduler> PlaybackController<C, S> {
    pub fn new(clock: C, scheduler: S, config: PlaybackConfig) -> Self {
        let now = clock.now_ms();
        Self {
            compositor: Compositor::new(config.compositor),
            clock,
            scheduler,
            config,
            mode: EditorMode::Initial,
            playing: false,
            current_time: 0.0,
            last_valid_time: 0.0,
            last_tick_ms: now,
            rate: 1.0,
            pending_frame: None,
            frames_drawn: 0,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Clock multiplier.
    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    /// Frames drawn since construction.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Whether a frame callback is outstanding.
    pub fn has_scheduled_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Switch editor mode. Leaving the editor while playing stops playback.
    pub fn set_mode(&mut self, mode: EditorMode, media: &mut MediaRegistry) {
        if mode == self.mode {
            return;
        }
        tracing::debug!(from = ?self.mode, to = ?mode, "Editor mode changed");
        self.mode = mode;
        if mode != EditorMode::Editor && self.playing {
            self.force_pause(media);
        }
    }

    /// Flip between playing and paused. Returns the new playing flag.
    pub fn toggle_play(&mut self, ctx: PlaybackContext<'_>) -> bool {
        if self.mode != EditorMode::Editor {
            if self.playing {
                self.force_pause(ctx.media);
            }
            tracing::debug!(mode = ?self.mode, "Ignoring play toggle outside editor");
            return false;
        }

        let project = ctx.project;
        let next_playing = !self.playing;
        let total = project.total_duration;
        if next_playing && total > 0.0 && self.current_time >= total {
            self.set_time(0.0);
        }
        self.last_tick_ms = self.clock.now_ms();

        let time = self.current_time;
        for clip in project.clips() {
            if clip.kind != ClipKind::Video {
                continue;
            }
            let Some(handle) = ctx.media.get_mut(&clip.id) else {
                continue;
            };
            if handle.ready_state() < ReadyState::Metadata {
                continue;
            }
            if next_playing && clip.is_active_at(time) {
                if handle.is_paused() {
                    resume(&clip.id, handle);
                }
            } else if !handle.is_paused() {
                handle.pause();
            }
        }

        self.playing = next_playing;
        if next_playing {
            tracing::debug!(time, rate = self.rate, "Playback started");
            self.schedule();
        } else {
            tracing::debug!(time, "Playback paused");
            self.cancel_scheduled();
            self.draw(time, ctx);
        }
        next_playing
    }

    /// Move the playhead. Returns the clamped time.
    pub fn seek(&mut self, time: f64, ctx: PlaybackContext<'_>) -> f64 {
        if self.mode != EditorMode::Editor {
            tracing::debug!(mode = ?self.mode, "Ignoring seek outside editor");
            return self.current_time;
        }
        if !time.is_finite() {
            tracing::warn!(requested = time, "Non-finite seek target, using 0");
        }

        let project = ctx.project;
        let target = project.clamp_time(if time.is_finite() { time } else { 0.0 });
        self.set_time(target);
        self.last_tick_ms = self.clock.now_ms();

        for clip in project.clips() {
            if clip.kind != ClipKind::Video {
                continue;
            }
            let Some(handle) = ctx.media.get_mut(&clip.id) else {
                continue;
            };
            if !handle.is_seekable() {
                continue;
            }
            let clip_time = clip.local_time(target);
            if handle
                .duration()
                .is_some_and(|d| clip_time <= d + SYNC_END_SLACK_SECS)
            {
                correct_drift(&clip.id, handle, clip_time, self.config.seek_drift_secs);
            }

            let active = clip.is_active_at(target);
            if self.playing && active {
                if handle.is_paused() {
                    resume(&clip.id, handle);
                }
            } else if !handle.is_paused() {
                handle.pause();
            }
        }

        tracing::debug!(requested = time, time = target, "Seek");
        self.draw(target, ctx);
        target
    }

    /// Handle one fired frame.
    pub fn tick(&mut self, ctx: PlaybackContext<'_>) -> TickOutcome {
        self.pending_frame = None;
        if !self.playing {
            return TickOutcome::Idle;
        }
        if self.mode != EditorMode::Editor {
            self.force_pause(ctx.media);
            return TickOutcome::Idle;
        }

        let now = self.clock.now_ms();
        let mut elapsed = ms_to_secs(now - self.last_tick_ms);
        if !elapsed.is_finite() || elapsed < 0.0 {
            tracing::warn!(elapsed, "Discarding invalid tick delta");
            elapsed = 0.0;
        }
        if now.is_finite() {
            self.last_tick_ms = now;
        }

        if !self.rate.is_finite() || self.rate <= 0.0 {
            tracing::warn!(rate = self.rate, "Invalid playback rate, resetting to 1.0");
            self.rate = 1.0;
        }

        let project = ctx.project;
        let total = project.total_duration;
        if !total.is_finite() || total < 0.0 || !self.current_time.is_finite() {
            let safe = if total.is_finite() && total >= 0.0 {
                self.last_valid_time.clamp(0.0, total)
            } else {
                0.0
            };
            tracing::warn!(
                total_duration = total,
                current_time = self.current_time,
                reset_to = safe,
                "Corrupt time state, stopping playback"
            );
            self.force_pause(ctx.media);
            self.set_time(safe);
            self.last_tick_ms = self.clock.now_ms();
            self.draw(safe, ctx);
            return TickOutcome::Repaired { time: safe };
        }

        let next = (self.current_time + elapsed * self.rate).clamp(0.0, total);
        if next >= total {
            self.playing = false;
            self.set_time(total);
            ctx.media.pause_all();
            tracing::debug!(time = total, "Reached end of timeline");
            self.draw(total, ctx);
            return TickOutcome::Ended { time: total };
        }

        self.set_time(next);
        self.sync_media_for_tick(next, project, ctx.media);
        self.draw(next, ctx);
        self.schedule();
        TickOutcome::Advanced { time: next }
    }

    /// Change the clock multiplier. Rates outside the allow-list are
    /// ignored. Returns whether the rate was applied.
    pub fn set_playback_rate(
        &mut self,
        rate: f64,
        store: &mut ProjectStore,
        media: &mut MediaRegistry,
    ) -> bool {
        if !self.config.is_allowed_rate(rate) {
            tracing::warn!(rate, "Rejected playback rate");
            return false;
        }
        self.rate = rate;
        if store.apply(ProjectCommand::SetPlaybackRate { rate }).is_err() {
            return false;
        }

        if self.playing {
            let time = self.current_time;
            for clip in store.project().clips() {
                if clip.kind != ClipKind::Video || !clip.is_active_at(time) {
                    continue;
                }
                if let Some(handle) = media.get_mut(&clip.id) {
                    handle.set_playback_rate(rate);
                }
            }
        }
        tracing::debug!(rate, "Playback rate changed");
        true
    }

    /// Flip the project's mute flag and apply it to every handle. Returns the
    /// new flag.
    pub fn toggle_mute(&mut self, store: &mut ProjectStore, media: &mut MediaRegistry) -> bool {
        let muted = !store.project().muted;
        if store.apply(ProjectCommand::SetMuted { muted }).is_ok() {
            media.set_muted_all(muted);
        }
        store.project().muted
    }

    /// React to a new project value: release media of removed clips, pick up
    /// the project's rate, re-clamp the playhead, and redraw when paused.
    pub fn on_project_replaced(&mut self, ctx: PlaybackContext<'_>) {
        let project = ctx.project;
        ctx.media.retain_clips(project);
        self.rate = project.playback_rate;
        ctx.media.set_muted_all(project.muted);

        let clamped = project.clamp_time(self.current_time);
        if clamped != self.current_time {
            tracing::debug!(from = self.current_time, to = clamped, "Playhead re-clamped");
            self.set_time(clamped);
        }
        if !self.playing {
            self.draw(self.current_time, ctx);
        }
    }

    /// Stop playback and cancel any outstanding frame.
    pub fn shutdown(&mut self, media: &mut MediaRegistry) {
        self.force_pause(media);
        tracing::debug!(frames_drawn = self.frames_drawn, "Playback controller shut down");
    }

    fn sync_media_for_tick(&self, time: f64, project: &Project, media: &mut MediaRegistry) {
        for clip in project.clips() {
            if clip.kind != ClipKind::Video {
                continue;
            }
            let Some(handle) = media.get_mut(&clip.id) else {
                continue;
            };

            if !clip.is_active_at(time) {
                if !handle.is_paused() {
                    handle.pause();
                }
                continue;
            }
            if !handle.is_seekable() {
                continue;
            }

            if handle.is_paused() {
                resume(&clip.id, handle);
            }
            let clip_time = clip.local_time(time);
            if handle
                .duration()
                .is_some_and(|d| clip_time <= d + SYNC_END_SLACK_SECS)
            {
                correct_drift(&clip.id, handle, clip_time, self.config.tick_drift_secs);
            }
            if (handle.playback_rate() - self.rate).abs() > f64::EPSILON {
                handle.set_playback_rate(self.rate);
            }
        }
    }

    fn set_time(&mut self, time: f64) {
        self.current_time = time;
        if time.is_finite() {
            self.last_valid_time = time;
        }
    }

    fn force_pause(&mut self, media: &mut MediaRegistry) {
        self.playing = false;
        self.cancel_scheduled();
        media.pause_all();
    }

    fn schedule(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
    }

    fn cancel_scheduled(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    fn draw(&mut self, time: f64, ctx: PlaybackContext<'_>) {
        self.compositor
            .draw_frame(time, ctx.project, ctx.media, ctx.surface, self.playing);
        self.frames_drawn += 1;
    }
}

fn resume(clip_id: &str, handle: &mut dyn MediaHandle) {
    if let Err(e) = handle.play() {
        tracing::warn!(clip_id, error = %e, "Media refused to play");
    }
}
