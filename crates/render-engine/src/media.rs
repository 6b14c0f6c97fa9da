//! Live media handles and the registry that owns them.
//!
//! A handle is the engine's view of a playable or drawable resource supplied
//! by the host (a decoder, a video element, a loaded image). Handles never
//! live inside the `Project`; the [`MediaRegistry`] owns them, keyed by clip
//! id, and releases them when their clip leaves the project.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use clipweave_common::clock::DriftMeasurement;
use clipweave_project_model::{IntrinsicSize, Project};

/// How much of a resource is available, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    Nothing,
    Metadata,
    CurrentData,
    FutureData,
    EnoughData,
}

/// What a handle plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Image,
}

/// Failures reported by a media handle.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Playback rejected: {reason}")]
    PlayRejected { reason: String },

    #[error("Seek to {target:.3}s failed: {reason}")]
    SeekFailed { target: f64, reason: String },

    #[error("Media handle has been released")]
    Released,
}

impl From<MediaError> for clipweave_common::ClipweaveError {
    fn from(err: MediaError) -> Self {
        Self::media(err.to_string())
    }
}

/// Narrow interface over a host media resource.
pub trait MediaHandle {
    fn kind(&self) -> MediaKind;

    fn ready_state(&self) -> ReadyState;

    /// Position in the media, in seconds.
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, secs: f64) -> Result<(), MediaError>;

    /// Media length, once known.
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Pixel size of the source, once known.
    fn natural_size(&self) -> Option<IntrinsicSize>;

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&mut self, rate: f64);

    fn set_muted(&mut self, muted: bool);

    /// Whether seeking is currently possible.
    fn is_seekable(&self) -> bool;

    /// Stop and free the underlying resource.
    fn release(&mut self);

    /// A frame can be drawn.
    fn has_frame(&self) -> bool {
        self.ready_state() >= ReadyState::CurrentData
    }
}

/// Seek `handle` to `expected` only when it has drifted past `tolerance`.
/// Returns whether a correction was issued.
pub fn correct_drift(
    clip_id: &str,
    handle: &mut dyn MediaHandle,
    expected: f64,
    tolerance: f64,
) -> bool {
    let drift = DriftMeasurement::new(expected, handle.current_time());
    if !drift.exceeds(tolerance) {
        return false;
    }
    match handle.set_current_time(expected) {
        Ok(()) => {
            tracing::trace!(
                clip_id,
                drift_ms = drift.drift_ms(),
                target = expected,
                "Corrected media drift"
            );
            true
        }
        Err(e) => {
            tracing::debug!(clip_id, error = %e, "Drift correction failed");
            false
        }
    }
}

/// Media handles keyed by clip id.
#[derive(Default)]
pub struct MediaRegistry {
    handles: HashMap<String, Box<dyn MediaHandle>>,
}

impl std::fmt::Debug for MediaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRegistry")
            .field("clips", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle for a clip, releasing any previous one.
    pub fn insert(&mut self, clip_id: impl Into<String>, handle: Box<dyn MediaHandle>) {
        let clip_id = clip_id.into();
        if let Some(mut previous) = self.handles.insert(clip_id.clone(), handle) {
            tracing::debug!(clip_id = %clip_id, "Replacing media handle");
            previous.pause();
            previous.release();
        }
    }

    pub fn get(&self, clip_id: &str) -> Option<&dyn MediaHandle> {
        self.handles.get(clip_id).map(|h| h.as_ref())
    }

    pub fn get_mut(&mut self, clip_id: &str) -> Option<&mut dyn MediaHandle> {
        match self.handles.get_mut(clip_id) {
            Some(h) => Some(h.as_mut()),
            None => None,
        }
    }

    pub fn contains(&self, clip_id: &str) -> bool {
        self.handles.contains_key(clip_id)
    }

    /// Stop, release, and drop a clip's handle.
    pub fn remove(&mut self, clip_id: &str) -> bool {
        match self.handles.remove(clip_id) {
            Some(mut handle) => {
                handle.pause();
                handle.release();
                true
            }
            None => false,
        }
    }

    /// Release handles whose clip is no longer in `project`. Returns the
    /// released clip ids.
    pub fn retain_clips(&mut self, project: &Project) -> Vec<String> {
        let stale: Vec<String> = self
            .handles
            .keys()
            .filter(|id| project.find_clip(id).is_none())
            .cloned()
            .collect();
        for id in &stale {
            self.remove(id);
        }
        if !stale.is_empty() {
            tracing::debug!(released = stale.len(), "Released media for removed clips");
        }
        stale
    }

    /// Pause every handle.
    pub fn pause_all(&mut self) {
        for handle in self.handles.values_mut() {
            if !handle.is_paused() {
                handle.pause();
            }
        }
    }

    /// Apply a mute flag to every handle.
    pub fn set_muted_all(&mut self, muted: bool) {
        for handle in self.handles.values_mut() {
            handle.set_muted(muted);
        }
    }

    pub fn clip_ids(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for MediaRegistry {
    fn drop(&mut self) {
        for handle in self.handles.values_mut() {
            handle.release();
        }
    }
}

#[derive(Debug)]
struct SimulatedState {
    kind: MediaKind,
    ready_state: ReadyState,
    current_time: f64,
    duration: Option<f64>,
    paused: bool,
    rate: f64,
    muted: bool,
    natural_size: Option<IntrinsicSize>,
    autoplay_blocked: bool,
    released: bool,
    seeks: usize,
}

/// Headless media handle that advances only when told to.
///
/// Clones share state, so a test or driver can keep one clone while the
/// registry owns another.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedMedia {
    /// A loaded, paused video at position 0.
    pub fn video(duration: f64, natural_size: Option<IntrinsicSize>) -> Self {
        Self::with_state(SimulatedState {
            kind: MediaKind::Video,
            ready_state: ReadyState::EnoughData,
            current_time: 0.0,
            duration: Some(duration),
            paused: true,
            rate: 1.0,
            muted: false,
            natural_size,
            autoplay_blocked: false,
            released: false,
            seeks: 0,
        })
    }

    /// A loaded image.
    pub fn image(natural_size: IntrinsicSize) -> Self {
        Self::with_state(SimulatedState {
            kind: MediaKind::Image,
            ready_state: ReadyState::EnoughData,
            current_time: 0.0,
            duration: None,
            paused: true,
            rate: 1.0,
            muted: false,
            natural_size: Some(natural_size),
            autoplay_blocked: false,
            released: false,
            seeks: 0,
        })
    }

    fn with_state(state: SimulatedState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.borrow_mut().ready_state = ready_state;
    }

    /// Make `play` fail, as a host would without a user gesture.
    pub fn block_autoplay(&self, blocked: bool) {
        self.state.borrow_mut().autoplay_blocked = blocked;
    }

    /// Move the position forward by `elapsed_secs` of wall time if playing.
    /// Stops at the end of the media.
    pub fn advance(&self, elapsed_secs: f64) {
        let mut state = self.state.borrow_mut();
        if state.paused || state.released || state.kind != MediaKind::Video {
            return;
        }
        let mut next = state.current_time + elapsed_secs * state.rate;
        if let Some(duration) = state.duration {
            if next >= duration {
                next = duration;
                state.paused = true;
            }
        }
        state.current_time = next;
    }

    /// Force the reported position, bypassing seek accounting.
    pub fn drift_to(&self, secs: f64) {
        self.state.borrow_mut().current_time = secs;
    }

    /// Number of seeks issued through [`MediaHandle::set_current_time`].
    pub fn seek_count(&self) -> usize {
        self.state.borrow().seeks
    }

    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }

    pub fn is_muted(&self) -> bool {
        self.state.borrow().muted
    }

    /// Boxed clone for a [`MediaRegistry`].
    pub fn boxed(&self) -> Box<dyn MediaHandle> {
        Box::new(self.clone())
    }
}

impl MediaHandle for SimulatedMedia {
    fn kind(&self) -> MediaKind {
        self.state.borrow().kind
    }

    fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn set_current_time(&mut self, secs: f64) -> Result<(), MediaError> {
        let mut state = self.state.borrow_mut();
        if state.released {
            return Err(MediaError::Released);
        }
        if !secs.is_finite() {
            return Err(MediaError::SeekFailed {
                target: secs,
                reason: "non-finite target".to_string(),
            });
        }
        let upper = state.duration.unwrap_or(f64::INFINITY);
        state.current_time = secs.clamp(0.0, upper);
        state.seeks += 1;
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let mut state = self.state.borrow_mut();
        if state.released {
            return Err(MediaError::Released);
        }
        if state.autoplay_blocked {
            return Err(MediaError::PlayRejected {
                reason: "autoplay blocked".to_string(),
            });
        }
        if state.kind == MediaKind::Video {
            state.paused = false;
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().paused = true;
    }

    fn natural_size(&self) -> Option<IntrinsicSize> {
        self.state.borrow().natural_size
    }

    fn playback_rate(&self) -> f64 {
        self.state.borrow().rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.state.borrow_mut().rate = rate;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn is_seekable(&self) -> bool {
        let state = self.state.borrow();
        !state.released && state.ready_state >= ReadyState::Metadata
    }

    fn release(&mut self) {
        let mut state = self.state.borrow_mut();
        state.paused = true;
        state.released = true;
        state.ready_state = ReadyState::Nothing;
    }
}
