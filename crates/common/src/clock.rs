//! Clock and timing utilities for playback synchronization.
//!
//! The playback controller never reads wall time directly. It asks a
//! [`Clock`] for a millisecond timestamp and derives tick deltas from it,
//! which keeps the logical clock testable and lets headless drivers run
//! faster or slower than real time.

use std::cell::Cell;
use std::time::Instant;

/// A monotonic millisecond time source.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> f64;
}

/// Real monotonic clock anchored at construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    /// The instant the clock was created.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SystemClock {
    /// Create a clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Seconds elapsed since the epoch.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for tests and deterministic headless playback.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    /// Move time forward (or backward, for negative values).
    pub fn advance_ms(&self, ms: f64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set_ms(&self, ms: f64) {
        self.now_ms.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Drift between the logical playhead and a media element's own position,
/// both expressed in clip-local seconds.
#[derive(Debug, Clone, Copy)]
pub struct DriftMeasurement {
    /// Where the logical clock says the media should be.
    pub expected_secs: f64,
    /// Where the media element reports it is.
    pub actual_secs: f64,
}

impl DriftMeasurement {
    pub fn new(expected_secs: f64, actual_secs: f64) -> Self {
        Self {
            expected_secs,
            actual_secs,
        }
    }

    /// Drift in seconds (positive = media is ahead).
    pub fn drift_secs(&self) -> f64 {
        self.actual_secs - self.expected_secs
    }

    /// Drift in milliseconds.
    pub fn drift_ms(&self) -> f64 {
        self.drift_secs() * 1000.0
    }

    /// Whether drift exceeds the tolerance. Non-finite readings always do.
    pub fn exceeds(&self, tolerance_secs: f64) -> bool {
        let drift = self.drift_secs();
        !drift.is_finite() || drift.abs() > tolerance_secs
    }
}

/// Convert milliseconds to seconds.
pub fn ms_to_secs(ms: f64) -> f64 {
    ms / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_elapsed() {
        let clock = SystemClock::start();
        // Should be very small but non-negative
        let now = clock.now_ms();
        assert!((0.0..1000.0).contains(&now));
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000.0);
        clock.advance_ms(16.5);
        assert!((clock.now_ms() - 1_016.5).abs() < 1e-9);
        clock.set_ms(0.0);
        assert_eq!(clock.now_ms(), 0.0);
    }

    #[test]
    fn test_shared_clock_handles() {
        let manual = std::rc::Rc::new(ManualClock::new(0.0));
        let shared: std::rc::Rc<dyn Clock> = manual.clone();
        manual.advance_ms(40.0);
        assert_eq!(shared.now_ms(), 40.0);

        let wall: std::rc::Rc<dyn Clock> = std::rc::Rc::new(SystemClock::start());
        let first = wall.now_ms();
        assert!(wall.now_ms() >= first);
    }

    #[test]
    fn test_drift_measurement() {
        let drift = DriftMeasurement::new(2.0, 2.12);
        assert!((drift.drift_ms() - 120.0).abs() < 1e-6);
        assert!(drift.exceeds(0.1));
        assert!(!drift.exceeds(0.15));
    }

    #[test]
    fn test_non_finite_drift_exceeds() {
        assert!(DriftMeasurement::new(1.0, f64::NAN).exceeds(10.0));
    }
}
