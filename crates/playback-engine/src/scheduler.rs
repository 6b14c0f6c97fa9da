//! Per-frame callback scheduling.
//!
//! The controller requests one frame at a time and keeps the returned
//! [`FrameHandle`] so it can cancel the request when playback stops.

/// Identifies one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of "call me on the next frame" requests.
pub trait FrameScheduler {
    /// Request a single callback for the next frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a request that has not fired yet.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by hand: requests queue up until [`fire`](Self::fire)
/// takes them.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest outstanding request, as if its frame arrived.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    /// Outstanding requests.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Total requests ever made.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Requests cancelled before firing.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        self.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|h| *h != handle);
        if self.pending.len() < before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_in_request_order() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        assert_ne!(a, b);
        assert_eq!(scheduler.fire(), Some(a));
        assert_eq!(scheduler.fire(), Some(b));
        assert_eq!(scheduler.fire(), None);
    }

    #[test]
    fn test_cancel_only_counts_outstanding() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_frame();
        scheduler.cancel_frame(a);
        scheduler.cancel_frame(a);
        assert_eq!(scheduler.cancelled(), 1);
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.requested(), 1);
    }
}
