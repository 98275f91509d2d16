//! Wall-clock playback position bookkeeping
//!
//! The decoder gives no position feedback, so elapsed seconds are estimated
//! from timestamps: a base position anchored at a start instant, minus
//! accumulated pause time. Every mutator takes the current instant
//! explicitly so tests can drive a synthetic clock; `*_now` wrappers exist
//! for production callers.
//!
//! Re-anchoring on start and seek (rather than back-dating the start
//! instant) keeps all stored instants in the past-to-present range, so a
//! large resume position can never underflow `Instant` on a freshly booted
//! machine.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PositionTracker {
    base_position: f64,
    started_at: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl PositionTracker {
    /// Anchors a new tracker at `position` seconds
    pub fn start_at(now: Instant, position: f64) -> Self {
        Self {
            base_position: position.max(0.0),
            started_at: now,
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn start(position: f64) -> Self {
        Self::start_at(Instant::now(), position)
    }

    /// Freezes the position estimate; a second call is a no-op
    pub fn pause_at(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Unfreezes, folding the paused interval into the accumulated total
    pub fn resume_at(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Re-anchors at an absolute position, preserving the paused flag
    pub fn seek_at(&mut self, now: Instant, position: f64) {
        self.base_position = position.max(0.0);
        self.started_at = now;
        self.paused_total = Duration::ZERO;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }

    /// Estimated position in seconds at `now`
    pub fn position_at(&self, now: Instant) -> f64 {
        let effective_now = self.paused_at.unwrap_or(now);
        let elapsed = effective_now
            .saturating_duration_since(self.started_at)
            .saturating_sub(self.paused_total);
        self.base_position + elapsed.as_secs_f64()
    }

    pub fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> impl Fn(u64) -> Instant {
        let origin = Instant::now();
        move |secs| origin + Duration::from_secs(secs)
    }

    #[test]
    fn test_position_advances_while_playing() {
        let at = clock();
        let tracker = PositionTracker::start_at(at(0), 10.0);
        assert_eq!(tracker.position_at(at(0)), 10.0);
        assert_eq!(tracker.position_at(at(5)), 15.0);
        assert_eq!(tracker.position_at(at(60)), 70.0);
    }

    #[test]
    fn test_pause_freezes_position() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 0.0);
        tracker.pause_at(at(10));
        assert_eq!(tracker.position_at(at(10)), 10.0);
        assert_eq!(tracker.position_at(at(500)), 10.0);
    }

    #[test]
    fn test_resume_continues_from_pause_value() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 0.0);
        tracker.pause_at(at(10));
        tracker.resume_at(at(70));
        assert_eq!(tracker.position_at(at(70)), 10.0);
        assert_eq!(tracker.position_at(at(75)), 15.0);
    }

    #[test]
    fn test_double_pause_does_not_double_count() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 0.0);
        tracker.pause_at(at(10));
        tracker.pause_at(at(40));
        tracker.resume_at(at(70));
        // The pause interval is 10..70, not 40..70.
        assert_eq!(tracker.position_at(at(70)), 10.0);
    }

    #[test]
    fn test_double_resume_is_noop() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 0.0);
        tracker.pause_at(at(10));
        tracker.resume_at(at(20));
        tracker.resume_at(at(30));
        assert_eq!(tracker.position_at(at(30)), 20.0);
    }

    #[test]
    fn test_position_monotonic_across_pause_cycles() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 5.0);
        let mut previous = tracker.position_at(at(0));

        tracker.pause_at(at(3));
        tracker.resume_at(at(8));
        tracker.pause_at(at(12));
        tracker.resume_at(at(20));

        for t in 0..30 {
            let position = tracker.position_at(at(t));
            assert!(position >= previous, "position regressed at t={}", t);
            previous = position;
        }
    }

    #[test]
    fn test_seek_clamps_negative_to_zero() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 30.0);
        tracker.seek_at(at(5), -25.0);
        assert_eq!(tracker.position_at(at(5)), 0.0);
    }

    #[test]
    fn test_seek_while_paused_stays_paused() {
        let at = clock();
        let mut tracker = PositionTracker::start_at(at(0), 0.0);
        tracker.pause_at(at(10));
        tracker.seek_at(at(15), 100.0);
        assert!(tracker.is_paused());
        assert_eq!(tracker.position_at(at(50)), 100.0);
        tracker.resume_at(at(60));
        assert_eq!(tracker.position_at(at(65)), 105.0);
    }

    #[test]
    fn test_start_clamps_negative_position() {
        let at = clock();
        let tracker = PositionTracker::start_at(at(0), -4.0);
        assert_eq!(tracker.position_at(at(0)), 0.0);
    }
}
