use std::time::{Duration, Instant};

/// Fixed-step animation clock.
///
/// Advances by exactly `1 / rate` per displayed frame regardless of how long
/// the frame actually took, so the animation is deterministic under load:
/// a slow machine plays the same animation slower rather than skipping
/// ahead. Reset only at process start, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    seconds: f32,
    step: f32,
}

impl FrameClock {
    /// Creates a clock at zero that steps by `1 / target_fps`.
    pub fn new(target_fps: f32) -> Self {
        Self {
            seconds: 0.0,
            step: 1.0 / target_fps,
        }
    }

    /// Elapsed animation time fed to the generator kernel.
    pub fn seconds(&self) -> f32 {
        self.seconds
    }

    /// Advances by one frame step. Called once per displayed frame.
    pub fn advance(&mut self) {
        self.seconds += self.step;
    }
}

/// Frame pacing at a fixed target rate.
///
/// Equivalent to sleeping `max(0, 1/rate − elapsed_this_frame)` after each
/// frame, expressed as a deadline for the event loop's `WaitUntil` control
/// flow so the host never busy-waits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FramePacer {
    interval: Duration,
    frame_start: Option<Instant>,
    next_deadline: Option<Instant>,
}

impl FramePacer {
    pub(crate) fn new(target_fps: f32) -> Self {
        Self {
            interval: Duration::from_secs_f32(1.0 / target_fps),
            frame_start: None,
            next_deadline: None,
        }
    }

    /// True when the next frame may start; stamps the frame start time so
    /// the following deadline accounts for time spent rendering.
    pub(crate) fn ready_for_frame(&mut self, now: Instant) -> bool {
        if self.next_deadline.is_none_or(|deadline| now >= deadline) {
            self.frame_start = Some(now);
            true
        } else {
            false
        }
    }

    /// Records a presented frame and schedules the next deadline one
    /// interval after the frame started.
    pub(crate) fn mark_rendered(&mut self, now: Instant) {
        let start = self.frame_start.take().unwrap_or(now);
        self.next_deadline = Some(start + self.interval);
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reaches_one_second_after_rate_frames() {
        let mut clock = FrameClock::new(60.0);
        for _ in 0..60 {
            clock.advance();
        }
        assert!((clock.seconds() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = FrameClock::new(30.0);
        let mut previous = clock.seconds();
        for _ in 0..100 {
            clock.advance();
            assert!(clock.seconds() > previous);
            previous = clock.seconds();
        }
    }

    #[test]
    fn pacer_defers_frames_until_the_deadline() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(50.0); // 20ms interval
        assert!(pacer.ready_for_frame(start));
        pacer.mark_rendered(start + Duration::from_millis(5));

        // Mid-interval polls stay parked on the deadline.
        assert!(!pacer.ready_for_frame(start + Duration::from_millis(10)));
        assert_eq!(pacer.next_deadline(), Some(start + Duration::from_millis(20)));

        assert!(pacer.ready_for_frame(start + Duration::from_millis(20)));
    }

    #[test]
    fn pacer_deadline_counts_from_frame_start_not_completion() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(50.0);
        assert!(pacer.ready_for_frame(start));
        // A frame that takes 15ms still leaves only 5ms of sleep.
        pacer.mark_rendered(start + Duration::from_millis(15));
        assert_eq!(pacer.next_deadline(), Some(start + Duration::from_millis(20)));
    }

    #[test]
    fn pacer_never_blocks_when_behind_schedule() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(50.0);
        assert!(pacer.ready_for_frame(start));
        pacer.mark_rendered(start + Duration::from_millis(45));
        // Deadline already passed; the next frame starts immediately.
        assert!(pacer.ready_for_frame(start + Duration::from_millis(45)));
    }
}
