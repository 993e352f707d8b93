use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts processed frames and reports the count once per interval
pub struct FrameRateCounter {
    frames: u32,
    last_report: Instant,
}

impl FrameRateCounter {
    pub fn new(now: Instant) -> Self {
        FrameRateCounter {
            frames: 0,
            last_report: now,
        }
    }

    /// Record one finished frame; returns the frames counted in the interval
    /// when it has elapsed, including this one.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.duration_since(self.last_report) >= REPORT_INTERVAL {
            let frames = self.frames;
            self.frames = 0;
            self.last_report = now;
            Some(frames)
        } else {
            None
        }
    }
}
