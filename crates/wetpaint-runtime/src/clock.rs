//! Frame clock with FPS measurement

use std::time::{Duration, Instant};

/// Tracks frame timing and counts frames over one-second windows
pub struct FrameClock {
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Frames per second measured over the last completed window
    pub fps: f64,
    /// Length of the FPS measurement window
    pub window: Duration,
    frames_in_window: u32,
    window_start: Instant,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            delta_time: 0.0,
            fps: 0.0,
            window: Duration::from_secs(1),
            frames_in_window: 0,
            window_start: now,
            last_instant: now,
            first_tick: true,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock. Call once per frame.
    ///
    /// Returns true when an FPS window just completed and `fps` was updated.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.window_start = now;
            self.delta_time = 0.0;
            return false;
        }

        self.delta_time = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.frames_in_window += 1;

        let elapsed = now.duration_since(self.window_start);
        if elapsed < self.window {
            return false;
        }
        self.fps = self.frames_in_window as f64 / elapsed.as_secs_f64();
        self.frames_in_window = 0;
        self.window_start = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        assert!(!clock.tick());
        assert_eq!(clock.delta_time, 0.0);
    }

    #[test]
    fn test_fps_window() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);

        let frame = Duration::from_millis(20);
        let mut reported = false;
        for i in 1..=50 {
            reported = clock.tick_at(start + frame * i);
            if reported {
                break;
            }
        }
        assert!(reported);
        assert!((clock.fps - 50.0).abs() < 1e-6);
        assert!((clock.delta_time - 0.02).abs() < 1e-9);
    }
}
