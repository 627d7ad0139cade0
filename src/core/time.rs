//! Frame timing utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// FPS statistics for a time window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsWindow {
    pub avg: f32,
    pub min: f32,
    pub max: f32,
}

/// Drives the simulation clock: one `tick` per rendered frame.
///
/// The clock only measures time. Consumers receive `elapsed()` and
/// `delta_secs()` as plain values so the simulation can run without it.
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed: Duration,
    delta: Duration,
    frame_count: u64,
    fps_timer: Instant,
    fps: f32,
    fps_frame_count: u32,
    /// Ring buffer of (timestamp, frame_time_secs) for rolling stats
    frame_history: VecDeque<(Instant, f32)>,
    /// Deltas above this are clamped (window drags, debugger pauses)
    max_delta: Duration,
}

impl FrameClock {
    /// Create a new clock starting now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            frame_count: 0,
            fps_timer: now,
            fps: 0.0,
            fps_frame_count: 0,
            frame_history: VecDeque::new(),
            max_delta: Duration::from_millis(250),
        }
    }

    /// Call once per frame to update timing
    pub fn tick(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.record(now, delta);
    }

    /// Advance by a fixed delta instead of wall-clock time
    pub fn tick_fixed(&mut self, delta: Duration) {
        let now = self.last_frame + delta;
        self.last_frame = now;
        self.record(now, delta);
    }

    fn record(&mut self, now: Instant, delta: Duration) {
        self.delta = delta.min(self.max_delta);
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.fps_frame_count += 1;

        self.frame_history.push_back((now, delta.as_secs_f32()));

        // Prune frames older than 5 seconds
        let cutoff = now.checked_sub(Duration::from_secs(5)).unwrap_or(self.start);
        while let Some(&(timestamp, _)) = self.frame_history.front() {
            if timestamp < cutoff {
                self.frame_history.pop_front();
            } else {
                break;
            }
        }

        // Update FPS every second
        let fps_elapsed = now.saturating_duration_since(self.fps_timer);
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_timer = now;
        }
    }

    /// Accumulated simulation time in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get delta time in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get current FPS (updated every second)
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Get total frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// FPS statistics over the recorded history (up to 5 seconds)
    pub fn fps_window(&self) -> FpsWindow {
        let mut frame_count = 0;
        let mut total_time = 0.0f32;
        let mut min_fps = f32::INFINITY;
        let mut max_fps = 0.0f32;

        for &(_, frame_time) in self.frame_history.iter() {
            frame_count += 1;
            total_time += frame_time;
            let fps = if frame_time > 0.0 { 1.0 / frame_time } else { 0.0 };
            min_fps = min_fps.min(fps);
            max_fps = max_fps.max(fps);
        }

        if frame_count == 0 {
            return FpsWindow { avg: 0.0, min: 0.0, max: 0.0 };
        }

        FpsWindow {
            avg: if total_time > 0.0 { frame_count as f32 / total_time } else { 0.0 },
            min: min_fps,
            max: max_fps,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_ticks_accumulate() {
        let mut clock = FrameClock::new();
        for _ in 0..60 {
            clock.tick_fixed(Duration::from_micros(16_667));
        }
        assert_eq!(clock.frame_count(), 60);
        assert!((clock.elapsed() - 1.0).abs() < 1e-3);
        assert!((clock.delta_secs() - 0.016667).abs() < 1e-5);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut clock = FrameClock::new();
        clock.tick_fixed(Duration::from_secs(3));
        assert!((clock.delta_secs() - 0.25).abs() < 1e-6);
        assert!((clock.elapsed() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_fps_window() {
        let mut clock = FrameClock::new();
        for _ in 0..10 {
            clock.tick_fixed(Duration::from_millis(20));
        }
        let stats = clock.fps_window();
        assert!((stats.avg - 50.0).abs() < 0.5);
        assert!((stats.min - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_empty_window() {
        let clock = FrameClock::new();
        assert_eq!(clock.fps_window(), FpsWindow { avg: 0.0, min: 0.0, max: 0.0 });
    }
}
