//! Frame rate and simulation throughput for the viewer title.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! // after stepping each frame:
//! if clock.tick(stats.cell_updates) {
//!     println!("{:.0} fps, {:.1} Mcell/s", clock.fps(), clock.cells_per_second() / 1e6);
//! }
//! ```

use std::time::{Duration, Instant};

/// Rates are averaged over windows of this length.
const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

/// Counts displayed frames and cell updates, and turns them into rates once
/// per averaging window.
#[derive(Debug)]
pub struct FrameClock {
    window: Duration,
    window_start: Instant,
    window_frames: u64,
    window_cells: u64,
    frames: u64,
    fps: f32,
    cells_per_second: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            window_frames: 0,
            window_cells: 0,
            frames: 0,
            fps: 0.0,
            cells_per_second: 0.0,
        }
    }

    /// Record a frame that performed `cell_updates` cell updates.
    ///
    /// Returns true when the rates were refreshed.
    pub fn tick(&mut self, cell_updates: u64) -> bool {
        self.frames += 1;
        self.window_frames += 1;
        self.window_cells += cell_updates;

        let now = Instant::now();
        let span = now.duration_since(self.window_start);
        if span < self.window {
            return false;
        }

        let secs = span.as_secs_f64().max(1e-9);
        self.fps = (self.window_frames as f64 / secs) as f32;
        self.cells_per_second = self.window_cells as f64 / secs;
        self.window_start = now;
        self.window_frames = 0;
        self.window_cells = 0;
        true
    }

    /// Frames recorded since creation.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Cell updates per second over the last complete window.
    #[inline]
    pub fn cells_per_second(&self) -> f64 {
        self.cells_per_second
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
