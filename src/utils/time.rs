use std::time::{Duration, Instant};

/// Frame clock for the render loop.
///
/// Hosts with a real frame callback measure frames with [`Timer::lap`]; headless drivers and
/// tests step it deterministically with [`Timer::advance`].
#[derive(Debug, Clone)]
pub struct Timer {
    last_update: Instant,
    /// Time since the previous frame
    pub delta: Duration,
    /// Accumulated frame time
    pub elapsed: Duration,
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Wall-clock time since the previous lap. Does not record a frame.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_update;
        self.last_update = now;
        delta
    }

    /// Records a frame of the given length. Returns it in seconds.
    pub fn advance(&mut self, delta: Duration) -> f32 {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        delta.as_secs_f32()
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}
