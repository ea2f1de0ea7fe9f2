use serde::{Deserialize, Serialize};

/// Time-slider cursor advanced by wall-clock ticks.
///
/// The owner drives it from a single tick loop; the cursor steps over the
/// sampled time axis at `speed` times real time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackCursor {
    times: Vec<f64>,
    index: usize,
    playing: bool,
    speed: f64,
    elapsed_ms: f64,
}

impl PlaybackCursor {
    #[must_use]
    pub fn new(times: Vec<f64>) -> Self {
        Self {
            times,
            index: 0,
            playing: false,
            speed: 1.0,
            elapsed_ms: 0.0,
        }
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.set_speed(speed);
        self
    }

    /// Non-finite or non-positive speeds are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current_time(&self) -> Option<f64> {
        self.times.get(self.index).copied()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Starts playback; restarts from the beginning when parked on the last step.
    pub fn play(&mut self) {
        if self.times.len() < 2 {
            return;
        }
        if self.index + 1 >= self.times.len() {
            self.index = 0;
        }
        self.elapsed_ms = 0.0;
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Jumps to `index`, clamped to the axis.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.times.len().saturating_sub(1));
        self.elapsed_ms = 0.0;
    }

    /// Accounts for `elapsed_ms` of wall-clock time and returns the new index.
    ///
    /// Each step consumes `(t[i + 1] - t[i]) * 1000` milliseconds of scaled
    /// time; leftover time carries over to the next tick. Reaching the last
    /// step stops playback.
    pub fn advance(&mut self, elapsed_ms: f64) -> usize {
        if !self.playing || !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return self.index;
        }
        self.elapsed_ms += elapsed_ms * self.speed;

        while self.index + 1 < self.times.len() {
            let step_ms = (self.times[self.index + 1] - self.times[self.index]) * 1000.0;
            if self.elapsed_ms < step_ms {
                break;
            }
            self.elapsed_ms -= step_ms;
            self.index += 1;
        }

        if self.index + 1 >= self.times.len() {
            self.playing = false;
            self.elapsed_ms = 0.0;
        }
        self.index
    }
}
