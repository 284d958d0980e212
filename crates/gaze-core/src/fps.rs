use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::cache::GazeListener;
use crate::constants::DEFAULT_FRAME_TIME_SAMPLES;
use crate::queue::{FixedSizedQueue, FrameRateGazeDataQueue};
use crate::sample::GazeSample;

/// Tracker frame rate measured from the timestamps of delivered frames.
///
/// Shared between the tracker thread, which feeds it through
/// [`GazeListener`], and whoever displays the figure.
#[derive(Debug, Default)]
pub struct GazeFps {
    frames: Mutex<FrameRateGazeDataQueue>,
}

impl GazeFps {
    pub fn new(time_limit_ms: i64) -> Self {
        Self {
            frames: Mutex::new(FrameRateGazeDataQueue::new(time_limit_ms)),
        }
    }

    pub fn record(&self, sample: GazeSample) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enqueue(sample);
    }

    /// `None` until enough history is buffered.
    pub fn avg_fps(&self) -> Option<f32> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .avg_frames_per_second()
    }
}

impl GazeListener for GazeFps {
    fn on_gaze_update(&self, sample: GazeSample) {
        self.record(sample);
    }
}

/// Consumer-side frame rate averaged over the last N frame durations.
#[derive(Clone, Debug)]
pub struct FrameTimeMeter {
    frame_times: FixedSizedQueue<f32>,
}

impl Default for FrameTimeMeter {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_TIME_SAMPLES)
    }
}

impl FrameTimeMeter {
    pub fn new(sample_frames: usize) -> Self {
        Self {
            frame_times: FixedSizedQueue::new(sample_frames.max(1)),
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.frame_times.push(dt.as_secs_f32());
    }

    /// Frames per second once the buffer is (nearly) full.
    pub fn avg_fps(&self) -> Option<f32> {
        let needed = self.frame_times.capacity().saturating_sub(1).max(1);
        if self.frame_times.len() < needed {
            return None;
        }
        let total: f32 = self.frame_times.iter().sum();
        let mean = total / self.frame_times.len() as f32;
        (mean > 0.0).then(|| 1.0 / mean)
    }
}
