use std::collections::vec_deque;
use std::collections::VecDeque;

use crate::constants::DEFAULT_FPS_WINDOW_MS;
use crate::sample::GazeSample;

/// Samples ordered by arrival, bounded by elapsed time rather than count.
///
/// Each enqueue evicts entries more than `time_limit_ms` older than the
/// incoming sample. With non-decreasing timestamps the queue therefore never
/// spans more than the limit.
#[derive(Clone, Debug)]
pub struct GazeDataQueue {
    frames: VecDeque<GazeSample>,
    time_limit_ms: i64,
}

impl GazeDataQueue {
    pub fn new(time_limit_ms: i64) -> Self {
        Self {
            frames: VecDeque::new(),
            time_limit_ms,
        }
    }

    pub fn time_limit_ms(&self) -> i64 {
        self.time_limit_ms
    }

    /// Takes effect on the next enqueue.
    pub fn set_time_limit_ms(&mut self, time_limit_ms: i64) {
        self.time_limit_ms = time_limit_ms;
    }

    pub fn enqueue(&mut self, sample: GazeSample) {
        while let Some(oldest) = self.frames.front() {
            if sample.timestamp_ms.saturating_sub(oldest.timestamp_ms) > self.time_limit_ms {
                self.frames.pop_front();
            } else {
                break;
            }
        }
        self.frames.push_back(sample);
    }

    pub fn contains(&self, sample: &GazeSample) -> bool {
        self.frames.contains(sample)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn oldest(&self) -> Option<&GazeSample> {
        self.frames.front()
    }

    pub fn newest(&self) -> Option<&GazeSample> {
        self.frames.back()
    }

    /// Oldest to newest; `.rev()` walks newest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, GazeSample> {
        self.frames.iter()
    }

    /// Time between the oldest and newest buffered sample.
    pub fn span_ms(&self) -> i64 {
        match (self.frames.front(), self.frames.back()) {
            (Some(first), Some(last)) => last.timestamp_ms.saturating_sub(first.timestamp_ms),
            _ => 0,
        }
    }
}

impl<'a> IntoIterator for &'a GazeDataQueue {
    type Item = &'a GazeSample;
    type IntoIter = vec_deque::Iter<'a, GazeSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Time-windowed queue that also reports the tracker frame rate.
#[derive(Clone, Debug)]
pub struct FrameRateGazeDataQueue {
    frames: GazeDataQueue,
}

impl Default for FrameRateGazeDataQueue {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW_MS)
    }
}

impl FrameRateGazeDataQueue {
    pub fn new(time_limit_ms: i64) -> Self {
        Self {
            frames: GazeDataQueue::new(time_limit_ms),
        }
    }

    pub fn enqueue(&mut self, sample: GazeSample) {
        self.frames.enqueue(sample);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn frames(&self) -> &GazeDataQueue {
        &self.frames
    }

    /// Mean time between consecutive samples.
    ///
    /// Returns `None` until the buffer spans more than half of its time
    /// limit, so that start-up bursts do not skew the figure.
    pub fn avg_millis_per_frame(&self) -> Option<f32> {
        let span = self.frames.span_ms();
        if span <= self.frames.time_limit_ms() >> 1 {
            return None;
        }
        let intervals = self.frames.len().saturating_sub(1);
        if intervals == 0 {
            return None;
        }
        Some(span as f32 / intervals as f32)
    }

    pub fn avg_frames_per_second(&self) -> Option<f32> {
        self.avg_millis_per_frame()
            .filter(|ms| *ms > 0.0)
            .map(|ms| 1000.0 / ms)
    }
}

/// FIFO holding at most `capacity` entries; pushing past it drops the oldest.
#[derive(Clone, Debug)]
pub struct FixedSizedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> FixedSizedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }
}
