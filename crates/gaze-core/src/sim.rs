//! Seeded tracker stream generator for development without hardware.

use glam::{UVec2, Vec2};
use rand::prelude::*;

use crate::constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use crate::sample::{Eye, GazeSample, TrackingState};

/// Knobs for [`TrackerSimulator`]. Probabilities are per frame.
#[derive(Clone, Debug)]
pub struct SimulatorParams {
    pub rate_hz: f32,
    pub screen: UVec2,
    pub eye_distance: f32,
    pub tracking_loss: f32,
    pub eye_dropout: f32,
    pub gaze_dropout: f32,
    pub saccade: f32,
    pub smoothing: f32,
}

impl Default for SimulatorParams {
    fn default() -> Self {
        Self {
            rate_hz: 30.0,
            screen: UVec2::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT),
            eye_distance: 0.25,
            tracking_loss: 0.03,
            eye_dropout: 0.08,
            gaze_dropout: 0.05,
            saccade: 0.1,
            smoothing: 0.3,
        }
    }
}

/// Random-walk head with saccading gaze, including the dropouts real
/// trackers produce. Same seed, same stream.
pub struct TrackerSimulator {
    params: SimulatorParams,
    rng: StdRng,
    head: Vec2,
    fixation: Vec2,
    smoothed: Vec2,
    timestamp_ms: i64,
    interval_ms: i64,
}

impl TrackerSimulator {
    pub fn new(params: SimulatorParams, seed: u64, start_ms: i64) -> Self {
        let interval_ms = (1000.0 / params.rate_hz.max(1.0)).round().max(1.0) as i64;
        let center = params.screen.as_vec2() * 0.5;
        Self {
            params,
            rng: StdRng::seed_from_u64(seed),
            head: Vec2::splat(0.5),
            fixation: center,
            smoothed: center,
            timestamp_ms: start_ms,
            interval_ms,
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    pub fn next_sample(&mut self) -> GazeSample {
        let timestamp_ms = self.timestamp_ms;
        self.timestamp_ms += self.interval_ms;

        let step = Vec2::new(self.rng.gen_range(-0.01..=0.01), self.rng.gen_range(-0.01..=0.01));
        self.head = (self.head + step).clamp(Vec2::splat(0.2), Vec2::splat(0.8));

        if self.rng.gen::<f32>() < self.params.tracking_loss {
            let state = if self.rng.gen_bool(0.5) {
                TrackingState::LOST
            } else {
                TrackingState::FAIL
            };
            return GazeSample::new(timestamp_ms, state);
        }

        let screen = self.params.screen.as_vec2();
        if self.rng.gen::<f32>() < self.params.saccade {
            self.fixation = Vec2::new(
                self.rng.gen_range(0.0..screen.x),
                self.rng.gen_range(0.0..screen.y),
            );
        }
        let jitter = Vec2::new(self.rng.gen_range(-4.0..=4.0), self.rng.gen_range(-4.0..=4.0));
        let raw = (self.fixation + jitter).clamp(Vec2::ONE, screen);
        self.smoothed = self.smoothed.lerp(raw, self.params.smoothing);

        let half = Vec2::new(self.params.eye_distance * 0.5, 0.0);
        let mut left = self.eye(self.head - half, raw);
        let mut right = self.eye(self.head + half, raw);

        if self.rng.gen::<f32>() < self.params.eye_dropout {
            if self.rng.gen_bool(0.5) {
                left = Eye::default();
            } else {
                right = Eye::default();
            }
        }

        let mut sample = GazeSample::new(timestamp_ms, TrackingState::TRACKING);
        sample.left = left;
        sample.right = right;
        if self.rng.gen::<f32>() < self.params.gaze_dropout {
            sample.state = TrackingState::PRESENCE | TrackingState::EYES;
        } else {
            sample.raw = raw;
            sample.smoothed = self.smoothed;
            sample.is_fixated = jitter.length() < 3.0;
        }
        sample
    }

    fn eye(&mut self, pupil: Vec2, gaze: Vec2) -> Eye {
        Eye {
            raw: gaze,
            smoothed: gaze,
            pupil_center: pupil,
            pupil_size: self.rng.gen_range(3.0..5.0),
        }
    }
}

impl Iterator for TrackerSimulator {
    type Item = GazeSample;

    fn next(&mut self) -> Option<GazeSample> {
        Some(self.next_sample())
    }
}
