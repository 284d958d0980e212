//! Run-time cache of recent tracker frames.
//!
//! Trackers drop an eye or lose the user for a frame or two all the time.
//! Consumers that read the latest frame directly see those glitches; the cache
//! instead scans a short history and publishes the most recent usable values.
//!
//! Writes happen on the tracker thread under one mutex. Every accepted update
//! publishes a fresh [`GazeSnapshot`] that readers pick up without ever seeing
//! a half-written state.

use glam::{UVec2, Vec2, Vec3};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{validate_resolution, CacheConfig};
use crate::constants::*;
use crate::error::ConfigError;
use crate::queue::GazeDataQueue;
use crate::sample::{Eye, GazeSample};
use crate::screen;

/// Which eye data the last update could use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FixKind {
    /// Both pupils seen in the same frame.
    Full,
    /// Only a left pupil; position extrapolated from the last full fix.
    LeftOnly,
    /// Only a right pupil; position extrapolated from the last full fix.
    RightOnly,
    /// No usable eye data in the window.
    #[default]
    None,
}

/// Immutable view of the derived gaze state.
///
/// - `user_position`: X/Y in \[-1, 1\] around the camera center, Z in \[0, 1\]
///   as a depth proxy (larger means farther away)
/// - `eyes_angle_deg`: roll of the line through both pupils
/// - `frame_delta_ms`: clock time between the last two accepted samples
/// - `user_position_timestamp_ms`: clock time of the last position update,
///   `None` until any eye has been seen
///
/// When the window runs out of eye data the eyes become `None` but position
/// and angle keep their last values, so "stale" stays distinguishable from
/// "unknown".
#[derive(Clone, Debug, PartialEq)]
pub struct GazeSnapshot {
    pub left_eye: Option<Eye>,
    pub right_eye: Option<Eye>,
    pub raw_gaze: Option<Vec2>,
    pub smoothed_gaze: Option<Vec2>,
    pub user_position: Vec3,
    pub eyes_angle_deg: f64,
    pub frame_delta_ms: i64,
    pub user_position_timestamp_ms: Option<i64>,
    pub fix: FixKind,
}

impl GazeSnapshot {
    fn seeded(depth: f32) -> Self {
        Self {
            left_eye: None,
            right_eye: None,
            raw_gaze: None,
            smoothed_gaze: None,
            user_position: Vec3::new(0.0, 0.0, depth),
            eyes_angle_deg: 0.0,
            frame_delta_ms: INITIAL_FRAME_DELTA_MS,
            user_position_timestamp_ms: None,
            fix: FixKind::None,
        }
    }
}

/// Read side of the cache, for consumers that only need the latest estimate.
pub trait GazeStateSource: Send + Sync {
    fn snapshot(&self) -> Arc<GazeSnapshot>;
}

/// Receiver of raw tracker frames, called on the tracker thread.
pub trait GazeListener: Send + Sync {
    fn on_gaze_update(&self, sample: GazeSample);
}

/// Both pupils from the newest frame that had them.
#[derive(Clone, Copy, Debug)]
struct FullFix {
    left: Eye,
    right: Eye,
    midpoint: Vec2,
    half_vector: Vec2,
    distance: f32,
}

impl FullFix {
    fn from_eyes(left: Eye, right: Eye) -> Self {
        let (l, r) = (left.pupil_center, right.pupil_center);
        Self {
            left,
            right,
            midpoint: (l + r) / 2.0,
            half_vector: (r - l) / 2.0,
            distance: screen::distance(l, r),
        }
    }
}

#[derive(Default, Debug)]
struct WindowScan {
    full: Option<FullFix>,
    left: Option<Eye>,
    right: Option<Eye>,
    gaze: Option<(Vec2, Vec2)>,
}

/// Walks the window newest first. The first qualifying frame wins each slot.
fn scan_window(frames: &GazeDataQueue) -> WindowScan {
    let mut scan = WindowScan::default();
    for sample in frames.iter().rev() {
        if sample.state.is_tracking() {
            if scan.full.is_none() && sample.has_both_pupils() {
                scan.full = Some(FullFix::from_eyes(sample.left, sample.right));
            } else if scan.full.is_none() && scan.left.is_none() && sample.left.has_pupil() {
                scan.left = Some(sample.left);
            } else if scan.full.is_none() && scan.right.is_none() && sample.right.has_pupil() {
                scan.right = Some(sample.right);
            }

            if scan.gaze.is_none() && sample.has_gaze() {
                scan.gaze = Some((sample.raw, sample.smoothed));
            }
        }

        if scan.full.is_some() && scan.gaze.is_some() {
            break;
        }
    }
    scan
}

/// Session-lifetime calibration carried between updates.
#[derive(Clone, Debug)]
struct Fusion {
    min_eye_distance: f32,
    max_eye_distance: f32,
    half_vector: Vec2,
    depth: f32,
}

impl Fusion {
    fn new(config: &CacheConfig) -> Self {
        Self {
            min_eye_distance: config.min_eye_distance,
            max_eye_distance: config.max_eye_distance,
            half_vector: initial_eyes_half_vector(),
            depth: initial_depth(config.min_eye_distance, config.max_eye_distance),
        }
    }

    fn observe_distance(&mut self, distance: f32) {
        self.min_eye_distance = self.min_eye_distance.min(distance);
        self.max_eye_distance = self.max_eye_distance.max(distance);
        self.depth = 1.0 - distance / self.max_eye_distance;
    }

    fn apply(
        &mut self,
        scan: &WindowScan,
        previous: &GazeSnapshot,
        resolution: UVec2,
        now_ms: i64,
    ) -> GazeSnapshot {
        let mut next = GazeSnapshot {
            raw_gaze: scan.gaze.map(|(raw, _)| raw),
            smoothed_gaze: scan.gaze.map(|(_, smoothed)| smoothed),
            ..previous.clone()
        };

        if let Some(full) = &scan.full {
            if full.half_vector != Vec2::ZERO {
                self.half_vector = full.half_vector;
            }
        }

        match (scan.full, scan.left, scan.right) {
            (Some(full), _, _) => {
                self.observe_distance(full.distance);
                next.user_position = screen::to_centered(full.midpoint).extend(self.depth);
                next.eyes_angle_deg = screen::eye_angle_deg(
                    full.left.pupil_center,
                    full.right.pupil_center,
                    resolution,
                );
                next.left_eye = Some(full.left);
                next.right_eye = Some(full.right);
                next.user_position_timestamp_ms = Some(now_ms);
                next.fix = FixKind::Full;
            }
            (None, Some(left), _) => {
                let center = left.pupil_center + self.half_vector;
                next.user_position = screen::to_centered(center).extend(self.depth);
                next.left_eye = Some(left);
                next.right_eye = None;
                next.user_position_timestamp_ms = Some(now_ms);
                next.fix = FixKind::LeftOnly;
            }
            (None, None, Some(right)) => {
                let center = right.pupil_center - self.half_vector;
                next.user_position = screen::to_centered(center).extend(self.depth);
                next.left_eye = None;
                next.right_eye = Some(right);
                next.user_position_timestamp_ms = Some(now_ms);
                next.fix = FixKind::RightOnly;
            }
            (None, None, None) => {
                next.left_eye = None;
                next.right_eye = None;
                next.fix = FixKind::None;
            }
        }
        next
    }
}

struct CacheState {
    frames: GazeDataQueue,
    fusion: Fusion,
    resolution: UVec2,
    last_frame_ms: i64,
}

/// Time-windowed frame cache producing a glitch-free gaze estimate.
///
/// Construct once per tracker session and share it through an `Arc`; the
/// tracker thread calls [`GazeFrameCache::update`] while any number of readers
/// call [`GazeFrameCache::snapshot`] or the `last_*` accessors.
pub struct GazeFrameCache<C: Clock = MonotonicClock> {
    state: Mutex<CacheState>,
    published: RwLock<Arc<GazeSnapshot>>,
    clock: C,
}

impl GazeFrameCache<MonotonicClock> {
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, MonotonicClock::default())
    }
}

impl<C: Clock> GazeFrameCache<C> {
    pub fn with_clock(config: CacheConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let fusion = Fusion::new(&config);
        let seeded = GazeSnapshot::seeded(fusion.depth);
        let state = CacheState {
            frames: GazeDataQueue::new(config.window_ms),
            fusion,
            resolution: config.screen_resolution(),
            last_frame_ms: clock.now_ms(),
        };
        Ok(Self {
            state: Mutex::new(state),
            published: RwLock::new(Arc::new(seeded)),
            clock,
        })
    }

    /// Ingests one tracker frame and republishes the derived state.
    ///
    /// Returns `false` without touching anything when the frame is already in
    /// the window, so re-delivered frames are harmless. Frames carrying
    /// non-finite coordinates are dropped the same way.
    pub fn update(&self, sample: GazeSample) -> bool {
        if !sample.is_well_formed() {
            log::trace!("gaze cache: malformed frame at {} ms ignored", sample.timestamp_ms);
            return false;
        }
        let mut state = self.lock_state();
        if state.frames.contains(&sample) {
            log::trace!("gaze cache: duplicate frame at {} ms ignored", sample.timestamp_ms);
            return false;
        }

        // delta tracks the raw stream, not only frames with usable data
        let now = self.clock.now_ms();
        let frame_delta = now - state.last_frame_ms;
        state.last_frame_ms = now;

        state.frames.enqueue(sample);
        let scan = scan_window(&state.frames);

        let previous = self.snapshot();
        let resolution = state.resolution;
        let mut next = state.fusion.apply(&scan, &previous, resolution, now);
        next.frame_delta_ms = frame_delta;

        if next.fix != previous.fix {
            log::debug!("gaze fix {:?} -> {:?}", previous.fix, next.fix);
        }
        self.publish(next);
        true
    }

    /// Drops the buffered frames. Derived values stay until the next update.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        let dropped = state.frames.len();
        state.frames.clear();
        log::debug!("gaze cache cleared ({} frames dropped)", dropped);
    }

    pub fn set_screen_resolution(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        validate_resolution(width, height)?;
        self.lock_state().resolution = UVec2::new(width, height);
        Ok(())
    }

    pub fn screen_resolution(&self) -> UVec2 {
        self.lock_state().resolution
    }

    /// Latest consistent view of every derived value.
    pub fn snapshot(&self) -> Arc<GazeSnapshot> {
        Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn last_user_position(&self) -> Vec3 {
        self.snapshot().user_position
    }

    pub fn last_left_eye(&self) -> Option<Eye> {
        self.snapshot().left_eye
    }

    pub fn last_right_eye(&self) -> Option<Eye> {
        self.snapshot().right_eye
    }

    pub fn last_eyes_angle(&self) -> f64 {
        self.snapshot().eyes_angle_deg
    }

    pub fn last_raw_gaze(&self) -> Option<Vec2> {
        self.snapshot().raw_gaze
    }

    pub fn last_smoothed_gaze(&self) -> Option<Vec2> {
        self.snapshot().smoothed_gaze
    }

    pub fn last_delta_ms(&self) -> i64 {
        self.snapshot().frame_delta_ms
    }

    pub fn last_user_position_timestamp_ms(&self) -> Option<i64> {
        self.snapshot().user_position_timestamp_ms
    }

    /// Time since the user position was last refreshed from eye data.
    pub fn last_user_position_age_ms(&self) -> Option<i64> {
        self.last_user_position_timestamp_ms()
            .map(|ts| self.clock.now_ms() - ts)
    }

    pub fn fix(&self) -> FixKind {
        self.snapshot().fix
    }

    /// Smallest and largest inter-pupil distance seen this session.
    pub fn eye_distance_bounds(&self) -> (f32, f32) {
        let state = self.lock_state();
        (state.fusion.min_eye_distance, state.fusion.max_eye_distance)
    }

    pub fn window_len(&self) -> usize {
        self.lock_state().frames.len()
    }

    /// Timestamps of the buffered frames, oldest first.
    pub fn window_timestamps(&self) -> Vec<i64> {
        self.lock_state()
            .frames
            .iter()
            .map(|s| s.timestamp_ms)
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: GazeSnapshot) {
        let mut slot = self.published.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(snapshot);
    }
}

impl<C: Clock> GazeStateSource for GazeFrameCache<C> {
    fn snapshot(&self) -> Arc<GazeSnapshot> {
        GazeFrameCache::snapshot(self)
    }
}

impl<C: Clock> GazeListener for GazeFrameCache<C> {
    fn on_gaze_update(&self, sample: GazeSample) {
        self.update(sample);
    }
}
