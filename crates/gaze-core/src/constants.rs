use glam::Vec2;

// Tuning constants shared by the cache, the meters and the replay front-end.

// Time windows
pub const DEFAULT_CACHE_WINDOW_MS: i64 = 500; // history scanned for the last usable fix
pub const DEFAULT_FPS_WINDOW_MS: i64 = 5000; // history used to average tracker frame rate
pub const INITIAL_FRAME_DELTA_MS: i64 = 50; // reported until a second sample arrives

// Eye distance bounds in relative units; widened as the session observes more
pub const DEFAULT_MIN_EYE_DISTANCE: f32 = 0.1;
pub const DEFAULT_MAX_EYE_DISTANCE: f32 = 0.4;

// Half of the left-to-right pupil vector assumed before the first full fix
pub const INITIAL_EYES_HALF_VECTOR: [f32; 2] = [0.2, 0.0];

// Screen the tracker server reports gaze against
pub const DEFAULT_SCREEN_WIDTH: u32 = 1920;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1080;

// Consumer frame-time averaging
pub const DEFAULT_FRAME_TIME_SAMPLES: usize = 30;

#[inline]
pub fn initial_eyes_half_vector() -> Vec2 {
    Vec2::from(INITIAL_EYES_HALF_VECTOR)
}

/// Depth proxy assumed before any full fix: the midpoint of the distance bounds.
#[inline]
pub fn initial_depth(min_eye_distance: f32, max_eye_distance: f32) -> f32 {
    let mid = min_eye_distance + (max_eye_distance - min_eye_distance) * 0.5;
    1.0 - mid / max_eye_distance
}
