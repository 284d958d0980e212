// Host-side tests for the gaze frame cache fusion logic.
// Time is driven by a ManualClock so deltas and timestamps are exact.

use gaze_core::*;
use glam::{Vec2, Vec3};
use std::sync::Arc;

fn make_cache() -> (GazeFrameCache<Arc<ManualClock>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let cache = GazeFrameCache::with_clock(CacheConfig::default(), clock.clone()).unwrap();
    (cache, clock)
}

fn both_eyes(ts: i64, left: [f32; 2], right: [f32; 2]) -> GazeSample {
    GazeSample::new(ts, TrackingState::TRACKING).with_pupils(Vec2::from(left), Vec2::from(right))
}

fn left_only(ts: i64, left: [f32; 2]) -> GazeSample {
    GazeSample::new(ts, TrackingState::TRACKING).with_pupils(Vec2::from(left), Vec2::ZERO)
}

fn right_only(ts: i64, right: [f32; 2]) -> GazeSample {
    GazeSample::new(ts, TrackingState::TRACKING).with_pupils(Vec2::ZERO, Vec2::from(right))
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-5
}

#[test]
fn fresh_cache_reports_seeded_state() {
    let (cache, _) = make_cache();
    let snap = cache.snapshot();
    assert_eq!(snap.fix, FixKind::None);
    assert!(snap.left_eye.is_none());
    assert!(snap.right_eye.is_none());
    assert!(snap.raw_gaze.is_none());
    assert!(approx_vec3(snap.user_position, Vec3::new(0.0, 0.0, 0.375)));
    assert_eq!(snap.frame_delta_ms, INITIAL_FRAME_DELTA_MS);
    assert_eq!(snap.user_position_timestamp_ms, None);
    assert_eq!(cache.last_user_position_age_ms(), None);
    assert_eq!(cache.window_len(), 0);
}

#[test]
fn full_fix_centers_and_normalizes_position() {
    let (cache, _) = make_cache();
    assert!(cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.5])));

    let pos = cache.last_user_position();
    // midpoint (0.5, 0.5) maps to the center; distance 0.2 of max 0.4 gives depth 0.5
    assert!(approx_vec3(pos, Vec3::new(0.0, 0.0, 0.5)), "got {pos:?}");
    assert!(approx(cache.last_eyes_angle() as f32, 0.0));
    assert_eq!(cache.fix(), FixKind::Full);
    assert!(cache.last_left_eye().is_some());
    assert!(cache.last_right_eye().is_some());
    assert_eq!(cache.last_user_position_timestamp_ms(), Some(1_000));
}

#[test]
fn full_fix_position_stays_within_normalized_bounds() {
    let (cache, _) = make_cache();
    let pairs = [
        ([0.05, 0.05], [0.3, 0.1]),
        ([0.7, 0.9], [0.95, 0.95]),
        ([0.1, 0.5], [0.9, 0.5]),
        ([0.48, 0.2], [0.52, 0.21]),
    ];
    for (i, (l, r)) in pairs.iter().enumerate() {
        cache.update(both_eyes(i as i64 * 10, *l, *r));
        let p = cache.last_user_position();
        assert!((-1.0..=1.0).contains(&p.x), "x out of range: {p:?}");
        assert!((-1.0..=1.0).contains(&p.y), "y out of range: {p:?}");
        assert!((0.0..=1.0).contains(&p.z), "z out of range: {p:?}");
    }
}

#[test]
fn eye_angle_accounts_for_screen_aspect() {
    let (cache, _) = make_cache();
    cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.6]));
    let dx = 0.6f32 - 0.4;
    let dy = 0.6f32 - 0.5;
    let expected = (1080.0 * dy as f64).atan2(1920.0 * dx as f64).to_degrees();
    assert!((cache.last_eyes_angle() - expected).abs() < 1e-3);

    cache.set_screen_resolution(1000, 1000).unwrap();
    cache.update(both_eyes(10, [0.4, 0.5], [0.6, 0.7]));
    assert!((cache.last_eyes_angle() - 45.0).abs() < 1e-3);
}

#[test]
fn zero_resolution_is_rejected() {
    let (cache, _) = make_cache();
    assert!(matches!(
        cache.set_screen_resolution(0, 1080),
        Err(ConfigError::InvalidResolution { width: 0, height: 1080 })
    ));
    assert_eq!(cache.screen_resolution(), glam::UVec2::new(1920, 1080));
}

#[test]
fn eye_distance_bounds_only_widen() {
    let (cache, _) = make_cache();
    assert_eq!(cache.eye_distance_bounds(), (0.1, 0.4));

    cache.update(both_eyes(0, [0.2, 0.5], [0.8, 0.5]));
    let (min, max) = cache.eye_distance_bounds();
    assert!(approx(min, 0.1));
    assert!(approx(max, 0.6));
    // farthest observed distance means the user is as close as seen so far
    assert!(approx(cache.last_user_position().z, 0.0));

    cache.update(both_eyes(10, [0.475, 0.5], [0.525, 0.5]));
    let (min, max) = cache.eye_distance_bounds();
    assert!(approx(min, 0.05));
    assert!(approx(max, 0.6));
    assert!(approx(cache.last_user_position().z, 1.0 - 0.05 / 0.6));

    cache.update(both_eyes(20, [0.4, 0.5], [0.6, 0.5]));
    assert_eq!(cache.eye_distance_bounds(), (min, max));
}

#[test]
fn duplicate_sample_leaves_state_unchanged() {
    let (cache, clock) = make_cache();
    let sample = both_eyes(0, [0.4, 0.5], [0.6, 0.5]).with_gaze(
        Vec2::new(300.0, 400.0),
        Vec2::new(310.0, 405.0),
    );
    assert!(cache.update(sample));
    let before = cache.snapshot();

    clock.advance(20);
    assert!(!cache.update(sample));
    let after = cache.snapshot();
    assert_eq!(*before, *after);
    assert_eq!(cache.window_len(), 1);
}

#[test]
fn failed_tracking_frames_never_produce_eyes() {
    let (cache, _) = make_cache();
    let seeded = cache.last_user_position();
    for (ts, state) in [
        (0, TrackingState::FAIL),
        (100, TrackingState::LOST),
        (200, TrackingState::FAIL | TrackingState::LOST | TrackingState::EYES),
    ] {
        let sample = GazeSample::new(ts, state)
            .with_pupils(Vec2::new(0.4, 0.5), Vec2::new(0.6, 0.5))
            .with_gaze(Vec2::new(500.0, 500.0), Vec2::new(500.0, 500.0));
        assert!(cache.update(sample));
    }
    assert!(cache.last_left_eye().is_none());
    assert!(cache.last_right_eye().is_none());
    assert!(cache.last_raw_gaze().is_none());
    assert_eq!(cache.last_user_position(), seeded);
    assert_eq!(cache.fix(), FixKind::None);
    assert_eq!(cache.last_user_position_timestamp_ms(), None);
}

#[test]
fn full_then_left_only_then_no_eyes() {
    let (cache, clock) = make_cache();

    // samples are spaced beyond the 500 ms window so each one stands alone
    cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.5]));
    let full_angle = cache.last_eyes_angle();

    clock.advance(600);
    cache.update(left_only(600, [0.45, 0.5]));
    assert_eq!(cache.fix(), FixKind::LeftOnly);
    assert!(cache.last_left_eye().is_some());
    assert!(cache.last_right_eye().is_none());
    // left pupil plus the remembered half vector (0.1, 0), depth carried over
    let partial = cache.last_user_position();
    assert!(approx_vec3(partial, Vec3::new(0.1, 0.0, 0.5)), "got {partial:?}");
    assert_eq!(cache.last_user_position_timestamp_ms(), Some(1_600));

    clock.advance(600);
    cache.update(GazeSample::new(1200, TrackingState::PRESENCE));
    assert_eq!(cache.fix(), FixKind::None);
    assert!(cache.last_left_eye().is_none());
    assert!(cache.last_right_eye().is_none());
    assert_eq!(cache.last_user_position(), partial);
    assert_eq!(cache.last_eyes_angle(), full_angle);
    assert_eq!(cache.last_user_position_timestamp_ms(), Some(1_600));
    assert_eq!(cache.last_user_position_age_ms(), Some(600));
}

#[test]
fn right_only_subtracts_half_vector() {
    let (cache, _) = make_cache();
    cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.5]));
    cache.update(right_only(600, [0.65, 0.5]));
    assert_eq!(cache.fix(), FixKind::RightOnly);
    assert!(cache.last_left_eye().is_none());
    assert!(cache.last_right_eye().is_some());
    assert!(approx_vec3(cache.last_user_position(), Vec3::new(0.1, 0.0, 0.5)));
}

#[test]
fn partial_fix_before_any_full_fix_uses_initial_half_vector() {
    let (cache, _) = make_cache();
    cache.update(left_only(0, [0.3, 0.5]));
    assert!(approx_vec3(
        cache.last_user_position(),
        Vec3::new(0.0, 0.0, 0.375)
    ));
}

#[test]
fn left_partial_wins_when_both_partials_are_in_window() {
    let (cache, _) = make_cache();
    cache.update(right_only(0, [0.6, 0.5]));
    cache.update(left_only(50, [0.3, 0.5]));
    assert_eq!(cache.fix(), FixKind::LeftOnly);
    assert!(cache.last_right_eye().is_none());
}

#[test]
fn older_full_fix_in_window_beats_newer_partial() {
    let (cache, _) = make_cache();
    cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.5]));
    cache.update(left_only(100, [0.45, 0.5]));
    assert_eq!(cache.fix(), FixKind::Full);
    let left = cache.last_left_eye().unwrap();
    assert_eq!(left.pupil_center, Vec2::new(0.4, 0.5));
    assert!(cache.last_right_eye().is_some());
}

#[test]
fn newest_full_fix_wins() {
    let (cache, _) = make_cache();
    cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.5]));
    cache.update(both_eyes(100, [0.2, 0.3], [0.4, 0.3]));
    let pos = cache.last_user_position();
    assert!(approx(pos.x, -0.4));
    assert!(approx(pos.y, -0.4));
}

#[test]
fn gaze_comes_from_newest_frame_with_raw_coordinates() {
    let (cache, _) = make_cache();
    let gazing = GazeSample::new(0, TrackingState::TRACKING)
        .with_gaze(Vec2::new(100.0, 200.0), Vec2::new(110.0, 210.0));
    cache.update(gazing);
    cache.update(GazeSample::new(100, TrackingState::PRESENCE));
    assert_eq!(cache.last_raw_gaze(), Some(Vec2::new(100.0, 200.0)));
    assert_eq!(cache.last_smoothed_gaze(), Some(Vec2::new(110.0, 210.0)));

    // gaze reported by a failed frame is not trusted
    let failed = GazeSample::new(200, TrackingState::FAIL)
        .with_gaze(Vec2::new(900.0, 900.0), Vec2::new(900.0, 900.0));
    cache.update(failed);
    assert_eq!(cache.last_raw_gaze(), Some(Vec2::new(100.0, 200.0)));

    // once the gazing frame leaves the window there is no gaze at all
    cache.update(GazeSample::new(800, TrackingState::PRESENCE));
    assert_eq!(cache.last_raw_gaze(), None);
    assert_eq!(cache.last_smoothed_gaze(), None);
}

#[test]
fn frame_delta_follows_the_clock() {
    let (cache, clock) = make_cache();
    clock.advance(40);
    cache.update(GazeSample::new(0, TrackingState::TRACKING));
    assert_eq!(cache.last_delta_ms(), 40);
    clock.advance(33);
    cache.update(GazeSample::new(33, TrackingState::TRACKING));
    assert_eq!(cache.last_delta_ms(), 33);
}

#[test]
fn window_never_spans_more_than_time_limit() {
    let (cache, _) = make_cache();
    let sim = TrackerSimulator::new(SimulatorParams::default(), 7, 0);
    for (i, mut sample) in sim.take(400).enumerate() {
        // irregular delivery, including long stalls
        sample.timestamp_ms += (i as i64 / 50) * 700;
        cache.update(sample);
        let ts = cache.window_timestamps();
        let span = ts.last().unwrap() - ts.first().unwrap();
        assert!(span <= DEFAULT_CACHE_WINDOW_MS, "window spans {span} ms");
    }
}

#[test]
fn clear_drops_frames_but_keeps_published_state() {
    let (cache, _) = make_cache();
    cache.update(both_eyes(0, [0.4, 0.5], [0.6, 0.5]));
    cache.update(both_eyes(30, [0.4, 0.5], [0.6, 0.5]));
    assert_eq!(cache.window_len(), 2);
    let before = cache.snapshot();
    cache.clear();
    assert_eq!(cache.window_len(), 0);
    assert_eq!(*cache.snapshot(), *before);
}

#[test]
fn invalid_config_is_rejected() {
    let config = CacheConfig {
        window_ms: 0,
        ..CacheConfig::default()
    };
    assert!(matches!(
        GazeFrameCache::new(config),
        Err(ConfigError::InvalidWindow(0))
    ));

    let config = CacheConfig {
        min_eye_distance: 0.5,
        max_eye_distance: 0.2,
        ..CacheConfig::default()
    };
    assert!(matches!(
        GazeFrameCache::new(config),
        Err(ConfigError::InvalidEyeDistance { .. })
    ));
}

#[test]
fn readers_always_see_consistent_snapshots() {
    let cache = Arc::new(GazeFrameCache::new(CacheConfig::default()).unwrap());
    let params = SimulatorParams {
        eye_dropout: 0.3,
        tracking_loss: 0.2,
        ..SimulatorParams::default()
    };
    let samples: Vec<GazeSample> = TrackerSimulator::new(params, 11, 0).take(2_000).collect();

    std::thread::scope(|s| {
        let writer = cache.clone();
        s.spawn(move || {
            for sample in samples {
                writer.update(sample);
            }
        });
        for _ in 0..2_000 {
            let snap = cache.snapshot();
            match snap.fix {
                FixKind::Full => assert!(snap.left_eye.is_some() && snap.right_eye.is_some()),
                FixKind::LeftOnly => assert!(snap.left_eye.is_some() && snap.right_eye.is_none()),
                FixKind::RightOnly => assert!(snap.left_eye.is_none() && snap.right_eye.is_some()),
                FixKind::None => assert!(snap.left_eye.is_none() && snap.right_eye.is_none()),
            }
        }
    });
}

#[test]
fn cache_is_usable_through_its_traits() {
    let cache = Arc::new(GazeFrameCache::new(CacheConfig::default()).unwrap());
    let listener: Arc<dyn GazeListener> = cache.clone();
    let source: Arc<dyn GazeStateSource> = cache.clone();
    listener.on_gaze_update(both_eyes(0, [0.4, 0.5], [0.6, 0.5]));
    assert_eq!(source.snapshot().fix, FixKind::Full);
}

#[test]
fn non_finite_frames_are_ignored() {
    let (cache, clock) = make_cache();
    let bad_pupil = both_eyes(0, [f32::INFINITY, 0.5], [0.6, 0.5]);
    let bad_gaze = GazeSample::new(5, TrackingState::TRACKING)
        .with_pupils(Vec2::new(0.4, 0.5), Vec2::new(0.6, 0.5))
        .with_gaze(Vec2::new(f32::NAN, 10.0), Vec2::new(10.0, 10.0));
    let mut bad_size = both_eyes(8, [0.4, 0.5], [0.6, 0.5]);
    bad_size.right.pupil_size = f32::NAN;

    for sample in [bad_pupil, bad_gaze, bad_size] {
        assert!(!sample.is_well_formed());
        assert!(!cache.update(sample));
        // rejected every time, never counted as a duplicate of itself
        assert!(!cache.update(sample));
    }
    assert_eq!(cache.window_len(), 0);
    assert_eq!(cache.fix(), FixKind::None);

    clock.advance(33);
    assert!(cache.update(both_eyes(40, [0.4, 0.5], [0.6, 0.5])));
    let (min, max) = cache.eye_distance_bounds();
    assert!(min.is_finite() && max.is_finite(), "bounds {min} {max}");
    let pos = cache.last_user_position();
    assert!(pos.is_finite(), "got {pos:?}");
    assert!(approx_vec3(pos, Vec3::new(0.0, 0.0, 0.5)), "got {pos:?}");
}

#[test]
fn extreme_timestamps_do_not_overflow() {
    let (cache, _) = make_cache();
    assert!(cache.update(both_eyes(i64::MIN, [0.4, 0.5], [0.6, 0.5])));
    assert!(cache.update(both_eyes(i64::MAX, [0.45, 0.5], [0.65, 0.5])));
    assert_eq!(cache.window_len(), 1);
    assert_eq!(cache.window_timestamps(), vec![i64::MAX]);
    assert_eq!(cache.fix(), FixKind::Full);
}
