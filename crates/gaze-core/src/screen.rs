//! Conversions between relative \[0, 1\] coordinates, screen pixels and the
//! centered \[-1, 1\] space used for user positions.

use glam::{UVec2, Vec2};

/// Relative point to pixels on a `width` x `height` surface.
#[inline]
pub fn relative_to_screen(point: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(point.x * width, point.y * height)
}

/// Pixel point to relative values on the tracker's screen.
#[inline]
pub fn screen_to_relative(point: Vec2, resolution: UVec2) -> Vec2 {
    point / resolution.max(UVec2::ONE).as_vec2()
}

/// Pixel point to \[-1, 1\] relative to the screen center.
#[inline]
pub fn screen_to_relative_center(point: Vec2, resolution: UVec2) -> Vec2 {
    to_centered(screen_to_relative(point, resolution))
}

/// Maps \[0, 1\] to \[-1, 1\].
#[inline]
pub fn to_centered(v: Vec2) -> Vec2 {
    v * 2.0 - Vec2::ONE
}

/// Roll of the line through both pupils, in degrees.
///
/// Pupil coordinates are relative, so the deltas are scaled by the screen
/// resolution to get the angle as it appears on a non-square display.
pub fn eye_angle_deg(left: Vec2, right: Vec2, resolution: UVec2) -> f64 {
    let dx = (right.x - left.x) as f64;
    let dy = (right.y - left.y) as f64;
    let w = resolution.x as f64;
    let h = resolution.y as f64;
    (h * dy).atan2(w * dx).to_degrees()
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}
