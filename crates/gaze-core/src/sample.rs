//! Tracker sample model.
//!
//! Coordinates follow the tracker server conventions: pupil centers are
//! relative to the tracker camera image in the \[0, 1\] range, gaze points are
//! screen pixels. A zero vector stands for "not detected" in both cases.

use glam::Vec2;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bitmask describing what the tracker resolved for a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TrackingState(u32);

impl TrackingState {
    pub const NONE: Self = Self(0);
    pub const GAZE: Self = Self(1);
    pub const EYES: Self = Self(1 << 1);
    pub const PRESENCE: Self = Self(1 << 2);
    pub const FAIL: Self = Self(1 << 3);
    pub const LOST: Self = Self(1 << 4);

    /// Bits that make a frame unusable for fusion.
    pub const NO_TRACKING: Self = Self(Self::FAIL.0 | Self::LOST.0);

    /// Everything a healthy frame reports.
    pub const TRACKING: Self = Self(Self::GAZE.0 | Self::EYES.0 | Self::PRESENCE.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True unless the frame carries a fail or lost bit.
    pub const fn is_tracking(self) -> bool {
        !self.intersects(Self::NO_TRACKING)
    }
}

impl BitOr for TrackingState {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TrackingState {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TrackingState {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Per-eye data reported with each frame.
///
/// Fields:
/// - `raw`: unfiltered gaze point of this eye (screen pixels)
/// - `smoothed`: tracker-filtered gaze point of this eye (screen pixels)
/// - `pupil_center`: pupil position relative to the camera image, zero if absent
/// - `pupil_size`: pupil diameter in tracker units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Eye {
    pub raw: Vec2,
    pub smoothed: Vec2,
    pub pupil_center: Vec2,
    pub pupil_size: f32,
}

impl Eye {
    #[inline]
    pub fn has_pupil(&self) -> bool {
        self.pupil_center != Vec2::ZERO
    }

    pub fn is_finite(&self) -> bool {
        self.raw.is_finite()
            && self.smoothed.is_finite()
            && self.pupil_center.is_finite()
            && self.pupil_size.is_finite()
    }
}

/// One tracker frame. Immutable once produced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GazeSample {
    pub timestamp_ms: i64,
    pub state: TrackingState,
    pub raw: Vec2,
    pub smoothed: Vec2,
    pub left: Eye,
    pub right: Eye,
    pub is_fixated: bool,
}

impl GazeSample {
    /// Empty frame at `timestamp_ms`: no eyes, no gaze.
    pub fn new(timestamp_ms: i64, state: TrackingState) -> Self {
        Self {
            timestamp_ms,
            state,
            ..Self::default()
        }
    }

    pub fn with_pupils(mut self, left: Vec2, right: Vec2) -> Self {
        self.left.pupil_center = left;
        self.right.pupil_center = right;
        self
    }

    pub fn with_gaze(mut self, raw: Vec2, smoothed: Vec2) -> Self {
        self.raw = raw;
        self.smoothed = smoothed;
        self
    }

    #[inline]
    pub fn has_gaze(&self) -> bool {
        self.raw != Vec2::ZERO
    }

    #[inline]
    pub fn has_both_pupils(&self) -> bool {
        self.left.has_pupil() && self.right.has_pupil()
    }

    /// Every coordinate is finite. NaN or infinite values only come from
    /// corrupt input and would poison anything derived from them.
    pub fn is_well_formed(&self) -> bool {
        self.raw.is_finite()
            && self.smoothed.is_finite()
            && self.left.is_finite()
            && self.right.is_finite()
    }
}
