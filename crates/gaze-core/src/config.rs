use glam::UVec2;

use crate::constants::*;
use crate::error::ConfigError;

/// Construction-time settings for [`crate::GazeFrameCache`].
///
/// - `window_ms`: how much sample history the fusion scan may look back on
/// - `screen_width`/`screen_height`: tracker screen in pixels, used to turn
///   relative pupil deltas into an on-screen eye angle
/// - `min_eye_distance`/`max_eye_distance`: initial bounds of the observed
///   inter-pupil distance; the cache widens them as it sees more
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    pub window_ms: i64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub min_eye_distance: f32,
    pub max_eye_distance: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_CACHE_WINDOW_MS,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            min_eye_distance: DEFAULT_MIN_EYE_DISTANCE,
            max_eye_distance: DEFAULT_MAX_EYE_DISTANCE,
        }
    }
}

pub const ENV_WINDOW_MS: &str = "GAZE_WINDOW_MS";
pub const ENV_SCREEN_WIDTH: &str = "GAZE_SCREEN_WIDTH";
pub const ENV_SCREEN_HEIGHT: &str = "GAZE_SCREEN_HEIGHT";

impl CacheConfig {
    /// Defaults overlaid with `GAZE_WINDOW_MS`, `GAZE_SCREEN_WIDTH` and
    /// `GAZE_SCREEN_HEIGHT` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CacheConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_WINDOW_MS) {
            config.window_ms = parse_env(ENV_WINDOW_MS, v)?;
        }
        if let Some(v) = lookup(ENV_SCREEN_WIDTH) {
            config.screen_width = parse_env(ENV_SCREEN_WIDTH, v)?;
        }
        if let Some(v) = lookup(ENV_SCREEN_HEIGHT) {
            config.screen_height = parse_env(ENV_SCREEN_HEIGHT, v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms <= 0 {
            return Err(ConfigError::InvalidWindow(self.window_ms));
        }
        validate_resolution(self.screen_width, self.screen_height)?;
        let (min, max) = (self.min_eye_distance, self.max_eye_distance);
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(ConfigError::InvalidEyeDistance { min, max });
        }
        Ok(())
    }

    pub fn screen_resolution(&self) -> UVec2 {
        UVec2::new(self.screen_width, self.screen_height)
    }
}

pub(crate) fn validate_resolution(width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidResolution { width, height });
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
