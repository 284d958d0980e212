use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("time window must be positive, got {0} ms")]
    InvalidWindow(i64),
    #[error("screen resolution must be non-zero, got {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },
    #[error("eye distance bounds must satisfy 0 < min <= max, got min {min} max {max}")]
    InvalidEyeDistance { min: f32, max: f32 },
    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a gaze trace (bad magic)")]
    BadMagic,
    #[error("trace ends with a partial record ({0} trailing bytes)")]
    Truncated(usize),
}
