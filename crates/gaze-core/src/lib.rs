//! Platform-agnostic gaze sample processing shared by native front-ends.
//!
//! The centerpiece is [`GazeFrameCache`], which keeps a short time window of
//! tracker samples and derives a stable user position and gaze point from it.

pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod fps;
pub mod queue;
pub mod sample;
pub mod screen;
pub mod sim;
pub mod trace;

pub use cache::*;
pub use clock::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use fps::*;
pub use queue::*;
pub use sample::*;
pub use sim::*;
