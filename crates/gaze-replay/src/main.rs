use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use gaze_core::trace::{read_trace, write_trace};
use gaze_core::{
    CacheConfig, FixKind, FrameTimeMeter, GazeFps, GazeFrameCache, GazeListener, GazeSample,
    GazeStateSource, SimulatorParams, TrackerSimulator,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOG_EVERY_POLLS: u32 = 10; // one status line per second

/// Longest replay the front-end will run or simulate.
const MAX_SECONDS: f32 = 3600.0;

/// Replays a recorded or simulated tracker stream through the gaze cache.
#[derive(Parser, Debug)]
#[command(name = "gaze-replay", version, about, long_about = None)]
struct ReplayArgs {
    /// Recorded trace to replay instead of simulating
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Write the simulated stream to this trace file
    #[arg(long, conflicts_with = "trace")]
    record: Option<PathBuf>,

    /// Wall-clock seconds to run (and to simulate)
    #[arg(long, default_value_t = 10.0, value_parser = parse_seconds)]
    seconds: f32,

    /// Simulator seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn parse_seconds(s: &str) -> Result<f32, String> {
    let seconds: f32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_SECONDS {
        return Err(format!("must be in (0, {MAX_SECONDS}]"));
    }
    Ok(seconds)
}

/// Loads a recorded stream, or simulates one covering the requested duration.
fn load_samples(args: &ReplayArgs) -> anyhow::Result<Vec<GazeSample>> {
    if let Some(path) = &args.trace {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let samples = read_trace(BufReader::new(file))
            .with_context(|| format!("reading trace {}", path.display()))?;
        log::info!("loaded {} samples from {}", samples.len(), path.display());
        return Ok(samples);
    }

    let sim = TrackerSimulator::new(SimulatorParams::default(), args.seed, 0);
    let count = ((args.seconds * 1000.0) / sim.interval_ms() as f32).ceil() as usize;
    let samples: Vec<GazeSample> = sim.take(count).collect();
    log::info!("simulated {} samples (seed {})", samples.len(), args.seed);

    if let Some(path) = &args.record {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let written = write_trace(BufWriter::new(file), &samples)
            .with_context(|| format!("writing trace {}", path.display()))?;
        log::info!("recorded {} samples to {}", written, path.display());
    }
    Ok(samples)
}

/// Delivers samples to every listener, paced by their timestamps.
fn spawn_tracker(
    samples: Vec<GazeSample>,
    listeners: Vec<Arc<dyn GazeListener>>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let mut delivered = 0;
        let mut prev_ts: Option<i64> = None;
        for sample in samples {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            if let Some(prev) = prev_ts {
                let gap = sample.timestamp_ms.saturating_sub(prev);
                if gap < 0 {
                    log::warn!(
                        "trace goes back in time at {} ms ({} ms); delivering unpaced",
                        sample.timestamp_ms,
                        gap
                    );
                } else if !wait_or_stop(Duration::from_millis(gap as u64), &stop) {
                    break;
                }
            }
            prev_ts = Some(sample.timestamp_ms);
            for listener in &listeners {
                listener.on_gaze_update(sample);
            }
            delivered += 1;
        }
        delivered
    })
}

/// Sleeps for `gap` in poll-sized slices. Returns `false` as soon as `stop`
/// is raised. A gap too large for `Instant` waits until stopped.
fn wait_or_stop(gap: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now().checked_add(gap);
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let slice = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return true;
                }
                (deadline - now).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };
        thread::sleep(slice);
    }
}

fn log_status(source: &dyn GazeStateSource, fps: &GazeFps, loop_fps: Option<f32>) {
    let snap = source.snapshot();
    let p = snap.user_position;
    let gaze = snap
        .smoothed_gaze
        .map(|g| format!("({:.0}, {:.0})", g.x, g.y))
        .unwrap_or_else(|| "-".to_string());
    let fix = match snap.fix {
        FixKind::Full => "both eyes",
        FixKind::LeftOnly => "left eye",
        FixKind::RightOnly => "right eye",
        FixKind::None => "no eyes",
    };
    log::info!(
        "[gaze] {fix:<9} user=({:+.2}, {:+.2}, {:.2}) angle={:+.1}° gaze={gaze} tracker={} poll={}",
        p.x,
        p.y,
        p.z,
        snap.eyes_angle_deg,
        fmt_fps(fps.avg_fps()),
        fmt_fps(loop_fps),
    );
}

fn fmt_fps(fps: Option<f32>) -> String {
    fps.map(|f| format!("{f:.1}fps"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = ReplayArgs::parse();
    let config = CacheConfig::from_env().context("reading cache configuration")?;
    log::info!(
        "gaze-replay starting: window {} ms, screen {}x{}",
        config.window_ms,
        config.screen_width,
        config.screen_height
    );

    let samples = load_samples(&args)?;
    if samples.is_empty() {
        log::warn!("nothing to replay");
        return Ok(());
    }

    let cache = Arc::new(GazeFrameCache::new(config)?);
    let fps = Arc::new(GazeFps::default());
    let listeners: Vec<Arc<dyn GazeListener>> =
        vec![cache.clone() as Arc<dyn GazeListener>, fps.clone()];

    let stop = Arc::new(AtomicBool::new(false));
    let tracker = spawn_tracker(samples, listeners, stop.clone());

    let deadline = Instant::now() + Duration::from_secs_f32(args.seconds);
    let mut meter = FrameTimeMeter::default();
    let mut last_poll = Instant::now();
    let mut polls = 0u32;
    while !tracker.is_finished() && Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
        let now = Instant::now();
        meter.tick(now - last_poll);
        last_poll = now;
        polls += 1;
        if polls % LOG_EVERY_POLLS == 0 {
            log_status(&*cache, &fps, meter.avg_fps());
        }
    }

    stop.store(true, Ordering::Relaxed);
    let delivered = tracker
        .join()
        .map_err(|_| anyhow::anyhow!("tracker thread panicked"))?;
    log_status(&*cache, &fps, meter.avg_fps());
    let (min, max) = cache.eye_distance_bounds();
    log::info!(
        "replayed {} samples; eye distance bounds [{:.3}, {:.3}]",
        delivered,
        min,
        max
    );
    Ok(())
}
