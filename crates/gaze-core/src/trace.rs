//! Binary capture format for tracker streams.
//!
//! A trace is the 8-byte magic followed by back-to-back [`TraceRecord`]s in
//! host byte order. Traces are meant to be replayed on the machine (or at
//! least the architecture) that recorded them.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use std::io::{Read, Write};
use std::mem::size_of;

use crate::error::TraceError;
use crate::sample::{Eye, GazeSample, TrackingState};

pub const TRACE_MAGIC: [u8; 8] = *b"GZTRACE1";

/// Flat on-disk layout of one [`GazeSample`].
///
/// Each eye packs `[raw.x, raw.y, smoothed.x, smoothed.y, pupil.x, pupil.y, pupil_size]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TraceRecord {
    pub timestamp_ms: i64,
    pub state: u32,
    pub fixated: u32,
    pub raw: [f32; 2],
    pub smoothed: [f32; 2],
    pub left: [f32; 7],
    pub right: [f32; 7],
}

pub const TRACE_RECORD_SIZE: usize = size_of::<TraceRecord>();

fn pack_eye(eye: &Eye) -> [f32; 7] {
    [
        eye.raw.x,
        eye.raw.y,
        eye.smoothed.x,
        eye.smoothed.y,
        eye.pupil_center.x,
        eye.pupil_center.y,
        eye.pupil_size,
    ]
}

fn unpack_eye(v: &[f32; 7]) -> Eye {
    Eye {
        raw: Vec2::new(v[0], v[1]),
        smoothed: Vec2::new(v[2], v[3]),
        pupil_center: Vec2::new(v[4], v[5]),
        pupil_size: v[6],
    }
}

impl From<&GazeSample> for TraceRecord {
    fn from(s: &GazeSample) -> Self {
        Self {
            timestamp_ms: s.timestamp_ms,
            state: s.state.bits(),
            fixated: s.is_fixated as u32,
            raw: s.raw.to_array(),
            smoothed: s.smoothed.to_array(),
            left: pack_eye(&s.left),
            right: pack_eye(&s.right),
        }
    }
}

impl From<&TraceRecord> for GazeSample {
    fn from(r: &TraceRecord) -> Self {
        Self {
            timestamp_ms: r.timestamp_ms,
            state: TrackingState::from_bits(r.state),
            raw: Vec2::from(r.raw),
            smoothed: Vec2::from(r.smoothed),
            left: unpack_eye(&r.left),
            right: unpack_eye(&r.right),
            is_fixated: r.fixated != 0,
        }
    }
}

/// Writes the header and one record per sample. Returns the record count.
pub fn write_trace<'a, W, I>(mut out: W, samples: I) -> Result<usize, TraceError>
where
    W: Write,
    I: IntoIterator<Item = &'a GazeSample>,
{
    out.write_all(&TRACE_MAGIC)?;
    let mut count = 0;
    for sample in samples {
        let record = TraceRecord::from(sample);
        out.write_all(bytemuck::bytes_of(&record))?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

pub fn read_trace<R: Read>(mut input: R) -> Result<Vec<GazeSample>, TraceError> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    if bytes.len() < TRACE_MAGIC.len() || bytes[..TRACE_MAGIC.len()] != TRACE_MAGIC {
        return Err(TraceError::BadMagic);
    }
    let body = &bytes[TRACE_MAGIC.len()..];
    let chunks = body.chunks_exact(TRACE_RECORD_SIZE);
    let trailing = chunks.remainder().len();
    if trailing != 0 {
        return Err(TraceError::Truncated(trailing));
    }
    Ok(chunks
        .map(|chunk| {
            let record: TraceRecord = bytemuck::pod_read_unaligned(chunk);
            GazeSample::from(&record)
        })
        .collect())
}
