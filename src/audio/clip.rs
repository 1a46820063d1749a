use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use super::frame::StereoFrame;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipId(pub u64);

// atomic counter so ids stay unique no matter which thread asks
pub fn next_clip_id() -> ClipId {
    ClipId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

// A decoded clip: stereo f32 frames at a known rate. Immutable once built;
// the pad store and the engine share one behind an Arc.
#[derive(Clone, Debug)]
pub struct ClipBuffer {
    pub data: Vec<StereoFrame>,
    pub sample_rate: u32,
}

impl ClipBuffer {
    pub fn new(data: Vec<StereoFrame>, sample_rate: u32) -> Self {
        Self { data, sample_rate }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.data.len() as f32 / self.sample_rate as f32
    }

    // Decode a WAV from disk, fold it to stereo, resample to the device rate.
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let frames: Vec<StereoFrame> = if spec.channels == 1 {
            samples.into_iter().map(StereoFrame::splat).collect()
        } else {
            let channels = spec.channels as usize;
            samples
                .chunks_exact(channels)
                .map(|c| StereoFrame {
                    left: c[0],
                    right: c[1],
                })
                .collect()
        };

        let frames = if spec.sample_rate == target_rate {
            frames
        } else {
            resample_linear(&frames, spec.sample_rate, target_rate)
        };

        Ok(Self::new(frames, target_rate))
    }
}

// simple linear resampler; plenty for one-shot pad clips
fn resample_linear(frames: &[StereoFrame], from_rate: u32, to_rate: u32) -> Vec<StereoFrame> {
    if from_rate == to_rate || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src = i as f64 / ratio;
        let idx = src.floor() as usize;
        let frac = (src - idx as f64) as f32;
        if idx + 1 >= frames.len() {
            out.push(*frames.last().unwrap_or(&StereoFrame::zero()));
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(StereoFrame {
                left: a.left + (b.left - a.left) * frac,
                right: a.right + (b.right - a.right) * frac,
            });
        }
    }
    out
}
