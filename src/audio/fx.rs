// The shared send bus: a delay line feeding back into itself, forward into
// a biquad filter and a wet gain, with a parallel dry path. The topology is
// fixed for the life of the process; only per-node parameters move.

use super::frame::StereoFrame;
use crate::audio_api::{EffectsSnapshot, FilterType};

// longest delay the line will honor; the setters accept anything >= 0 and
// the engine clamps to what the buffer can hold
pub const MAX_DELAY_SECONDS: f32 = 2.0;

const FILTER_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

pub struct DelayLine {
    buffer: Vec<StereoFrame>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![StereoFrame::zero(); capacity.max(2)],
            write_pos: 0,
        }
    }

    // the frame written `delay_frames` writes ago; reads happen before the
    // current write so the feedback loop can fold the tap back in
    pub fn read(&self, delay_frames: usize) -> StereoFrame {
        let len = self.buffer.len();
        let delay = delay_frames.clamp(1, len - 1);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    pub fn write(&mut self, frame: StereoFrame) {
        self.buffer[self.write_pos] = frame;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(StereoFrame::zero());
        self.write_pos = 0;
    }
}

// RBJ cookbook biquad at fixed Q; one set of coefficients drives both
// channels, state is kept per channel.
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: StereoFrame,
    x2: StereoFrame,
    y1: StereoFrame,
    y2: StereoFrame,
}

impl Biquad {
    pub fn new(freq: f32, filter_type: FilterType, sample_rate: f32) -> Self {
        let mut filter = Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: StereoFrame::zero(),
            x2: StereoFrame::zero(),
            y1: StereoFrame::zero(),
            y2: StereoFrame::zero(),
        };
        filter.set(freq, filter_type, sample_rate);
        filter
    }

    // Recompute coefficients; filter memory is kept so parameter sweeps
    // don't click.
    pub fn set(&mut self, freq: f32, filter_type: FilterType, sample_rate: f32) {
        let freq = freq.clamp(1.0, sample_rate * 0.49);
        let w0 = std::f32::consts::TAU * freq / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * FILTER_Q);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::Lowpass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Highpass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Bandpass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Notch => (
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Allpass => (
                1.0 - alpha,
                -2.0 * cos_w0,
                1.0 + alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    pub fn process(&mut self, x: StereoFrame) -> StereoFrame {
        let y = StereoFrame {
            left: self.b0 * x.left + self.b1 * self.x1.left + self.b2 * self.x2.left
                - self.a1 * self.y1.left
                - self.a2 * self.y2.left,
            right: self.b0 * x.right + self.b1 * self.x1.right + self.b2 * self.x2.right
                - self.a1 * self.y1.right
                - self.a2 * self.y2.right,
        };
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = StereoFrame::zero();
        self.x2 = StereoFrame::zero();
        self.y1 = StereoFrame::zero();
        self.y2 = StereoFrame::zero();
    }
}

pub struct FxBus {
    sample_rate: f32,
    params: EffectsSnapshot,
    delay: DelayLine,
    filter: Biquad,
}

impl FxBus {
    pub fn new(sample_rate: f32, params: EffectsSnapshot) -> Self {
        let capacity = (MAX_DELAY_SECONDS * sample_rate) as usize;
        let filter = Biquad::new(params.filter_freq, params.filter_type, sample_rate);
        Self {
            sample_rate,
            params,
            delay: DelayLine::new(capacity),
            filter,
        }
    }

    pub fn set_params(&mut self, params: EffectsSnapshot) {
        self.filter
            .set(params.filter_freq, params.filter_type, self.sample_rate);
        self.params = params;
    }

    // `send` holds this block's summed per-pad delay sends. Wet and dry of
    // the bus both land in `out` on top of whatever is already there.
    pub fn process(&mut self, send: &[StereoFrame], out: &mut [StereoFrame]) {
        let delay_frames = (self.params.delay_time * self.sample_rate) as usize;
        let feedback = self.params.feedback;
        let wet = self.params.wet;
        let dry = self.params.dry;

        for (s, o) in send.iter().zip(out.iter_mut()) {
            let delayed = self.delay.read(delay_frames);
            self.delay.write(StereoFrame {
                left: s.left + delayed.left * feedback,
                right: s.right + delayed.right * feedback,
            });
            let filtered = self.filter.process(delayed);
            o.left += filtered.left * wet + s.left * dry;
            o.right += filtered.right * wet + s.right * dry;
        }
    }
}
