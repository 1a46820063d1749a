use std::sync::Arc;

use super::clip::ClipBuffer;
use super::frame::StereoFrame;

// One playing instance of a pad's clip. Spawned per trigger, reads the trim
// window once through at unity speed, then dies. Overlapping voices of the
// same clip are fine; each carries its own position.
#[derive(Clone, Debug)]
pub struct Voice {
    clip: Arc<ClipBuffer>,
    pos: usize,
    end: usize,
    gain: f32,
    delay_send: f32,
    active: bool,
}

impl Voice {
    pub fn new(
        clip: Arc<ClipBuffer>,
        start_frame: usize,
        frames: usize,
        gain: f32,
        delay_send: f32,
    ) -> Self {
        let len = clip.data.len();
        let pos = start_frame.min(len);
        let end = start_frame.saturating_add(frames).min(len);
        Self {
            clip,
            pos,
            end,
            gain,
            delay_send,
            active: pos < end,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    // Adds gain-scaled frames into the main block and send-scaled frames
    // into the delay-send scratch. Stops at the trim window.
    pub fn render_into(&mut self, out: &mut [StereoFrame], send: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        for (o, s) in out.iter_mut().zip(send.iter_mut()) {
            if self.pos >= self.end {
                break;
            }
            let frame = self.clip.data[self.pos];
            o.left += frame.left * self.gain;
            o.right += frame.right * self.gain;
            s.left += frame.left * self.delay_send;
            s.right += frame.right * self.delay_send;
            self.pos += 1;
        }
        if self.pos >= self.end {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_clip(frames: usize) -> Arc<ClipBuffer> {
        let data = (0..frames).map(|_| StereoFrame::splat(1.0)).collect();
        Arc::new(ClipBuffer::new(data, 1000))
    }

    fn render_all(voice: &mut Voice, len: usize) -> (Vec<StereoFrame>, Vec<StereoFrame>) {
        let mut out = vec![StereoFrame::zero(); len];
        let mut send = vec![StereoFrame::zero(); len];
        voice.render_into(&mut out, &mut send);
        (out, send)
    }

    #[test]
    fn plays_exactly_the_trim_window() {
        // 2s clip at 1kHz, window [0.5, 1.5) = frames 500..1500
        let mut voice = Voice::new(ramp_clip(2000), 500, 1000, 1.0, 0.0);
        let (out, _) = render_all(&mut voice, 2500);
        assert_eq!(out[0].left, 1.0);
        assert_eq!(out[999].left, 1.0);
        assert_eq!(out[1000].left, 0.0);
        assert!(!voice.is_active());
    }

    #[test]
    fn gain_and_send_scale_independently() {
        let mut voice = Voice::new(ramp_clip(10), 0, 10, 0.5, 0.25);
        let (out, send) = render_all(&mut voice, 10);
        assert_eq!(out[0].left, 0.5);
        assert_eq!(send[0].left, 0.25);
    }

    #[test]
    fn window_truncates_at_buffer_end() {
        let mut voice = Voice::new(ramp_clip(100), 80, 1000, 1.0, 0.0);
        let (out, _) = render_all(&mut voice, 64);
        // only 20 frames were available past the start
        assert_eq!(out[19].left, 1.0);
        assert_eq!(out[20].left, 0.0);
        assert!(!voice.is_active());
    }

    #[test]
    fn spans_multiple_blocks() {
        let mut voice = Voice::new(ramp_clip(100), 0, 100, 1.0, 0.0);
        let (first, _) = render_all(&mut voice, 64);
        assert!(voice.is_active());
        let (second, _) = render_all(&mut voice, 64);
        assert!(!voice.is_active());
        assert_eq!(first[63].left, 1.0);
        assert_eq!(second[35].left, 1.0);
        assert_eq!(second[36].left, 0.0);
    }

    #[test]
    fn empty_window_never_goes_active() {
        let voice = Voice::new(ramp_clip(100), 50, 0, 1.0, 0.0);
        assert!(!voice.is_active());
    }

    #[test]
    fn start_past_buffer_is_inert() {
        let voice = Voice::new(ramp_clip(100), 200, 50, 1.0, 0.0);
        assert!(!voice.is_active());
    }
}
