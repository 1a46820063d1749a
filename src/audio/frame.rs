// The smallest unit of audio; one stereo frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    // same sample on both channels, for mono sources
    pub fn splat(sample: f32) -> Self {
        Self {
            left: sample,
            right: sample,
        }
    }
}
