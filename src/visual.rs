// Waveform geometry for the front-end. point_series is the full-resolution
// canvas mapping; column_peaks is the coarse reduction a terminal cell row
// can actually show.

use crate::audio::ClipBuffer;

// Per-sample points: x spread over `width`, y = (1 + sample) * height / 2.
pub fn point_series(clip: &ClipBuffer, width: f32, height: f32) -> Vec<(f32, f32)> {
    let n = clip.data.len();
    if n == 0 {
        return Vec::new();
    }
    let denom = (n - 1).max(1) as f32;
    clip.data
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let x = i as f32 / denom * width;
            let y = (1.0 + frame.left) * height / 2.0;
            (x, y)
        })
        .collect()
}

// Absolute peak per column, clamped to [0, 1].
pub fn column_peaks(clip: &ClipBuffer, columns: usize) -> Vec<f32> {
    if columns == 0 {
        return Vec::new();
    }
    if clip.data.is_empty() {
        return vec![0.0; columns];
    }
    let chunk = clip.data.len().div_ceil(columns);
    let mut out = vec![0.0f32; columns];
    for (i, frames) in clip.data.chunks(chunk).enumerate().take(columns) {
        out[i] = frames
            .iter()
            .map(|f| f.left.abs().max(f.right.abs()))
            .fold(0.0, f32::max)
            .min(1.0);
    }
    out
}

// Trim marker cells for an overlay `width` cells wide. Everything before
// the first and from the second onward is outside the played region.
pub fn trim_overlay(start: f32, end: f32, duration: f32, width: usize) -> (usize, usize) {
    if duration <= 0.0 || width == 0 {
        return (0, width);
    }
    let to_cell = |t: f32| ((t / duration) * width as f32).round() as usize;
    (to_cell(start).min(width), to_cell(end).min(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StereoFrame;

    fn clip_of(samples: &[f32]) -> ClipBuffer {
        ClipBuffer::new(samples.iter().map(|&s| StereoFrame::splat(s)).collect(), 1000)
    }

    #[test]
    fn point_series_maps_amplitude_to_canvas_y() {
        let clip = clip_of(&[-1.0, 0.0, 1.0]);
        let points = point_series(&clip, 100.0, 50.0);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (0.0, 0.0));
        assert_eq!(points[1], (50.0, 25.0));
        assert_eq!(points[2], (100.0, 50.0));
    }

    #[test]
    fn point_series_of_empty_clip_is_empty() {
        assert!(point_series(&clip_of(&[]), 100.0, 50.0).is_empty());
    }

    #[test]
    fn column_peaks_tracks_the_loudest_sample() {
        let clip = clip_of(&[0.1, 0.9, 0.0, -0.4]);
        let peaks = column_peaks(&clip, 2);
        assert_eq!(peaks, vec![0.9, 0.4]);
    }

    #[test]
    fn column_peaks_pads_short_clips_with_silence() {
        let clip = clip_of(&[0.5]);
        let peaks = column_peaks(&clip, 4);
        assert_eq!(peaks.len(), 4);
        assert_eq!(peaks[0], 0.5);
        assert!(peaks[1..].iter().all(|&p| p == 0.0));
    }

    #[test]
    fn trim_overlay_positions_scale_with_duration() {
        assert_eq!(trim_overlay(0.5, 1.5, 2.0, 100), (25, 75));
        assert_eq!(trim_overlay(0.0, 2.0, 2.0, 100), (0, 100));
    }

    #[test]
    fn trim_overlay_of_empty_clip_spans_everything() {
        assert_eq!(trim_overlay(0.0, 0.0, 0.0, 64), (0, 64));
    }
}
