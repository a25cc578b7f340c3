//! Center Track Builder.
//!
//! Smooths the raw per-frame subject centers with a centered moving average.
//! Near the ends of a clip the window shrinks instead of being padded, so the
//! track is never pulled toward zero at the first or last frames.

use rayon::prelude::*;
use reframe_common::FrameClock;
use serde::{Deserialize, Serialize};

/// Smoothing window, either in frames or in seconds of video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingWindow {
    /// A fixed number of frames. Zero disables smoothing.
    Frames(usize),

    /// A duration converted with the clip's frame rate.
    Seconds(f64),
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        // 0.5s at 30fps
        Self::Frames(15)
    }
}

impl SmoothingWindow {
    /// Window length in frames for a clip running at `clock`'s rate.
    pub fn frames(&self, clock: &FrameClock) -> usize {
        match *self {
            Self::Frames(frames) => frames.max(1),
            Self::Seconds(secs) => clock.secs_to_frames(secs),
        }
    }
}

/// Builds the smoothed center track of a clip.
#[derive(Debug, Clone, Copy)]
pub struct CenterTrackBuilder {
    window: usize,
}

impl CenterTrackBuilder {
    /// Create a builder; a window of 0 behaves like 1 (passthrough).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    /// Resolve a window specification against a clip's frame rate.
    pub fn for_clip(window: SmoothingWindow, clock: &FrameClock) -> Self {
        Self::new(window.frames(clock))
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Smooth a raw center track. Output length always equals input length.
    pub fn build(&self, raw: &[u32]) -> Vec<u32> {
        smooth_centers(raw, self.window)
    }
}

/// Centered moving average with edge clipping.
///
/// Frame `i` averages `raw[max(0, i - w/2) .. min(N, i - w/2 + w)]`, i.e. a
/// `w`-frame window around `i` that shrinks at the sequence edges. The mean is
/// truncated toward zero. `window == 0` is treated as 1.
pub fn smooth_centers(raw: &[u32], window: usize) -> Vec<u32> {
    let n = raw.len();
    if n == 0 {
        return Vec::new();
    }

    let window = window.max(1);
    let half = window / 2;
    let ahead = window - half;

    // prefix[k] = raw[0] + .. + raw[k - 1]
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0u64);
    let mut running = 0u64;
    for &center in raw {
        running += center as u64;
        prefix.push(running);
    }

    (0..n)
        .into_par_iter()
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = i.saturating_add(ahead).min(n);
            let sum = prefix[end] - prefix[start];
            (sum / (end - start) as u64) as u32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_edges_use_shrunken_window() {
        let raw = [0, 100, 200, 300, 400];
        let smoothed = smooth_centers(&raw, 3);
        // Index 0 averages [0, 100], not a zero-padded [_, 0, 100].
        assert_eq!(smoothed, vec![50, 100, 200, 300, 350]);
    }

    #[test]
    fn test_window_of_one_is_passthrough() {
        let raw = [5, 900, 13, 1200];
        assert_eq!(smooth_centers(&raw, 1), raw.to_vec());
        assert_eq!(smooth_centers(&raw, 0), raw.to_vec());
    }

    #[test]
    fn test_even_window() {
        // w = 4: window [i - 2, i + 2)
        let raw = [0, 40, 80, 120, 160];
        assert_eq!(smooth_centers(&raw, 4), vec![20, 40, 60, 100, 120]);
    }

    #[test]
    fn test_window_larger_than_track() {
        let raw = [10, 20, 31];
        assert_eq!(smooth_centers(&raw, 99), vec![20, 20, 20]);
        assert_eq!(smooth_centers(&raw, usize::MAX), vec![20, 20, 20]);
    }

    #[test]
    fn test_mean_is_truncated() {
        assert_eq!(smooth_centers(&[1, 2], 2), vec![1, 1]);
    }

    #[test]
    fn test_empty_track() {
        assert!(smooth_centers(&[], 15).is_empty());
    }

    #[test]
    fn test_window_from_seconds() {
        let clock = FrameClock::new(30.0).unwrap();
        assert_eq!(SmoothingWindow::Seconds(0.5).frames(&clock), 15);
        assert_eq!(SmoothingWindow::Frames(0).frames(&clock), 1);
        let huge = CenterTrackBuilder::for_clip(SmoothingWindow::Frames(usize::MAX), &clock);
        assert_eq!(huge.build(&[0, 30, 60]), vec![30, 30, 30]);
        let builder = CenterTrackBuilder::for_clip(SmoothingWindow::default(), &clock);
        assert_eq!(builder.window(), 15);
    }

    proptest! {
        #[test]
        fn prop_smoothing_stays_within_window_bounds(
            raw in prop::collection::vec(0u32..4096, 0..200),
            window in 0usize..40,
        ) {
            let smoothed = smooth_centers(&raw, window);
            prop_assert_eq!(smoothed.len(), raw.len());

            let w = window.max(1);
            let half = w / 2;
            for (i, &value) in smoothed.iter().enumerate() {
                let start = i.saturating_sub(half);
                let end = (i + w - half).min(raw.len());
                let lo = *raw[start..end].iter().min().unwrap();
                let hi = *raw[start..end].iter().max().unwrap();
                prop_assert!(lo <= value && value <= hi);
            }
        }

        #[test]
        fn prop_smoothing_is_deterministic(
            raw in prop::collection::vec(0u32..4096, 0..200),
            window in 0usize..40,
        ) {
            prop_assert_eq!(smooth_centers(&raw, window), smooth_centers(&raw, window));
        }
    }
}
