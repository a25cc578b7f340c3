//! Frame clock utilities.
//!
//! Every clip is processed at a single, caller-supplied frame rate. This
//! module converts between:
//! - Seconds on the source timeline and 0-based frame indices
//! - Durations and frame counts
//! - Time-based parameters (e.g. a smoothing window in seconds) and frames

use std::ops::Range;

use crate::error::{ReframeError, ReframeResult};

/// A constant-rate clock over decoded video frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f64,
}

impl FrameClock {
    /// Create a clock for the given frame rate.
    ///
    /// The rate must be finite and strictly positive.
    pub fn new(fps: f64) -> ReframeResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ReframeError::config(format!(
                "frame rate must be a positive number, got {fps}"
            )));
        }
        Ok(Self { fps })
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Index of the frame displayed at `secs` (`floor(secs * fps)`).
    /// Negative times map to frame 0.
    pub fn frame_at_secs(&self, secs: f64) -> usize {
        if secs <= 0.0 {
            return 0;
        }
        (secs * self.fps).floor() as usize
    }

    /// Presentation time of a frame index, in seconds.
    pub fn secs_at_frame(&self, index: usize) -> f64 {
        index as f64 / self.fps
    }

    /// Number of whole frames in a duration.
    pub fn frame_count(&self, duration_secs: f64) -> usize {
        self.frame_at_secs(duration_secs)
    }

    /// Half-open frame range covering `[start_secs, end_secs)`.
    pub fn frame_range(&self, start_secs: f64, end_secs: f64) -> Range<usize> {
        let start = self.frame_at_secs(start_secs);
        let end = self.frame_at_secs(end_secs).max(start);
        start..end
    }

    /// Convert a duration in seconds to a frame count of at least one.
    pub fn secs_to_frames(&self, secs: f64) -> usize {
        if !secs.is_finite() || secs <= 0.0 {
            return 1;
        }
        ((secs * self.fps).round() as usize).max(1)
    }
}
