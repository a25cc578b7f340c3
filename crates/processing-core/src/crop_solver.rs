//! Crop Window Solver.
//!
//! Derives the crop size once per clip from the frame size and target aspect
//! ratio, then places a window around each smoothed center, clamped so it
//! never leaves the source frame.

use rayon::prelude::*;
use reframe_clip_model::{AspectRatio, CropWindow};
use reframe_common::{ReframeError, ReframeResult};

use crate::frame::FrameGeometry;

/// Crop size shared by every frame of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropDimensions {
    pub width: u32,
    pub height: u32,
}

impl CropDimensions {
    /// Largest crop of the target ratio that fits the frame.
    ///
    /// Full height is preferred (`width = floor(H * r)`). When that is wider
    /// than the frame, full width is used instead (`height = floor(W / r)`).
    /// If that is somehow taller than the frame too, the full-height size is
    /// kept even though it cannot honor the ratio exactly.
    pub fn derive(geometry: FrameGeometry, ratio: AspectRatio) -> Self {
        let (w, h) = (geometry.width as u64, geometry.height as u64);
        let (rw, rh) = (ratio.width as u64, ratio.height as u64);

        // Integer arithmetic gives exact floors for any ratio.
        let full_height = Self {
            width: (h * rw / rh) as u32,
            height: geometry.height,
        };
        if full_height.width <= geometry.width {
            return full_height;
        }

        let full_width = Self {
            width: geometry.width,
            height: (w * rh / rw) as u32,
        };
        if full_width.height <= geometry.height {
            return full_width;
        }

        full_height
    }
}

/// Places per-frame crop windows for one clip.
#[derive(Debug, Clone, Copy)]
pub struct CropWindowSolver {
    geometry: FrameGeometry,
    dimensions: CropDimensions,
}

impl CropWindowSolver {
    pub fn new(geometry: FrameGeometry, ratio: AspectRatio) -> Self {
        let dimensions = CropDimensions::derive(geometry, ratio);
        tracing::debug!(
            frame_width = geometry.width,
            frame_height = geometry.height,
            crop_width = dimensions.width,
            crop_height = dimensions.height,
            %ratio,
            "Derived crop dimensions"
        );
        Self {
            geometry,
            dimensions,
        }
    }

    pub fn dimensions(&self) -> CropDimensions {
        self.dimensions
    }

    /// Window centered on `center`, clamped low first, then high.
    pub fn place(&self, center: u32) -> CropWindow {
        let half = (self.dimensions.width / 2) as i64;
        let max_x = self.geometry.width.saturating_sub(self.dimensions.width) as i64;

        let x = center as i64 - half;
        let x = x.max(0);
        let x = x.min(max_x);

        CropWindow::new(x as u32, self.dimensions.width, self.dimensions.height)
    }

    /// One window per smoothed center.
    ///
    /// Fails with `LengthMismatch` when the track length differs from
    /// `frame_count`.
    pub fn solve(&self, smoothed: &[u32], frame_count: usize) -> ReframeResult<Vec<CropWindow>> {
        if smoothed.len() != frame_count {
            return Err(ReframeError::length_mismatch(frame_count, smoothed.len()));
        }
        Ok(smoothed.par_iter().map(|&center| self.place(center)).collect())
    }
}
