//! Crop windows and per-clip crop plans.
//!
//! Crop windows are integer pixels in source-frame space. A plan holds one
//! window per frame of a clip and is what a renderer consumes frame by frame.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clip::ClipSpec;
use crate::error::ModelError;
use crate::ratio::AspectRatio;

/// Current crop plan schema version.
pub const PLAN_SCHEMA_VERSION: &str = "1.0";

/// The horizontal slice of a source frame kept in the output.
///
/// The crop always spans the full height chosen for the clip; only `x`
/// varies between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropWindow {
    /// Left edge in pixels.
    pub x: u32,
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
}

impl CropWindow {
    pub fn new(x: u32, width: u32, height: u32) -> Self {
        Self { x, width, height }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Whether the window lies entirely inside a frame of `frame_width` pixels.
    pub fn fits_within(&self, frame_width: u32) -> bool {
        self.right() <= frame_width as u64
    }
}

/// The crop windows for every frame of one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPlan {
    /// Schema version.
    pub version: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// The clip this plan was built for, when known.
    #[serde(default)]
    pub clip: Option<ClipSpec>,

    /// Source frame dimensions.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Frame rate of the clip.
    pub fps: f64,

    /// Aspect ratio the windows were derived for.
    pub target_ratio: AspectRatio,

    /// One window per frame, in frame order.
    pub windows: Vec<CropWindow>,
}

impl CropPlan {
    /// Create a plan stamped with the current time.
    pub fn new(
        frame_width: u32,
        frame_height: u32,
        fps: f64,
        target_ratio: AspectRatio,
        windows: Vec<CropWindow>,
    ) -> Self {
        Self {
            version: PLAN_SCHEMA_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            clip: None,
            frame_width,
            frame_height,
            fps,
            target_ratio,
            windows,
        }
    }

    /// Attach the clip this plan belongs to.
    pub fn with_clip(mut self, clip: ClipSpec) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Number of frames covered.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Window to use at `secs` from the start of the clip.
    ///
    /// The frame index is `floor(secs * fps)`, clamped to the last frame so
    /// that a renderer asking for the final timestamp still gets a window.
    pub fn window_at(&self, secs: f64) -> Option<CropWindow> {
        let last = self.windows.len().checked_sub(1)?;
        let index = if secs <= 0.0 || self.fps <= 0.0 {
            0
        } else {
            ((secs * self.fps).floor() as usize).min(last)
        };
        self.windows.get(index).copied()
    }

    /// Leftmost and rightmost `x` across the plan.
    pub fn x_range(&self) -> Option<(u32, u32)> {
        let min = self.windows.iter().map(|w| w.x).min()?;
        let max = self.windows.iter().map(|w| w.x).max()?;
        Some((min, max))
    }

    /// Check the plan's invariants: every window inside the frame, and one
    /// width and height shared by all windows.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ModelError::invalid_plan(format!(
                "frame dimensions must be positive, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }

        let Some(first) = self.windows.first() else {
            return Ok(());
        };

        for (i, window) in self.windows.iter().enumerate() {
            if !window.fits_within(self.frame_width) {
                return Err(ModelError::invalid_plan(format!(
                    "frame {i}: window [{}, {}) exceeds frame width {}",
                    window.x,
                    window.right(),
                    self.frame_width
                )));
            }
            if window.height > self.frame_height {
                return Err(ModelError::invalid_plan(format!(
                    "frame {i}: window height {} exceeds frame height {}",
                    window.height, self.frame_height
                )));
            }
            if window.width != first.width || window.height != first.height {
                return Err(ModelError::invalid_plan(format!(
                    "frame {i}: window size {}x{} differs from {}x{}",
                    window.width, window.height, first.width, first.height
                )));
            }
        }
        Ok(())
    }

    /// Load a plan from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ModelError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save the plan as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ModelError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ModelError::SerializeError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ModelError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
