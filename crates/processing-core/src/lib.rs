//! Reframe Processing Core — The Crop Engine
//!
//! Turns per-frame face detections into a jitter-free horizontal crop track:
//! - **Detector Adapter:** One raw subject center per frame, with persistence fallback
//! - **Center Track Builder:** Edge-aware centered moving average over the raw track
//! - **Crop Window Solver:** Fixed-size, in-bounds crop window per frame
//!
//! This crate is pure computation: no decoding, no encoding, no file I/O.
//! All inputs are data; all outputs are data.

pub mod center_track;
pub mod crop_solver;
pub mod detector;
pub mod frame;
pub mod pipeline;

pub use center_track::{smooth_centers, CenterTrackBuilder, SmoothingWindow};
pub use crop_solver::{CropDimensions, CropWindowSolver};
pub use detector::{DetectorAdapter, FaceDetector, RecordedDetector};
pub use frame::{Frame, FrameGeometry};
pub use pipeline::{
    build_crop_track_from_detections, run_clips, ClipOutcome, CropTracker, TrackerSettings,
};
