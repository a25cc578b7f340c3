//! Reframe Clip Model
//!
//! Defines the data contracts exchanged around the crop engine:
//! - **Clips:** Time ranges selected upstream, with label and score
//! - **Detections:** Per-frame face boxes in normalized coordinates
//! - **Crop plans:** One pixel crop window per frame of a clip
//!
//! Detections are normalized to `[0.0, 1.0]` relative to the frame;
//! crop windows are integer pixels in source-frame space.

pub mod clip;
pub mod crop;
pub mod detection;
pub mod error;
pub mod ratio;

pub use clip::*;
pub use crop::*;
pub use detection::*;
pub use error::*;
pub use ratio::*;
