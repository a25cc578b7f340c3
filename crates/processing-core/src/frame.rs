//! Decoded frames handed to the crop engine.

use std::sync::Arc;

use reframe_common::{ReframeError, ReframeResult};

/// Bytes per pixel of a packed RGB24 buffer.
const RGB_CHANNELS: usize = 3;

/// Pixel dimensions shared by every frame of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    /// Create a geometry; both dimensions must be positive.
    pub fn new(width: u32, height: u32) -> ReframeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReframeError::invalid_frame(
                0,
                format!("non-positive dimensions {width}x{height}"),
            ));
        }
        Ok(Self { width, height })
    }

    /// The horizontal center, used to seed the center track.
    pub fn center_x(&self) -> u32 {
        self.width / 2
    }
}

/// One decoded video frame as packed RGB24.
///
/// The pixel buffer is shared so that frames can be handed to detection
/// workers without copying.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 0-based index within the clip.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl Frame {
    /// Wrap an RGB24 buffer. Call [`Frame::validate`] before trusting it.
    pub fn rgb(index: usize, width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            index,
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// An all-black frame, mostly useful for detectors that ignore pixels.
    pub fn blank(index: usize, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * RGB_CHANNELS;
        Self::rgb(index, width, height, vec![0u8; len])
    }

    /// Fail with `InvalidFrame` on zero dimensions or a buffer whose length
    /// does not match `width * height * 3`.
    pub fn validate(&self) -> ReframeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReframeError::invalid_frame(
                self.index,
                format!("non-positive dimensions {}x{}", self.width, self.height),
            ));
        }
        let expected = self.width as usize * self.height as usize * RGB_CHANNELS;
        if self.pixels.len() != expected {
            return Err(ReframeError::invalid_frame(
                self.index,
                format!(
                    "pixel buffer holds {} bytes, expected {expected} for {}x{} RGB",
                    self.pixels.len(),
                    self.width,
                    self.height
                ),
            ));
        }
        Ok(())
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_is_valid() {
        let frame = Frame::blank(0, 64, 36);
        assert!(frame.validate().is_ok());
        assert_eq!(frame.pixels.len(), 64 * 36 * 3);
    }

    #[test]
    fn test_zero_width_is_invalid() {
        let frame = Frame::rgb(4, 0, 36, Vec::<u8>::new());
        match frame.validate() {
            Err(ReframeError::InvalidFrame { index, .. }) => assert_eq!(index, 4),
            other => panic!("expected InvalidFrame, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_buffer_is_invalid() {
        let frame = Frame::rgb(1, 4, 4, vec![0u8; 10]);
        assert!(matches!(
            frame.validate(),
            Err(ReframeError::InvalidFrame { index: 1, .. })
        ));
    }

    #[test]
    fn test_geometry() {
        assert!(FrameGeometry::new(0, 1080).is_err());
        let geometry = FrameGeometry::new(1920, 1080).unwrap();
        assert_eq!(geometry.center_x(), 960);
        assert_eq!(Frame::blank(0, 1920, 1080).geometry(), geometry);
    }
}
