//! Detector Adapter.
//!
//! Wraps a black-box face detector and reduces its output to one raw
//! subject center per frame. The work is split in two passes:
//!
//! 1. **Detection** — every frame independently, in parallel, yielding
//!    `Some(center)` or `None` when no usable face was found.
//! 2. **Resolution** — a sequential fold in frame order that fills each `None`
//!    with the previous frame's center (seeded with the frame center).
//!
//! A frame without faces is the normal case, not an error. Only frames that
//! cannot be decoded fail, with `InvalidFrame`.

use rayon::prelude::*;
use reframe_clip_model::Detection;
use reframe_common::{ReframeError, ReframeResult};

use crate::frame::{Frame, FrameGeometry};

/// A per-frame face detector.
///
/// Implementations return zero or more detections in their own output
/// order. Detection failures are reported as an empty vector.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame, min_confidence: f32) -> Vec<Detection>;
}

impl<F> FaceDetector for F
where
    F: Fn(&Frame, f32) -> Vec<Detection> + Send + Sync,
{
    fn detect(&self, frame: &Frame, min_confidence: f32) -> Vec<Detection> {
        self(frame, min_confidence)
    }
}

/// Replays detections recorded ahead of time, keyed by frame index.
#[derive(Debug, Clone, Default)]
pub struct RecordedDetector {
    frames: Vec<Vec<Detection>>,
}

impl RecordedDetector {
    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self { frames }
    }
}

impl FaceDetector for RecordedDetector {
    fn detect(&self, frame: &Frame, min_confidence: f32) -> Vec<Detection> {
        self.frames
            .get(frame.index)
            .map(|faces| {
                faces
                    .iter()
                    .filter(|d| d.score >= min_confidence)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Pick the frame's subject center from raw detections.
///
/// The first detection (in detector order) scoring at least `min_confidence`
/// wins; size and confidence are not used to break ties. Its normalized
/// center is scaled by the frame width, truncated, and kept in
/// `[0, frame_width)`.
pub fn select_center(faces: &[Detection], frame_width: u32, min_confidence: f32) -> Option<u32> {
    let face = faces.iter().find(|d| d.score >= min_confidence)?;
    let pixel = (face.center_x_normalized() * frame_width as f64) as i64;
    let max = (frame_width as i64 - 1).max(0);
    Some(pixel.clamp(0, max) as u32)
}

/// Fill gaps in a detected-center sequence with the last known center.
///
/// `initial` stands in for the frame before the first one.
pub fn resolve_centers(detected: &[Option<u32>], initial: u32) -> Vec<u32> {
    detected
        .iter()
        .scan(initial, |last, center| {
            if let Some(center) = center {
                *last = *center;
            }
            Some(*last)
        })
        .collect()
}

/// Turns frames into raw centers using a [`FaceDetector`].
#[derive(Debug, Clone)]
pub struct DetectorAdapter<D> {
    detector: D,
    min_confidence: f32,
}

impl<D: FaceDetector> DetectorAdapter<D> {
    /// Wrap a detector; `min_confidence` must lie in `[0, 1]`.
    pub fn new(detector: D, min_confidence: f32) -> ReframeResult<Self> {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ReframeError::config(format!(
                "detector confidence threshold must be within [0, 1], got {min_confidence}"
            )));
        }
        Ok(Self {
            detector,
            min_confidence,
        })
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Detect the subject center of a single frame, or `None` if no face
    /// cleared the threshold.
    pub fn detect_center(&self, frame: &Frame) -> ReframeResult<Option<u32>> {
        frame.validate()?;
        let faces = self.detector.detect(frame, self.min_confidence);
        Ok(select_center(&faces, frame.width, self.min_confidence))
    }

    /// The raw center of `frame`, falling back to `previous` when the
    /// detector finds nothing.
    pub fn center_for(&self, frame: &Frame, previous: u32) -> ReframeResult<u32> {
        Ok(self.detect_center(frame)?.unwrap_or(previous))
    }

    /// Detection pass over all frames. Frames are independent, so this runs
    /// in parallel; output order matches input order.
    pub fn detect_all(&self, frames: &[Frame]) -> ReframeResult<Vec<Option<u32>>> {
        frames
            .par_iter()
            .map(|frame| self.detect_center(frame))
            .collect()
    }

    /// Raw center track for a clip: detection pass, then persistence fallback
    /// seeded with the horizontal center of `geometry`.
    pub fn raw_centers(
        &self,
        frames: &[Frame],
        geometry: FrameGeometry,
    ) -> ReframeResult<Vec<u32>> {
        let detected = self.detect_all(frames)?;
        let hits = detected.iter().filter(|c| c.is_some()).count();
        tracing::debug!(
            frames = frames.len(),
            detected = hits,
            fallback = frames.len() - hits,
            "Detection pass complete"
        );
        Ok(resolve_centers(&detected, geometry.center_x()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_at(center: f64) -> Detection {
        Detection::centered(center, 0.125, 0.9)
    }

    #[test]
    fn test_first_detection_wins() {
        // The second face is larger and more confident but comes later.
        let faces = vec![
            Detection::centered(0.25, 0.125, 0.6),
            Detection::centered(0.75, 0.25, 0.99),
        ];
        assert_eq!(select_center(&faces, 1000, 0.5), Some(250));
    }

    #[test]
    fn test_low_confidence_faces_are_skipped() {
        let faces = vec![
            Detection::centered(0.25, 0.125, 0.2),
            Detection::centered(0.75, 0.125, 0.8),
        ];
        assert_eq!(select_center(&faces, 1000, 0.5), Some(750));
        assert_eq!(select_center(&faces[..1], 1000, 0.5), None);
    }

    #[test]
    fn test_center_is_truncated_and_kept_in_frame() {
        assert_eq!(select_center(&[face_at(0.33333)], 1920, 0.0), Some(639));
        assert_eq!(select_center(&[face_at(1.2)], 1920, 0.0), Some(1919));
        assert_eq!(select_center(&[face_at(-0.1)], 1920, 0.0), Some(0));
        assert_eq!(select_center(&[], 1920, 0.0), None);
    }

    #[test]
    fn test_resolve_persists_last_center() {
        let detected = [Some(100), None, None, None, None, None];
        assert_eq!(
            resolve_centers(&detected, 960),
            vec![100, 100, 100, 100, 100, 100]
        );
    }

    #[test]
    fn test_resolve_seeds_with_initial_and_updates() {
        let detected = [None, None, Some(300), None, Some(50)];
        assert_eq!(resolve_centers(&detected, 960), vec![960, 960, 300, 300, 50]);
        assert!(resolve_centers(&[], 960).is_empty());
    }

    #[test]
    fn test_adapter_fallback_on_missing_detections() {
        // Face only in frame 0, at pixel 100 of an 800px frame.
        let detector = |frame: &Frame, _min: f32| {
            if frame.index == 0 {
                vec![face_at(0.125)]
            } else {
                vec![]
            }
        };
        let adapter = DetectorAdapter::new(detector, 0.5).unwrap();
        let frames: Vec<Frame> = (0..6).map(|i| Frame::blank(i, 800, 4)).collect();
        let geometry = frames[0].geometry();

        let centers = adapter.raw_centers(&frames, geometry).unwrap();
        assert_eq!(centers, vec![100, 100, 100, 100, 100, 100]);
    }

    #[test]
    fn test_adapter_center_for_uses_previous() {
        let nothing = |_: &Frame, _: f32| Vec::<Detection>::new();
        let adapter = DetectorAdapter::new(nothing, 0.5).unwrap();
        let frame = Frame::blank(0, 64, 4);
        assert_eq!(adapter.center_for(&frame, 17).unwrap(), 17);
    }

    #[test]
    fn test_adapter_rejects_undecodable_frame() {
        let adapter = DetectorAdapter::new(|_: &Frame, _: f32| vec![face_at(0.5)], 0.5).unwrap();
        let frames = vec![Frame::blank(0, 64, 4), Frame::rgb(1, 64, 4, vec![0u8; 3])];
        let geometry = frames[0].geometry();
        let err = adapter.raw_centers(&frames, geometry).unwrap_err();
        assert!(matches!(err, ReframeError::InvalidFrame { index: 1, .. }));
    }

    #[test]
    fn test_adapter_rejects_bad_threshold() {
        assert!(DetectorAdapter::new(RecordedDetector::default(), 1.5).is_err());
        assert!(DetectorAdapter::new(RecordedDetector::default(), -0.1).is_err());
    }

    #[test]
    fn test_recorded_detector_replays_by_index() {
        let recorded =
            RecordedDetector::new(vec![vec![face_at(0.5)], vec![], vec![face_at(0.25)]]);
        let adapter = DetectorAdapter::new(recorded, 0.5).unwrap();
        let frames: Vec<Frame> = (0..4).map(|i| Frame::blank(i, 200, 2)).collect();
        let detected = adapter.detect_all(&frames).unwrap();
        // Frame 3 is beyond the recording and has no detections.
        assert_eq!(detected, vec![Some(100), None, Some(50), None]);
    }
}
