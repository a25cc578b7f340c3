//! Face detections and recorded detection streams.
//!
//! A detection stream is JSONL: a `#`-prefixed header line describing the
//! frame geometry, then one object per frame that had any detections.
//! Frames missing from the stream simply had no faces.
//!
//! ```text
//! # {"schema_version":"1.0","frame_width":1920,"frame_height":1080,"fps":30.0,"frame_count":3}
//! {"frame":0,"faces":[{"xmin":0.45,"width":0.1,"score":0.93}]}
//! {"frame":2,"faces":[]}
//! ```

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Current detection stream schema version.
pub const DETECTION_SCHEMA_VERSION: &str = "1.0";

/// A face bounding box in coordinates normalized to the frame width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Left edge, normalized. Detectors may report slightly negative values
    /// for faces cut off by the frame edge.
    pub xmin: f64,

    /// Box width, normalized.
    pub width: f64,

    /// Detector confidence in `[0, 1]`.
    #[serde(default = "default_score")]
    pub score: f32,
}

fn default_score() -> f32 {
    1.0
}

impl Detection {
    pub fn new(xmin: f64, width: f64, score: f32) -> Self {
        Self { xmin, width, score }
    }

    /// Build a detection from its normalized center instead of its left edge.
    pub fn centered(center_x: f64, width: f64, score: f32) -> Self {
        Self::new(center_x - width / 2.0, width, score)
    }

    /// Horizontal box center, normalized (`xmin + width / 2`).
    pub fn center_x_normalized(&self) -> f64 {
        self.xmin + self.width / 2.0
    }
}

/// All detections reported for one frame, in detector output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame: usize,

    #[serde(default)]
    pub faces: Vec<Detection>,
}

/// Header line of a detection stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Source frame dimensions in pixels.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Source frame rate.
    pub fps: f64,

    /// Number of decoded frames in the source.
    pub frame_count: usize,
}

impl DetectionStreamHeader {
    /// Source duration implied by the frame count and rate.
    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// A parsed detection stream.
///
/// Only frames that had detections are stored, so memory follows the size of
/// the input rather than the frame count its header claims.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionStream {
    pub header: DetectionStreamHeader,

    /// Detections keyed by frame index. A missing frame had no faces.
    pub frames: BTreeMap<usize, Vec<Detection>>,
}

impl DetectionStream {
    /// Detections of one frame, in detector output order.
    pub fn faces(&self, frame: usize) -> &[Detection] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One entry per frame of `range`, clipped to the header's frame count.
    pub fn frames_in(&self, range: Range<usize>) -> Vec<Vec<Detection>> {
        let end = range.end.min(self.header.frame_count);
        let start = range.start.min(end);
        (start..end).map(|frame| self.faces(frame).to_vec()).collect()
    }

    /// Number of frames with at least one detection.
    pub fn detected_frames(&self) -> usize {
        self.frames.values().filter(|faces| !faces.is_empty()).count()
    }
}

/// Parse a detection stream from JSONL content.
pub fn parse_detection_stream(jsonl: &str) -> Result<DetectionStream, ModelError> {
    let mut lines = jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let header_line = lines
        .next()
        .and_then(|line| line.strip_prefix('#'))
        .ok_or_else(|| ModelError::invalid_stream("missing '#' header line"))?;
    let header: DetectionStreamHeader = serde_json::from_str(header_line.trim())
        .map_err(|e| ModelError::invalid_stream(format!("bad header: {e}")))?;

    let mut frames: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
    for (line_no, line) in lines.enumerate() {
        if line.starts_with('#') {
            continue;
        }
        let entry: FrameDetections = serde_json::from_str(line).map_err(|e| {
            ModelError::invalid_stream(format!("bad record on line {}: {e}", line_no + 2))
        })?;
        if entry.frame >= header.frame_count {
            return Err(ModelError::invalid_stream(format!(
                "frame {} outside declared frame_count {}",
                entry.frame, header.frame_count
            )));
        }
        if !entry.faces.is_empty() {
            frames.entry(entry.frame).or_default().extend(entry.faces);
        }
    }

    Ok(DetectionStream { header, frames })
}

/// Load a detection stream from a JSONL file.
pub fn load_detection_stream(path: impl AsRef<Path>) -> Result<DetectionStream, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_detection_stream(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# {\"schema_version\":\"1.0\",\"frame_width\":1920,\"frame_height\":1080,\"fps\":30.0,\"frame_count\":4}\n\
        {\"frame\":0,\"faces\":[{\"xmin\":0.45,\"width\":0.1,\"score\":0.9}]}\n\
        \n\
        {\"frame\":2,\"faces\":[{\"xmin\":0.1,\"width\":0.2},{\"xmin\":0.7,\"width\":0.1,\"score\":0.6}]}\n";

    #[test]
    fn test_center_of_box() {
        let det = Detection::new(0.45, 0.1, 0.9);
        assert!((det.center_x_normalized() - 0.5).abs() < 1e-12);
        let centered = Detection::centered(0.5, 0.1, 0.9);
        assert!((centered.xmin - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_parse_fills_missing_frames() {
        let stream = parse_detection_stream(SAMPLE).unwrap();
        assert_eq!(stream.header.frame_width, 1920);
        let frames = stream.frames_in(0..4);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].len(), 1);
        assert!(frames[1].is_empty());
        assert_eq!(frames[2].len(), 2);
        assert!(frames[3].is_empty());
        assert_eq!(stream.detected_frames(), 2);
    }

    #[test]
    fn test_missing_score_defaults_to_one() {
        let stream = parse_detection_stream(SAMPLE).unwrap();
        assert_eq!(stream.faces(2)[0].score, 1.0);
        // Detector output order is preserved.
        assert!((stream.faces(2)[1].xmin - 0.7).abs() < 1e-12);
        assert!(stream.faces(1).is_empty());
    }

    #[test]
    fn test_rejects_missing_header() {
        let err = parse_detection_stream("{\"frame\":0,\"faces\":[]}\n").unwrap_err();
        assert!(matches!(err, ModelError::InvalidStream { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_frame() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"frame_width\":640,\"frame_height\":360,\"fps\":25.0,\"frame_count\":2}\n\
            {\"frame\":5,\"faces\":[]}\n";
        assert!(parse_detection_stream(jsonl).is_err());
    }

    #[test]
    fn test_huge_declared_frame_count_is_not_allocated() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"frame_width\":640,\"frame_height\":360,\"fps\":25.0,\"frame_count\":1000000000000000000}\n\
            {\"frame\":3,\"faces\":[{\"xmin\":0.25,\"width\":0.125}]}\n\
            {\"frame\":999999999999,\"faces\":[{\"xmin\":0.5,\"width\":0.125}]}\n";
        let stream = parse_detection_stream(jsonl).unwrap();
        assert_eq!(stream.frames.len(), 2);
        assert_eq!(stream.detected_frames(), 2);
        assert_eq!(stream.faces(999_999_999_999).len(), 1);

        let head = stream.frames_in(0..5);
        assert_eq!(head.len(), 5);
        assert_eq!(head[3].len(), 1);
    }

    #[test]
    fn test_frames_in_clips_to_frame_count() {
        let stream = parse_detection_stream(SAMPLE).unwrap();
        assert_eq!(stream.frames_in(1..3).len(), 2);
        assert_eq!(stream.frames_in(3..10).len(), 1);
        assert!(stream.frames_in(8..10).is_empty());
        assert!((stream.header.duration_secs() - 4.0 / 30.0).abs() < 1e-12);
    }
}
