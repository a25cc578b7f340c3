//! Clip specifications produced by the upstream content analysis.
//!
//! The analysis stage emits a JSON list of clip records. Records may carry
//! numeric `start_seconds`/`end_seconds` or `"MM:SS"`/`"HH:MM:SS"` strings in
//! `start_time`/`end_time`; both forms normalize to [`ClipSpec`].

use std::ops::Range;
use std::path::Path;

use reframe_common::FrameClock;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Maximum number of label characters used in an output file stem.
const STEM_LABEL_CHARS: usize = 30;

/// A source time range selected for output. Read-only to the crop engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClipRecord")]
pub struct ClipSpec {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub label: String,
    pub score: f64,
}

/// Wire form accepted from the analysis stage.
#[derive(Debug, Deserialize)]
struct ClipRecord {
    #[serde(default)]
    start_seconds: Option<f64>,
    #[serde(default)]
    end_seconds: Option<f64>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default, alias = "summary")]
    label: Option<String>,
    #[serde(default, alias = "virality_score")]
    score: Option<f64>,
}

impl TryFrom<ClipRecord> for ClipSpec {
    type Error = ModelError;

    fn try_from(record: ClipRecord) -> Result<Self, Self::Error> {
        let start = resolve_time(record.start_seconds, record.start_time.as_deref(), "start")?;
        let end = resolve_time(record.end_seconds, record.end_time.as_deref(), "end")?;
        ClipSpec::new(
            start,
            end,
            record.label.unwrap_or_default(),
            record.score.unwrap_or(0.0),
        )
    }
}

fn resolve_time(seconds: Option<f64>, text: Option<&str>, which: &str) -> Result<f64, ModelError> {
    match (seconds, text) {
        (Some(secs), _) => Ok(secs),
        (None, Some(text)) => parse_timestamp(text),
        (None, None) => Err(ModelError::invalid_clip(format!("missing {which} time"))),
    }
}

impl ClipSpec {
    /// Create a clip spec; times must be finite.
    ///
    /// Negative or inverted ranges are kept as produced upstream and dropped
    /// later by [`select_clips`], so one bad record never rejects the list.
    pub fn new(
        start_seconds: f64,
        end_seconds: f64,
        label: impl Into<String>,
        score: f64,
    ) -> Result<Self, ModelError> {
        if !start_seconds.is_finite() || !end_seconds.is_finite() {
            return Err(ModelError::invalid_clip("clip times must be finite"));
        }
        Ok(Self {
            start_seconds,
            end_seconds,
            label: label.into(),
            score,
        })
    }

    /// Length of the clip in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Parse `"SS"`, `"MM:SS"` or `"HH:MM:SS"` into seconds.
///
/// The last component may be fractional.
pub fn parse_timestamp(text: &str) -> Result<f64, ModelError> {
    let malformed = || ModelError::invalid_clip(format!("malformed timestamp '{text}'"));

    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(malformed());
    }

    let (last, leading) = parts.split_last().ok_or_else(malformed)?;
    let seconds: f64 = last.trim().parse().map_err(|_| malformed())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(malformed());
    }

    let mut total = 0.0;
    for part in leading {
        let value: u32 = part.trim().parse().map_err(|_| malformed())?;
        total = total * 60.0 + value as f64;
    }
    Ok(total * 60.0 + seconds)
}

/// Parse a clip list from JSON, tolerating a surrounding Markdown code fence.
pub fn parse_clips(json: &str) -> Result<Vec<ClipSpec>, serde_json::Error> {
    let trimmed = json
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed)
}

/// Load a clip list from a JSON file.
pub fn load_clips(path: impl AsRef<Path>) -> Result<Vec<ClipSpec>, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_clips(&content).map_err(|e| ModelError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// A clip that survived selection, clamped to the source and mapped to frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedClip {
    /// 1-based position of the clip in the original list.
    pub ordinal: usize,

    /// The clip as produced upstream.
    pub spec: ClipSpec,

    /// Start after clamping to the source.
    pub start_seconds: f64,

    /// End after clamping to the source.
    pub end_seconds: f64,

    /// Source frames covered by the clamped range.
    pub frames: Range<usize>,
}

impl SelectedClip {
    /// Number of source frames in the clip.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// File stem for the rendered clip, e.g. `reel_2_The_secret_to_success`.
    pub fn output_stem(&self) -> String {
        let label: String = self
            .spec
            .label
            .chars()
            .take(STEM_LABEL_CHARS)
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                other => other,
            })
            .collect();
        format!("reel_{}_{}", self.ordinal, label)
    }
}

/// Clamp clips to `[0, source_duration]` and drop those that are empty,
/// inverted, or shorter than `min_duration_secs` afterwards. Input order is
/// preserved.
pub fn select_clips(
    clips: &[ClipSpec],
    source_duration_secs: f64,
    min_duration_secs: f64,
    clock: &FrameClock,
) -> Vec<SelectedClip> {
    clips
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| {
            let start = spec.start_seconds.max(0.0);
            let end = spec.end_seconds.min(source_duration_secs);
            if end <= start || end - start < min_duration_secs {
                return None;
            }
            Some(SelectedClip {
                ordinal: i + 1,
                spec: spec.clone(),
                start_seconds: start,
                end_seconds: end,
                frames: clock.frame_range(start, end),
            })
        })
        .collect()
}
