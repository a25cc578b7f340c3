//! Crop track pipeline.
//!
//! Runs the three stages for one clip, leaves first:
//! detection → center track → crop windows. Nothing is shared between clips,
//! so [`run_clips`] processes them in parallel and isolates their failures.

use rayon::prelude::*;
use reframe_clip_model::{AspectRatio, CropWindow, Detection, SelectedClip};
use reframe_common::{FrameClock, ReframeError, ReframeResult, TrackingDefaults};
use serde::{Deserialize, Serialize};

use crate::center_track::{CenterTrackBuilder, SmoothingWindow};
use crate::crop_solver::CropWindowSolver;
use crate::detector::{resolve_centers, select_center, DetectorAdapter, FaceDetector};
use crate::frame::{Frame, FrameGeometry};

/// Explicit tracking parameters for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Moving-average window over the raw center track.
    pub smoothing: SmoothingWindow,

    /// Detector confidence threshold.
    pub min_confidence: f32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            smoothing: SmoothingWindow::default(),
            min_confidence: 0.5,
        }
    }
}

impl TrackerSettings {
    /// Settings taken from the application config.
    pub fn from_defaults(defaults: &TrackingDefaults) -> Self {
        Self {
            smoothing: SmoothingWindow::Frames(defaults.smoothing_window_frames),
            min_confidence: defaults.min_confidence,
        }
    }
}

/// The crop engine bound to a face detector.
#[derive(Debug, Clone)]
pub struct CropTracker<D> {
    adapter: DetectorAdapter<D>,
    smoothing: SmoothingWindow,
}

impl<D: FaceDetector> CropTracker<D> {
    pub fn new(detector: D, settings: &TrackerSettings) -> ReframeResult<Self> {
        Ok(Self {
            adapter: DetectorAdapter::new(detector, settings.min_confidence)?,
            smoothing: settings.smoothing,
        })
    }

    /// Build one crop window per frame of a clip.
    ///
    /// All frames must share the first frame's dimensions. An empty clip
    /// yields an empty track.
    pub fn build_crop_track(
        &self,
        frames: &[Frame],
        fps: f64,
        target_ratio: AspectRatio,
    ) -> ReframeResult<Vec<CropWindow>> {
        let clock = FrameClock::new(fps)?;
        let Some(first) = frames.first() else {
            return Ok(Vec::new());
        };

        let geometry = FrameGeometry::new(first.width, first.height)
            .map_err(|_| invalid_dimensions(first))?;
        if let Some(odd) = frames.iter().find(|f| f.geometry() != geometry) {
            return Err(ReframeError::invalid_frame(
                odd.index,
                format!(
                    "frame is {}x{} but the clip is {}x{}",
                    odd.width, odd.height, geometry.width, geometry.height
                ),
            ));
        }

        let raw = self.adapter.raw_centers(frames, geometry)?;
        solve_track(&raw, geometry, &clock, target_ratio, self.smoothing)
    }

    /// Track several clips of one source; `load_frames` decodes a clip's
    /// frames. See [`run_clips`].
    pub fn track_clips<L>(
        &self,
        clips: &[SelectedClip],
        fps: f64,
        target_ratio: AspectRatio,
        load_frames: L,
    ) -> Vec<ClipOutcome>
    where
        L: Fn(&SelectedClip) -> ReframeResult<Vec<Frame>> + Sync,
    {
        run_clips(clips, |clip| {
            load_frames(clip).and_then(|frames| self.build_crop_track(&frames, fps, target_ratio))
        })
    }
}

fn invalid_dimensions(frame: &Frame) -> ReframeError {
    ReframeError::invalid_frame(
        frame.index,
        format!("non-positive dimensions {}x{}", frame.width, frame.height),
    )
}

/// Build a crop track from detections recorded ahead of time.
///
/// `detections[i]` holds the detector output for frame `i` of the clip. This
/// is the same pipeline as [`CropTracker::build_crop_track`] with the
/// detection pass already done.
pub fn build_crop_track_from_detections(
    detections: &[Vec<Detection>],
    geometry: FrameGeometry,
    fps: f64,
    target_ratio: AspectRatio,
    settings: &TrackerSettings,
) -> ReframeResult<Vec<CropWindow>> {
    let clock = FrameClock::new(fps)?;
    if !(0.0..=1.0).contains(&settings.min_confidence) {
        return Err(ReframeError::config(format!(
            "detector confidence threshold must be within [0, 1], got {}",
            settings.min_confidence
        )));
    }

    let detected: Vec<Option<u32>> = detections
        .par_iter()
        .map(|faces| select_center(faces, geometry.width, settings.min_confidence))
        .collect();
    let raw = resolve_centers(&detected, geometry.center_x());
    solve_track(&raw, geometry, &clock, target_ratio, settings.smoothing)
}

fn solve_track(
    raw: &[u32],
    geometry: FrameGeometry,
    clock: &FrameClock,
    target_ratio: AspectRatio,
    smoothing: SmoothingWindow,
) -> ReframeResult<Vec<CropWindow>> {
    let builder = CenterTrackBuilder::for_clip(smoothing, clock);
    let smoothed = builder.build(raw);
    tracing::debug!(
        frames = raw.len(),
        window = builder.window(),
        "Smoothed center track"
    );

    CropWindowSolver::new(geometry, target_ratio).solve(&smoothed, raw.len())
}

/// Result of processing one clip.
#[derive(Debug)]
pub struct ClipOutcome {
    pub clip: SelectedClip,
    pub windows: ReframeResult<Vec<CropWindow>>,
}

impl ClipOutcome {
    pub fn is_ok(&self) -> bool {
        self.windows.is_ok()
    }
}

/// Process several clips of one source in parallel.
///
/// `build_track` produces one clip's crop track. A clip whose track fails is
/// reported in its outcome and logged; the other clips are unaffected.
/// Outcomes keep the order of `clips`.
pub fn run_clips<F>(clips: &[SelectedClip], build_track: F) -> Vec<ClipOutcome>
where
    F: Fn(&SelectedClip) -> ReframeResult<Vec<CropWindow>> + Sync,
{
    clips
        .par_iter()
        .map(|clip| {
            let windows = build_track(clip);
            match &windows {
                Ok(windows) => tracing::info!(
                    clip = clip.ordinal,
                    frames = windows.len(),
                    "Built crop track"
                ),
                Err(e) => tracing::warn!(clip = clip.ordinal, "Skipping clip: {e}"),
            }
            ClipOutcome {
                clip: clip.clone(),
                windows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::RecordedDetector;
    use reframe_clip_model::{select_clips, ClipSpec};

    fn hd_frames(count: usize) -> Vec<Frame> {
        (0..count).map(|i| Frame::blank(i, 1920, 1080)).collect()
    }

    fn no_faces() -> RecordedDetector {
        RecordedDetector::default()
    }

    fn passthrough() -> TrackerSettings {
        TrackerSettings {
            smoothing: SmoothingWindow::Frames(1),
            min_confidence: 0.5,
        }
    }

    #[test]
    fn test_empty_clip_gives_empty_track() {
        let tracker = CropTracker::new(no_faces(), &passthrough()).unwrap();
        let windows = tracker
            .build_crop_track(&[], 30.0, AspectRatio::VERTICAL)
            .unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_no_faces_keeps_frame_center() {
        let tracker = CropTracker::new(no_faces(), &passthrough()).unwrap();
        let windows = tracker
            .build_crop_track(&hd_frames(4), 30.0, AspectRatio::VERTICAL)
            .unwrap();
        assert_eq!(windows.len(), 4);
        assert!(windows.iter().all(|w| w.x == 960 - 303));
    }

    #[test]
    fn test_mixed_frame_sizes_are_invalid() {
        let tracker = CropTracker::new(no_faces(), &passthrough()).unwrap();
        let mut frames = hd_frames(2);
        frames.push(Frame::blank(2, 1280, 720));
        let err = tracker
            .build_crop_track(&frames, 30.0, AspectRatio::VERTICAL)
            .unwrap_err();
        assert!(matches!(err, ReframeError::InvalidFrame { index: 2, .. }));
    }

    #[test]
    fn test_zero_sized_first_frame_is_invalid() {
        let tracker = CropTracker::new(no_faces(), &passthrough()).unwrap();
        let frames = vec![Frame::rgb(0, 0, 1080, Vec::<u8>::new())];
        let err = tracker
            .build_crop_track(&frames, 30.0, AspectRatio::VERTICAL)
            .unwrap_err();
        assert!(matches!(err, ReframeError::InvalidFrame { index: 0, .. }));
    }

    #[test]
    fn test_bad_fps_is_config_error() {
        let tracker = CropTracker::new(no_faces(), &passthrough()).unwrap();
        let err = tracker
            .build_crop_track(&hd_frames(1), 0.0, AspectRatio::VERTICAL)
            .unwrap_err();
        assert!(matches!(err, ReframeError::Config { .. }));
    }

    #[test]
    fn test_from_detections_matches_frame_path() {
        let detections = vec![
            vec![Detection::centered(0.25, 0.125, 0.9)],
            vec![],
            vec![Detection::centered(0.75, 0.125, 0.9)],
            vec![Detection::centered(0.5, 0.125, 0.3)],
        ];
        let settings = TrackerSettings {
            smoothing: SmoothingWindow::Frames(3),
            min_confidence: 0.5,
        };
        let geometry = FrameGeometry::new(1920, 1080).unwrap();

        let recorded = build_crop_track_from_detections(
            &detections,
            geometry,
            30.0,
            AspectRatio::VERTICAL,
            &settings,
        )
        .unwrap();

        let detector = RecordedDetector::new(detections);
        let tracker = CropTracker::new(detector, &settings).unwrap();
        let live = tracker
            .build_crop_track(&hd_frames(4), 30.0, AspectRatio::VERTICAL)
            .unwrap();

        assert_eq!(recorded, live);
        // Raw [480, 480, 1440, 1440] smooths to [480, 800, 1120, 1440].
        let xs: Vec<u32> = live.iter().map(|w| w.x).collect();
        assert_eq!(xs, vec![177, 497, 817, 1137]);
    }

    #[test]
    fn test_run_clips_isolates_failures() {
        let clock = FrameClock::new(10.0).unwrap();
        let clips = vec![
            ClipSpec::new(0.0, 1.0, "good", 9.0).unwrap(),
            ClipSpec::new(1.0, 2.0, "corrupt", 8.0).unwrap(),
            ClipSpec::new(2.0, 3.0, "also good", 7.0).unwrap(),
        ];
        let selected = select_clips(&clips, 3.0, 0.5, &clock);
        assert_eq!(selected.len(), 3);

        let tracker = CropTracker::new(no_faces(), &passthrough()).unwrap();
        let outcomes = tracker.track_clips(&selected, 10.0, AspectRatio::VERTICAL, |clip| {
            let mut frames: Vec<Frame> = (0..clip.frame_count())
                .map(|i| Frame::blank(i, 64, 36))
                .collect();
            if clip.spec.label == "corrupt" {
                frames[3] = Frame::rgb(3, 64, 36, vec![0u8; 7]);
            }
            Ok(frames)
        });

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(!outcomes[1].is_ok());
        assert!(outcomes[2].is_ok());
        assert_eq!(outcomes[2].clip.ordinal, 3);
        assert_eq!(outcomes[0].windows.as_ref().unwrap().len(), 10);
    }

    #[test]
    fn test_run_clips_keeps_order_and_errors() {
        let clock = FrameClock::new(10.0).unwrap();
        let clips: Vec<ClipSpec> = (0..6)
            .map(|i| ClipSpec::new(i as f64, i as f64 + 1.0, "clip", 1.0).unwrap())
            .collect();
        let selected = select_clips(&clips, 6.0, 0.5, &clock);

        let outcomes = run_clips(&selected, |clip| {
            if clip.ordinal % 2 == 0 {
                Err(ReframeError::processing("no detections recorded"))
            } else {
                Ok(vec![CropWindow::new(clip.ordinal as u32, 10, 20)])
            }
        });

        let ordinals: Vec<usize> = outcomes.iter().map(|o| o.clip.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);
        for outcome in &outcomes {
            assert_eq!(outcome.is_ok(), outcome.clip.ordinal % 2 == 1);
        }
        assert_eq!(outcomes[2].windows.as_ref().unwrap()[0].x, 3);
    }

    #[test]
    fn test_settings_from_config_defaults() {
        let settings = TrackerSettings::from_defaults(&TrackingDefaults::default());
        assert_eq!(settings, TrackerSettings::default());
    }
}
