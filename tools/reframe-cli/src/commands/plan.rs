//! Build crop plans for the selected clips of a source video.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use reframe_clip_model::{
    load_clips, load_detection_stream, select_clips, AspectRatio, CropPlan, CropWindow,
    DetectionStream, SelectedClip,
};
use reframe_common::{AppConfig, FrameClock, ReframeError, ReframeResult};
use reframe_processing_core::{
    build_crop_track_from_detections, run_clips, ClipOutcome, FrameGeometry, SmoothingWindow,
    TrackerSettings,
};

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Detection stream (JSONL) recorded for the source video
    pub detections: PathBuf,

    /// Clip list (JSON array) produced by the analysis stage
    #[arg(long)]
    pub clips: PathBuf,

    /// Output directory for the crop plans
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Smoothing window in frames
    #[arg(long, conflicts_with = "window_secs")]
    pub window: Option<usize>,

    /// Smoothing window in seconds of video
    #[arg(long)]
    pub window_secs: Option<f64>,

    /// Target aspect ratio, e.g. 9:16
    #[arg(long)]
    pub ratio: Option<String>,

    /// Minimum detector confidence [0.0, 1.0]
    #[arg(long)]
    pub min_confidence: Option<f32>,

    /// Skip clips shorter than this after clamping (seconds)
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Source duration in seconds (defaults to the detection stream's)
    #[arg(long)]
    pub duration: Option<f64>,
}

impl PlanArgs {
    /// Tracking settings with command-line overrides applied over the config.
    fn tracker_settings(&self, config: &AppConfig) -> TrackerSettings {
        let mut settings = TrackerSettings::from_defaults(&config.tracking);
        if let Some(secs) = self.window_secs {
            settings.smoothing = SmoothingWindow::Seconds(secs);
        } else if let Some(frames) = self.window {
            settings.smoothing = SmoothingWindow::Frames(frames);
        }
        if let Some(min_confidence) = self.min_confidence {
            settings.min_confidence = min_confidence;
        }
        settings
    }

    fn target_ratio(&self, config: &AppConfig) -> anyhow::Result<AspectRatio> {
        let text = self
            .ratio
            .as_deref()
            .unwrap_or(&config.tracking.target_ratio);
        text.parse::<AspectRatio>()
            .with_context(|| format!("Invalid target ratio '{text}'"))
    }
}

/// Everything a clip task needs besides the clip itself.
#[derive(Debug, Clone, Copy)]
struct PlanContext {
    geometry: FrameGeometry,
    fps: f64,
    ratio: AspectRatio,
    settings: TrackerSettings,
}

pub async fn run(args: PlanArgs, config: &AppConfig) -> anyhow::Result<()> {
    println!("Planning crops for: {}", args.detections.display());

    let stream = load_detection_stream(&args.detections)
        .map_err(|e| anyhow::anyhow!("Failed to load detections: {e}"))?;
    let clips =
        load_clips(&args.clips).map_err(|e| anyhow::anyhow!("Failed to load clips: {e}"))?;

    let header = &stream.header;
    let clock = FrameClock::new(header.fps)?;
    let ctx = PlanContext {
        geometry: FrameGeometry::new(header.frame_width, header.frame_height)?,
        fps: header.fps,
        ratio: args.target_ratio(config)?,
        settings: args.tracker_settings(config),
    };

    let source_duration = args.duration.unwrap_or_else(|| header.duration_secs());
    let min_duration = args
        .min_duration
        .unwrap_or(config.clips.min_duration_secs);
    let selected = select_clips(&clips, source_duration, min_duration, &clock);

    println!(
        "  Source: {}x{} @ {}fps ({:.1}s)",
        header.frame_width, header.frame_height, header.fps, source_duration
    );
    println!(
        "  Detections: {} of {} frames",
        stream.detected_frames(),
        header.frame_count
    );
    println!(
        "  Clips: {} of {} selected (min {min_duration}s)",
        selected.len(),
        clips.len()
    );

    if selected.is_empty() {
        println!("  No clips to plan.");
        return Ok(());
    }

    let outcomes = plan_all(Arc::new(stream), selected, ctx, &args.output).await?;

    let mut failed = 0;
    for (clip, path, result) in &outcomes {
        match result {
            Ok(frames) => println!(
                "  [{}] {} -> {} ({frames} frames)",
                clip.ordinal,
                clip.spec.label,
                path.display()
            ),
            Err(e) => {
                failed += 1;
                println!("  [{}] {} FAILED: {e:#}", clip.ordinal, clip.spec.label);
            }
        }
    }

    println!(
        "\n{} plan(s) written to {}",
        outcomes.len() - failed,
        args.output.display()
    );
    if failed > 0 {
        println!("{failed} clip(s) failed and were skipped.");
    }

    Ok(())
}

type ClipResult = (SelectedClip, PathBuf, anyhow::Result<usize>);

/// Track every clip on the blocking pool and save one plan per clip.
/// Results come back in clip order.
async fn plan_all(
    stream: Arc<DetectionStream>,
    clips: Vec<SelectedClip>,
    ctx: PlanContext,
    output_dir: &Path,
) -> anyhow::Result<Vec<ClipResult>> {
    let output_dir = output_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        run_clips(&clips, |clip| track_clip(&stream, clip, ctx))
            .into_iter()
            .map(|ClipOutcome { clip, windows }| {
                let path = output_dir.join(format!("{}.crop.json", clip.output_stem()));
                let result = windows.map_err(anyhow::Error::from).and_then(|windows| {
                    let plan = plan_for(&clip, windows, ctx);
                    plan.save(&path)?;
                    Ok(plan.len())
                });
                (clip, path, result)
            })
            .collect()
    })
    .await
    .context("Planning task panicked")
}

/// Build the crop track of one clip from the recorded detections.
fn track_clip(
    stream: &DetectionStream,
    clip: &SelectedClip,
    ctx: PlanContext,
) -> ReframeResult<Vec<CropWindow>> {
    let detections = stream.frames_in(clip.frames.clone());
    if detections.is_empty() && clip.frame_count() > 0 {
        return Err(ReframeError::processing(format!(
            "no recorded detections for frames {}..{}",
            clip.frames.start, clip.frames.end
        )));
    }
    if detections.len() < clip.frame_count() {
        tracing::warn!(
            clip = clip.ordinal,
            expected = clip.frame_count(),
            recorded = detections.len(),
            "Detection stream ends before the clip"
        );
    }

    build_crop_track_from_detections(
        &detections,
        ctx.geometry,
        ctx.fps,
        ctx.ratio,
        &ctx.settings,
    )
}

fn plan_for(clip: &SelectedClip, windows: Vec<CropWindow>, ctx: PlanContext) -> CropPlan {
    CropPlan::new(
        ctx.geometry.width,
        ctx.geometry.height,
        ctx.fps,
        ctx.ratio,
        windows,
    )
    .with_clip(clip.spec.clone())
}
