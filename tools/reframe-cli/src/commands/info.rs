//! Show crop plan information.

use std::path::PathBuf;

use reframe_clip_model::CropPlan;
use reframe_common::FrameClock;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let plan = CropPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    println!("Crop plan: {}", path.display());
    println!("  Version: {}", plan.version);
    println!("  Created: {}", plan.created_at);
    println!();

    if let Some(ref clip) = plan.clip {
        println!("Clip:");
        println!("  Label: {}", clip.label);
        println!(
            "  Range: {:.2}s - {:.2}s ({:.1}s)",
            clip.start_seconds,
            clip.end_seconds,
            clip.duration_secs()
        );
        println!("  Score: {}", clip.score);
        println!();
    }

    println!("Geometry:");
    println!(
        "  Source: {}x{} @ {}fps",
        plan.frame_width, plan.frame_height, plan.fps
    );
    println!("  Target ratio: {}", plan.target_ratio);
    match plan.windows.first() {
        Some(first) => println!("  Crop: {}x{}", first.width, first.height),
        None => println!("  Crop: (empty plan)"),
    }
    println!();

    println!("Track:");
    println!("  Frames: {}", plan.len());
    if let Ok(clock) = FrameClock::new(plan.fps) {
        println!("  Duration: {:.2}s", clock.secs_at_frame(plan.len()));
    }
    if let Some((min, max)) = plan.x_range() {
        println!("  Crop x range: {min} - {max} ({}px travel)", max - min);
    }

    Ok(())
}
