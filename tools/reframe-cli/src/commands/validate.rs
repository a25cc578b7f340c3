//! Validate a crop plan.

use std::path::PathBuf;

use reframe_clip_model::CropPlan;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating crop plan at: {}", path.display());

    let plan = CropPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    println!("  Version: {}", plan.version);
    println!("  Source: {}x{}", plan.frame_width, plan.frame_height);
    println!("  Frames: {}", plan.len());
    if let Some(first) = plan.windows.first() {
        println!("  Crop: {}x{}", first.width, first.height);
    }

    plan.validate().map_err(|e| anyhow::anyhow!("Plan is invalid: {e}"))?;

    println!("\nPlan is valid.");
    Ok(())
}
