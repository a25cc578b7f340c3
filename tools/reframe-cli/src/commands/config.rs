//! Print the effective configuration.

use reframe_common::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, save: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    if path.exists() {
        println!("# Loaded from {}", path.display());
    } else {
        println!("# Defaults ({} not found)", path.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to save config: {e}"))?;
        println!("# Saved to {}", path.display());
    }
    Ok(())
}
