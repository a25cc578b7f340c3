//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ReframeResult;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default tracking parameters.
    #[serde(default)]
    pub tracking: TrackingDefaults,

    /// Clip selection parameters applied before tracking.
    #[serde(default)]
    pub clips: ClipDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default tracking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingDefaults {
    /// Moving-average window over the center track, in frames.
    pub smoothing_window_frames: usize,

    /// Target aspect ratio as `width:height` (e.g. "9:16").
    pub target_ratio: String,

    /// Minimum detector confidence for a face to count.
    pub min_confidence: f32,
}

/// Upstream clip selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipDefaults {
    /// Clips shorter than this after clamping are skipped.
    pub min_duration_secs: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reframe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingDefaults::default(),
            clips: ClipDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            smoothing_window_frames: 15,
            target_ratio: "9:16".to_string(),
            min_confidence: 0.5,
        }
    }
}

impl Default for ClipDefaults {
    fn default() -> Self {
        Self {
            min_duration_secs: 5.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ReframeResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config as pretty-printed JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ReframeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reframe").join("config.json")
}
