//! Errors raised while loading or validating model files.

use std::path::PathBuf;

/// Errors that can occur when working with clips, detection streams and plans.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error for {path}: {source}")]
    SerializeError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid clip: {message}")]
    InvalidClip { message: String },

    #[error("Invalid detection stream: {message}")]
    InvalidStream { message: String },

    #[error("Invalid crop plan: {message}")]
    InvalidPlan { message: String },
}

impl ModelError {
    pub fn invalid_clip(msg: impl Into<String>) -> Self {
        Self::InvalidClip {
            message: msg.into(),
        }
    }

    pub fn invalid_stream(msg: impl Into<String>) -> Self {
        Self::InvalidStream {
            message: msg.into(),
        }
    }

    pub fn invalid_plan(msg: impl Into<String>) -> Self {
        Self::InvalidPlan {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_write_failures_are_distinct() {
        let source = serde_json::from_str::<u32>("x").unwrap_err();
        let err = ModelError::SerializeError {
            path: PathBuf::from("plans/reel_1.crop.json"),
            source,
        };
        let message = err.to_string();
        assert!(message.starts_with("Serialization error for plans/reel_1.crop.json"));
        assert!(!matches!(err, ModelError::ParseError { .. }));
    }
}
