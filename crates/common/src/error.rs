//! Error types shared across Reframe crates.

/// Top-level error type for Reframe operations.
///
/// A missed face detection is not an error anywhere in this taxonomy;
/// it is the ordinary case handled by the persistence fallback.
#[derive(Debug, thiserror::Error)]
pub enum ReframeError {
    /// A frame buffer could not be decoded or has non-positive dimensions.
    /// Fatal for the clip that contains it, never for the whole run.
    #[error("Invalid frame {index}: {message}")]
    InvalidFrame { index: usize, message: String },

    /// A center track and the frame count supplied alongside it disagree.
    #[error("Length mismatch: expected {expected} frames, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ReframeError.
pub type ReframeResult<T> = Result<T, ReframeError>;

impl ReframeError {
    pub fn invalid_frame(index: usize, msg: impl Into<String>) -> Self {
        Self::InvalidFrame {
            index,
            message: msg.into(),
        }
    }

    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }
}
