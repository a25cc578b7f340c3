//! Target aspect ratio.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A `width:height` aspect ratio with positive integer terms.
///
/// Serialized as the string form, e.g. `"9:16"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Portrait 9:16, the short-form video default.
    pub const VERTICAL: AspectRatio = AspectRatio {
        width: 9,
        height: 16,
    };

    /// Create a ratio; both terms must be non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self, ModelError> {
        if width == 0 || height == 0 {
            return Err(ModelError::invalid_clip(format!(
                "aspect ratio terms must be positive, got {width}:{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::VERTICAL
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = ModelError;

    /// Parse `"9:16"` or `"9/16"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .or_else(|| s.split_once('/'))
            .ok_or_else(|| ModelError::invalid_clip(format!("malformed aspect ratio '{s}'")))?;
        let parse = |term: &str| {
            term.trim()
                .parse::<u32>()
                .map_err(|_| ModelError::invalid_clip(format!("malformed aspect ratio '{s}'")))
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.to_string()
    }
}
