use serde::Deserialize;

use vanish_media::{DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, MediaOptions};

/// Image transcoding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Longest side of a stored photo, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Lossy encoder quality, 1 to 100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl MediaConfig {
    pub fn options(&self) -> MediaOptions {
        MediaOptions {
            max_dimension: self.max_dimension,
            quality: self.quality,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            quality: default_quality(),
        }
    }
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}
