//! Texture store configuration

use serde::{Deserialize, Serialize};

/// Largest texture edge accepted by default, matching the document size cap
pub const DEFAULT_MAX_DIMENSION: u32 = 16384;

const ENV_MAX_DIMENSION: &str = "TEXTURE_BRUSH_MAX_DIMENSION";
const ENV_COMPRESS: &str = "TEXTURE_BRUSH_COMPRESS";

/// Settings for the process-wide texture store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Maximum width or height of a texture in pixels
    pub max_dimension: u32,
    /// Keep texture pixels LZ4 compressed
    pub compress: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            compress: true,
        }
    }
}

impl StoreSettings {
    /// Defaults overridden by `TEXTURE_BRUSH_MAX_DIMENSION` and
    /// `TEXTURE_BRUSH_COMPRESS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_MAX_DIMENSION) {
            match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => settings.max_dimension = value,
                _ => tracing::warn!("Ignoring invalid {}={:?}", ENV_MAX_DIMENSION, raw),
            }
        }

        if let Some(raw) = lookup(ENV_COMPRESS) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => settings.compress = true,
                "0" | "false" | "no" | "off" => settings.compress = false,
                _ => tracing::warn!("Ignoring invalid {}={:?}", ENV_COMPRESS, raw),
            }
        }

        settings
    }
}
