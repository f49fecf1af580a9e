//! Image attributes applied when a texture is captured

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::WrapMode;

/// Replace one exact RGBA color with another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMap {
    pub old: [u8; 4],
    pub new: [u8; 4],
}

/// Color remapping configuration
///
/// The wrap mode defaults to `Clamp`; a brush built from a region plus
/// attributes inherits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAttributes {
    pub wrap_mode: WrapMode,
    pub remap_table: Vec<ColorMap>,
}

impl Default for ImageAttributes {
    fn default() -> Self {
        Self {
            wrap_mode: WrapMode::Clamp,
            remap_table: Vec::new(),
        }
    }
}

impl ImageAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    pub fn set_remap_table(&mut self, table: impl IntoIterator<Item = ColorMap>) {
        self.remap_table = table.into_iter().collect();
    }

    pub fn clear_remap_table(&mut self) {
        self.remap_table.clear();
    }

    /// Remap pixels in place. The first matching entry wins; remapped
    /// pixels are not matched again.
    pub fn apply(&self, image: &mut RgbaImage) -> usize {
        if self.remap_table.is_empty() {
            return 0;
        }

        let mut changed = 0;
        for pixel in image.pixels_mut() {
            if let Some(map) = self.remap_table.iter().find(|m| m.old == pixel.0) {
                pixel.0 = map.new;
                changed += 1;
            }
        }
        changed
    }
}
