//! Texture brush module - a brush that paints with a bitmap pattern

pub mod attributes;
mod texture;
pub mod texture_store;

pub use attributes::{ColorMap, ImageAttributes};
pub use texture::{BrushSnapshot, TextureBrush};
pub use texture_store::{TextureHandle, TextureInfo};

use serde::{Deserialize, Serialize};

use crate::core::errors::BrushError;

/// How the sampled image tile repeats across the painted area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    /// Plain tiling
    #[default]
    Tile = 0,
    /// Every other column mirrored horizontally
    TileFlipX = 1,
    /// Every other row mirrored vertically
    TileFlipY = 2,
    /// Mirrored in both directions
    TileFlipXY = 3,
    /// No tiling outside the texture
    Clamp = 4,
}

impl WrapMode {
    pub const ALL: [WrapMode; 5] = [
        WrapMode::Tile,
        WrapMode::TileFlipX,
        WrapMode::TileFlipY,
        WrapMode::TileFlipXY,
        WrapMode::Clamp,
    ];

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tile => "Tile",
            Self::TileFlipX => "TileFlipX",
            Self::TileFlipY => "TileFlipY",
            Self::TileFlipXY => "TileFlipXY",
            Self::Clamp => "Clamp",
        }
    }

    /// Raw integer code
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl TryFrom<i32> for WrapMode {
    type Error = BrushError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.code() == code)
            .ok_or(BrushError::InvalidEnum {
                name: "WrapMode",
                value: code,
            })
    }
}
