use thiserror::Error;

/// Errors surfaced by brush construction and brush operations
#[derive(Debug, Error)]
pub enum BrushError {
    /// A required reference (image, matrix) was absent
    #[error("Value cannot be null: {0}")]
    NullArgument(&'static str),

    /// A raw enum code outside the defined set
    #[error("Invalid value {value} for enum {name}")]
    InvalidEnum { name: &'static str, value: i32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The texture resource could not be allocated for the requested region
    #[error("Texture allocation failed: {0}")]
    Allocation(String),

    #[error("Brush has been disposed")]
    Disposed,

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Texture store error: {0}")]
    Texture(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl BrushError {
    /// True for the argument-error family: bad enum codes, bad values and
    /// regions the texture store refuses to allocate.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidEnum { .. } | Self::InvalidArgument(_) | Self::Allocation(_)
        )
    }
}

impl From<BrushError> for String {
    fn from(err: BrushError) -> Self {
        err.to_string()
    }
}
