//! texture-brush - brushes that paint with a bitmap pattern
//!
//! A [`TextureBrush`] tiles a copy of an image region, mapped through an
//! affine [`Matrix`], with a [`WrapMode`] and optional [`ImageAttributes`].
//! Its pixels live in a texture store behind a handle that is released by
//! `dispose()` or on drop.
//!
//! ```ignore
//! use texture_brush::{MatrixOrder, TextureBrush};
//!
//! let image = image::open("tile.png")?.to_rgba8();
//! let mut brush = TextureBrush::new(&image)?;
//! brush.rotate_transform(90.0, MatrixOrder::Prepend)?;
//! brush.dispose();
//! ```

pub mod brush;
pub mod commands;
pub mod core;
pub mod geometry;

pub use brush::{ColorMap, ImageAttributes, TextureBrush, WrapMode};
pub use commands::{apply_command, apply_script, create_brush, BrushCommand, BrushDescriptor};
pub use crate::core::{BrushError, StoreSettings};
pub use geometry::{Matrix, MatrixOrder, Rect, RectF};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging. `RUST_LOG` overrides the default filter; calling this
/// again after a subscriber is installed is a no-op.
pub fn init_logging() {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "texture_brush=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("texture-brush logging initialized");
    }
}
