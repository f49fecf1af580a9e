//! TextureBrush - paints with a bitmap pattern

use image::{imageops, RgbaImage};
use serde::Serialize;

use super::attributes::ImageAttributes;
use super::texture_store::{self, TextureHandle, TextureInfo};
use super::WrapMode;
use crate::core::errors::BrushError;
use crate::geometry::{Matrix, MatrixOrder, RectF};

/// Brush that tiles a copy of an image region, mapped through an affine
/// transform.
///
/// The pixels live in the texture store behind a handle. [`dispose`] releases
/// the handle; afterwards every operation except another `dispose` fails with
/// [`BrushError::Disposed`]. Dropping an undisposed brush releases it too.
///
/// [`dispose`]: TextureBrush::dispose
#[derive(Debug)]
pub struct TextureBrush {
    texture: Option<TextureHandle>,
    source_region: RectF,
    wrap_mode: WrapMode,
    transform: Matrix,
    attributes: Option<ImageAttributes>,
}

/// Serializable summary of a brush
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrushSnapshot {
    pub width: u32,
    pub height: u32,
    pub content_hash: String,
    pub source_region: RectF,
    pub wrap_mode: WrapMode,
    pub transform: [f32; 6],
    pub has_attributes: bool,
}

impl TextureBrush {
    /// Tile the whole image
    pub fn new(image: &RgbaImage) -> Result<Self, BrushError> {
        Self::build(image, WrapMode::Tile, None, None)
    }

    pub fn with_wrap_mode(image: &RgbaImage, wrap_mode: WrapMode) -> Result<Self, BrushError> {
        Self::build(image, wrap_mode, None, None)
    }

    /// Tile a sub-region of the image. With attributes the brush takes its
    /// wrap mode from them, otherwise it tiles.
    pub fn with_region(
        image: &RgbaImage,
        region: impl Into<RectF>,
        attributes: Option<&ImageAttributes>,
    ) -> Result<Self, BrushError> {
        let wrap_mode = attributes.map(|a| a.wrap_mode).unwrap_or_default();
        Self::build(image, wrap_mode, Some(region.into()), attributes)
    }

    pub fn with_wrap_mode_and_region(
        image: &RgbaImage,
        wrap_mode: WrapMode,
        region: impl Into<RectF>,
    ) -> Result<Self, BrushError> {
        Self::build(image, wrap_mode, Some(region.into()), None)
    }

    fn build(
        image: &RgbaImage,
        wrap_mode: WrapMode,
        region: Option<RectF>,
        attributes: Option<&ImageAttributes>,
    ) -> Result<Self, BrushError> {
        let (width, height) = image.dimensions();
        let source_region =
            region.unwrap_or_else(|| RectF::new(0.0, 0.0, width as f32, height as f32));

        let pixels = source_region.to_pixel_rect();
        if source_region.is_empty() || pixels.is_empty() {
            return Err(BrushError::Allocation(format!(
                "empty source region {:?}",
                source_region
            )));
        }
        if pixels.x < 0
            || pixels.y < 0
            || pixels.right() > width as i64
            || pixels.bottom() > height as i64
        {
            return Err(BrushError::Allocation(format!(
                "source region {:?} outside {}x{} image",
                source_region, width, height
            )));
        }
        texture_store::check_dimensions(
            pixels.width as u32,
            pixels.height as u32,
            &texture_store::settings(),
        )?;

        let mut texture = imageops::crop_imm(
            image,
            pixels.x as u32,
            pixels.y as u32,
            pixels.width as u32,
            pixels.height as u32,
        )
        .to_image();

        if let Some(attr) = attributes {
            let remapped = attr.apply(&mut texture);
            if remapped > 0 {
                tracing::debug!("Remapped {} texture pixels", remapped);
            }
        }

        let handle = texture_store::allocate_texture(&texture)?;
        tracing::debug!(
            "Created texture brush {} ({}x{}, {})",
            handle.id(),
            pixels.width,
            pixels.height,
            wrap_mode.name()
        );

        Ok(Self {
            texture: Some(handle),
            source_region,
            wrap_mode,
            transform: Matrix::identity(),
            attributes: attributes.cloned(),
        })
    }

    fn handle(&self) -> Result<TextureHandle, BrushError> {
        self.texture.ok_or(BrushError::Disposed)
    }

    pub(crate) fn texture_handle(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn is_disposed(&self) -> bool {
        self.texture.is_none()
    }

    /// A fresh copy of the texture pixels on every call
    pub fn image(&self) -> Result<RgbaImage, BrushError> {
        texture_store::read_texture(self.handle()?)
    }

    pub fn texture_info(&self) -> Result<TextureInfo, BrushError> {
        let handle = self.handle()?;
        texture_store::texture_info(handle).ok_or_else(|| {
            BrushError::Texture(format!("texture {} missing from store", handle.id()))
        })
    }

    pub fn source_region(&self) -> Result<RectF, BrushError> {
        self.handle()?;
        Ok(self.source_region)
    }

    pub fn attributes(&self) -> Result<Option<&ImageAttributes>, BrushError> {
        self.handle()?;
        Ok(self.attributes.as_ref())
    }

    pub fn wrap_mode(&self) -> Result<WrapMode, BrushError> {
        self.handle()?;
        Ok(self.wrap_mode)
    }

    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) -> Result<(), BrushError> {
        self.handle()?;
        self.wrap_mode = wrap_mode;
        Ok(())
    }

    pub fn transform(&self) -> Result<Matrix, BrushError> {
        self.handle()?;
        Ok(self.transform)
    }

    pub fn set_transform(&mut self, transform: Matrix) -> Result<(), BrushError> {
        self.handle()?;
        self.transform = transform;
        Ok(())
    }

    /// Compose the brush transform with `matrix`. The brush transform has to
    /// stay invertible for device-to-texture mapping, so singular matrices
    /// are rejected and the transform is left as it was.
    pub fn multiply_transform(
        &mut self,
        matrix: &Matrix,
        order: MatrixOrder,
    ) -> Result<(), BrushError> {
        self.handle()?;
        if !matrix.is_invertible() {
            return Err(BrushError::InvalidArgument(format!(
                "matrix {:?} is not invertible",
                matrix.elements()
            )));
        }
        self.transform.multiply(matrix, order);
        Ok(())
    }

    pub fn reset_transform(&mut self) -> Result<(), BrushError> {
        self.handle()?;
        self.transform.reset();
        Ok(())
    }

    /// Rotate by `angle` degrees, clockwise in device space
    pub fn rotate_transform(&mut self, angle: f32, order: MatrixOrder) -> Result<(), BrushError> {
        self.handle()?;
        self.transform.rotate(angle, order);
        Ok(())
    }

    pub fn scale_transform(
        &mut self,
        sx: f32,
        sy: f32,
        order: MatrixOrder,
    ) -> Result<(), BrushError> {
        self.handle()?;
        self.transform.scale(sx, sy, order);
        Ok(())
    }

    pub fn translate_transform(
        &mut self,
        dx: f32,
        dy: f32,
        order: MatrixOrder,
    ) -> Result<(), BrushError> {
        self.handle()?;
        self.transform.translate(dx, dy, order);
        Ok(())
    }

    pub fn shear_transform(
        &mut self,
        shear_x: f32,
        shear_y: f32,
        order: MatrixOrder,
    ) -> Result<(), BrushError> {
        self.handle()?;
        self.transform.shear(shear_x, shear_y, order);
        Ok(())
    }

    /// Map a device-space point into texture space through the inverse of
    /// the brush transform
    pub fn texture_point(&self, device: (f32, f32)) -> Result<(f32, f32), BrushError> {
        self.handle()?;
        let inverse = self.transform.invert().ok_or_else(|| {
            BrushError::InvalidArgument(format!(
                "brush transform {:?} is not invertible",
                self.transform.elements()
            ))
        })?;
        Ok(inverse.transform_point(device))
    }

    /// Independent copy with its own texture handle
    pub fn try_clone(&self) -> Result<Self, BrushError> {
        let source = self.handle()?;
        let handle = texture_store::duplicate_texture(source)?;
        tracing::debug!("Cloned texture brush {} -> {}", source.id(), handle.id());

        Ok(Self {
            texture: Some(handle),
            source_region: self.source_region,
            wrap_mode: self.wrap_mode,
            transform: self.transform,
            attributes: self.attributes.clone(),
        })
    }

    /// Release the texture. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.texture.take() {
            texture_store::release_texture(handle);
            tracing::debug!("Disposed texture brush {}", handle.id());
        }
    }

    pub fn describe(&self) -> Result<BrushSnapshot, BrushError> {
        let info = self.texture_info()?;
        Ok(BrushSnapshot {
            width: info.width,
            height: info.height,
            content_hash: info.content_hash,
            source_region: self.source_region,
            wrap_mode: self.wrap_mode,
            transform: self.transform.elements(),
            has_attributes: self.attributes.is_some(),
        })
    }
}

impl Drop for TextureBrush {
    fn drop(&mut self) {
        self.dispose();
    }
}
