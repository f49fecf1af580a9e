//! Brush commands - untyped interface between callers and the brush
//!
//! Payloads arrive as JSON, so image references may be null and enums come
//! in as raw integer codes. Everything is validated here, in a fixed order
//! (null references, then enum codes, then brush state), before the typed
//! brush API is called.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::brush::{ImageAttributes, TextureBrush, WrapMode};
use crate::core::errors::BrushError;
use crate::geometry::{Matrix, MatrixOrder, Rect, RectF};

/// Resolves image references named in brush descriptors
pub trait ImageSource {
    fn load(&self, key: &str) -> Result<Cow<'_, RgbaImage>, BrushError>;
}

impl ImageSource for HashMap<String, RgbaImage> {
    fn load(&self, key: &str) -> Result<Cow<'_, RgbaImage>, BrushError> {
        self.get(key)
            .map(Cow::Borrowed)
            .ok_or_else(|| BrushError::ImageNotFound(key.to_string()))
    }
}

/// Loads images from files below a root directory
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    root: PathBuf,
}

impl DirectoryImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ImageSource for DirectoryImageSource {
    fn load(&self, key: &str) -> Result<Cow<'_, RgbaImage>, BrushError> {
        let path = self
            .resolve(key)
            .filter(|p| p.is_file())
            .ok_or_else(|| BrushError::ImageNotFound(key.to_string()))?;

        tracing::debug!("Loading brush image {:?}", path);
        Ok(Cow::Owned(image::open(&path)?.to_rgba8()))
    }
}

/// Brush description as received from callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrushDescriptor {
    /// Image reference resolved through an [`ImageSource`]
    pub image: Option<String>,
    /// Raw wrap mode code
    pub wrap_mode: Option<i32>,
    pub region: Option<RectF>,
    pub attributes: Option<ImageAttributes>,
}

/// A single brush operation with raw, unvalidated arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BrushCommand {
    SetTransform {
        elements: Option<[f32; 6]>,
    },
    MultiplyTransform {
        elements: Option<[f32; 6]>,
        order: Option<i32>,
    },
    ResetTransform,
    RotateTransform {
        angle: f32,
        order: Option<i32>,
    },
    ScaleTransform {
        sx: f32,
        sy: f32,
        order: Option<i32>,
    },
    TranslateTransform {
        dx: f32,
        dy: f32,
        order: Option<i32>,
    },
    ShearTransform {
        shx: f32,
        shy: f32,
        order: Option<i32>,
    },
    SetWrapMode {
        mode: i32,
    },
}

/// Build a brush from a descriptor.
///
/// Check order: null image, wrap mode code, conflicting wrap sources, image
/// lookup, then region allocation.
pub fn create_brush(
    desc: &BrushDescriptor,
    images: &dyn ImageSource,
) -> Result<TextureBrush, BrushError> {
    let key = desc
        .image
        .as_deref()
        .ok_or(BrushError::NullArgument("image"))?;
    let wrap_mode = desc.wrap_mode.map(WrapMode::try_from).transpose()?;
    if wrap_mode.is_some() && desc.attributes.is_some() {
        return Err(BrushError::InvalidArgument(
            "wrapMode and attributes both set the wrap mode".to_string(),
        ));
    }

    let image = images.load(key)?;
    let brush = match (wrap_mode, desc.region, desc.attributes.as_ref()) {
        (Some(mode), Some(region), _) => {
            TextureBrush::with_wrap_mode_and_region(&image, mode, region)
        }
        (Some(mode), None, _) => TextureBrush::with_wrap_mode(&image, mode),
        (None, Some(region), attributes) => TextureBrush::with_region(&image, region, attributes),
        (None, None, Some(attributes)) => {
            let (width, height) = image.dimensions();
            let full = Rect::new(0, 0, width as i32, height as i32);
            TextureBrush::with_region(&image, full, Some(attributes))
        }
        (None, None, None) => TextureBrush::new(&image),
    }?;

    tracing::info!("Created brush from image {:?}", key);
    Ok(brush)
}

/// Parse a JSON descriptor and build the brush
pub fn create_brush_from_json(
    json: &str,
    images: &dyn ImageSource,
) -> Result<TextureBrush, BrushError> {
    let desc: BrushDescriptor = serde_json::from_str(json)?;
    create_brush(&desc, images)
}

fn required_matrix(elements: Option<[f32; 6]>) -> Result<Matrix, BrushError> {
    elements
        .map(Matrix::from_elements)
        .ok_or(BrushError::NullArgument("matrix"))
}

fn strict_order(code: Option<i32>) -> Result<MatrixOrder, BrushError> {
    Ok(code
        .map(MatrixOrder::try_from)
        .transpose()?
        .unwrap_or_default())
}

/// Apply one command.
///
/// Rotate, scale, translate and shear reject unknown order codes;
/// multiply falls back to the default order instead.
pub fn apply_command(brush: &mut TextureBrush, command: &BrushCommand) -> Result<(), BrushError> {
    match *command {
        BrushCommand::SetTransform { elements } => brush.set_transform(required_matrix(elements)?),
        BrushCommand::MultiplyTransform { elements, order } => {
            let matrix = required_matrix(elements)?;
            let order = order
                .map(MatrixOrder::from_code_or_default)
                .unwrap_or_default();
            brush.multiply_transform(&matrix, order)
        }
        BrushCommand::ResetTransform => brush.reset_transform(),
        BrushCommand::RotateTransform { angle, order } => {
            brush.rotate_transform(angle, strict_order(order)?)
        }
        BrushCommand::ScaleTransform { sx, sy, order } => {
            brush.scale_transform(sx, sy, strict_order(order)?)
        }
        BrushCommand::TranslateTransform { dx, dy, order } => {
            brush.translate_transform(dx, dy, strict_order(order)?)
        }
        BrushCommand::ShearTransform { shx, shy, order } => {
            brush.shear_transform(shx, shy, strict_order(order)?)
        }
        BrushCommand::SetWrapMode { mode } => brush.set_wrap_mode(WrapMode::try_from(mode)?),
    }
}

/// Apply a JSON array of commands, stopping at the first failure.
/// Returns the number of commands applied.
pub fn apply_script(brush: &mut TextureBrush, json: &str) -> Result<usize, BrushError> {
    let commands: Vec<BrushCommand> = serde_json::from_str(json)?;
    for (i, command) in commands.iter().enumerate() {
        if let Err(e) = apply_command(brush, command) {
            tracing::warn!("Brush command {} ({:?}) failed: {}", i, command, e);
            return Err(e);
        }
    }
    tracing::debug!("Applied {} brush commands", commands.len());
    Ok(commands.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    fn images() -> HashMap<String, RgbaImage> {
        let mut map = HashMap::new();
        map.insert(
            "bitmap".to_string(),
            RgbaImage::from_pixel(10, 10, Rgba([10, 20, 30, 255])),
        );
        map
    }

    fn brush() -> TextureBrush {
        create_brush_from_json(r#"{"image":"bitmap"}"#, &images()).unwrap()
    }

    #[test]
    fn null_image_is_checked_first() {
        let cases = [
            r#"{"image":null}"#,
            r#"{"wrapMode":4}"#,
            r#"{"image":null,"wrapMode":-2147483648}"#,
            r#"{"image":null,"region":{"x":0,"y":0,"width":10,"height":10}}"#,
            r#"{"image":null,"region":{"x":0,"y":0,"width":0,"height":0}}"#,
            r#"{"image":null,"region":{"x":0,"y":0,"width":10,"height":10},"attributes":{}}"#,
            r#"{"image":null,"wrapMode":-2147483648,
                "region":{"x":0,"y":0,"width":10,"height":10}}"#,
        ];
        for json in cases {
            let err = create_brush_from_json(json, &images()).unwrap_err();
            assert!(
                matches!(err, BrushError::NullArgument("image")),
                "{}: {:?}",
                json,
                err
            );
        }
    }

    #[test]
    fn invalid_wrap_mode_code() {
        for json in [
            r#"{"image":"bitmap","wrapMode":-2147483648}"#,
            r#"{"image":"bitmap","wrapMode":-2147483648,
                "region":{"x":0,"y":0,"width":10,"height":10}}"#,
        ] {
            let err = create_brush_from_json(json, &images()).unwrap_err();
            assert!(matches!(
                err,
                BrushError::InvalidEnum {
                    name: "WrapMode",
                    value: i32::MIN
                }
            ));
        }
    }

    #[test]
    fn descriptor_forms() {
        let imgs = images();
        let cases = [
            (r#"{"image":"bitmap"}"#, WrapMode::Tile),
            (r#"{"image":"bitmap","wrapMode":3}"#, WrapMode::TileFlipXY),
            (
                r#"{"image":"bitmap","region":{"x":0,"y":0,"width":10,"height":10}}"#,
                WrapMode::Tile,
            ),
            (
                r#"{"image":"bitmap","attributes":null,
                    "region":{"x":0,"y":0,"width":10,"height":10}}"#,
                WrapMode::Tile,
            ),
            (
                r#"{"image":"bitmap","attributes":{},
                    "region":{"x":0,"y":0,"width":10,"height":10}}"#,
                WrapMode::Clamp,
            ),
            (r#"{"image":"bitmap","attributes":{}}"#, WrapMode::Clamp),
            (
                r#"{"image":"bitmap","wrapMode":1,"region":{"x":0,"y":0,"width":5,"height":5}}"#,
                WrapMode::TileFlipX,
            ),
        ];
        for (json, expected) in cases {
            let brush = create_brush_from_json(json, &imgs).unwrap();
            assert_eq!(brush.wrap_mode().unwrap(), expected, "{}", json);
            assert!(brush.transform().unwrap().is_identity());
        }
    }

    #[test]
    fn empty_region_is_allocation_failure() {
        let err = create_brush_from_json(
            r#"{"image":"bitmap","region":{"x":0,"y":0,"width":0,"height":0},"attributes":{}}"#,
            &images(),
        )
        .unwrap_err();
        assert!(matches!(err, BrushError::Allocation(_)));
    }

    #[test]
    fn conflicting_wrap_sources() {
        let json = r#"{"image":"bitmap","wrapMode":0,"attributes":{}}"#;
        let err = create_brush_from_json(json, &images()).unwrap_err();
        assert!(matches!(err, BrushError::InvalidArgument(_)));
    }

    #[test]
    fn unknown_image_key() {
        let err = create_brush_from_json(r#"{"image":"missing"}"#, &images()).unwrap_err();
        assert!(matches!(err, BrushError::ImageNotFound(key) if key == "missing"));
    }

    #[test]
    fn malformed_json() {
        let err = create_brush_from_json("{", &images()).unwrap_err();
        assert!(matches!(err, BrushError::Json(_)));
    }

    #[test]
    fn null_matrix_arguments() {
        let mut b = brush();
        for json in [
            r#"[{"op":"setTransform","elements":null}]"#,
            r#"[{"op":"multiplyTransform"}]"#,
            r#"[{"op":"multiplyTransform","elements":null,"order":1}]"#,
        ] {
            let err = apply_script(&mut b, json).unwrap_err();
            assert!(matches!(err, BrushError::NullArgument("matrix")), "{}", json);
        }
    }

    #[test]
    fn null_matrix_reported_before_disposed() {
        let mut b = brush();
        b.dispose();
        let set_null = BrushCommand::SetTransform { elements: None };
        let err = apply_command(&mut b, &set_null).unwrap_err();
        assert!(matches!(err, BrushError::NullArgument("matrix")));

        let err = apply_command(&mut b, &BrushCommand::ResetTransform).unwrap_err();
        assert!(matches!(err, BrushError::Disposed));
    }

    #[test]
    fn multiply_tolerates_invalid_order() {
        let mut b = brush();
        let count = apply_script(
            &mut b,
            r#"[{"op":"multiplyTransform","elements":[1,0,0,1,0,0],"order":-2147483648}]"#,
        )
        .unwrap();
        assert_eq!(count, 1);
        assert!(b.transform().unwrap().is_identity());
    }

    #[test]
    fn multiply_rejects_non_invertible() {
        let mut b = brush();
        let err = apply_script(
            &mut b,
            r#"[{"op":"multiplyTransform","elements":[123,24,82,16,47,30]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, BrushError::InvalidArgument(_)));
    }

    #[test]
    fn other_transforms_reject_invalid_order() {
        let mut b = brush();
        for command in [
            BrushCommand::RotateTransform {
                angle: 720.0,
                order: Some(i32::MIN),
            },
            BrushCommand::ScaleTransform {
                sx: 1.0,
                sy: 1.0,
                order: Some(i32::MIN),
            },
            BrushCommand::TranslateTransform {
                dx: 1.0,
                dy: 1.0,
                order: Some(i32::MIN),
            },
            BrushCommand::ShearTransform {
                shx: 1.0,
                shy: 0.0,
                order: Some(i32::MIN),
            },
        ] {
            let err = apply_command(&mut b, &command).unwrap_err();
            assert!(err.is_invalid_argument(), "{:?}", command);
            assert!(matches!(err, BrushError::InvalidEnum { name: "MatrixOrder", .. }));
        }
        assert!(b.transform().unwrap().is_identity());
    }

    #[test]
    fn invalid_wrap_mode_keeps_state() {
        let mut b = brush();
        apply_command(&mut b, &BrushCommand::SetWrapMode { mode: 2 }).unwrap();
        let err = apply_command(&mut b, &BrushCommand::SetWrapMode { mode: i32::MIN }).unwrap_err();

        assert!(matches!(err, BrushError::InvalidEnum { name: "WrapMode", .. }));
        assert_eq!(b.wrap_mode().unwrap(), WrapMode::TileFlipY);
    }

    #[test]
    fn script_round_trips_to_identity() {
        let mut b = brush();
        let count = apply_script(
            &mut b,
            r#"[
                {"op":"rotateTransform","angle":90},
                {"op":"rotateTransform","angle":270},
                {"op":"scaleTransform","sx":2,"sy":4,"order":1},
                {"op":"scaleTransform","sx":0.5,"sy":0.25,"order":1},
                {"op":"translateTransform","dx":1,"dy":1},
                {"op":"translateTransform","dx":-1,"dy":-1}
            ]"#,
        )
        .unwrap();
        assert_eq!(count, 6);
        assert!(b.transform().unwrap().is_identity());

        let script = r#"[
            {"op":"translateTransform","dx":3,"dy":0},
            {"op":"resetTransform"}
        ]"#;
        apply_script(&mut b, script).unwrap();
        assert!(b.transform().unwrap().is_identity());
    }

    #[test]
    fn script_stops_at_first_error() {
        let mut b = brush();
        let err = apply_script(
            &mut b,
            r#"[
                {"op":"translateTransform","dx":5,"dy":0},
                {"op":"setWrapMode","mode":99},
                {"op":"resetTransform"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, BrushError::InvalidEnum { .. }));
        assert_eq!(b.transform().unwrap().dx, 5.0);
    }

    #[test]
    fn command_serialization_shape() {
        let json = serde_json::to_value(BrushCommand::ResetTransform).unwrap();
        assert_eq!(json["op"], "resetTransform");
    }

    #[test]
    fn directory_source_loads_files() {
        let dir = std::env::temp_dir().join(format!("texture_brush_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        img.save(dir.join("tile.png")).unwrap();

        let source = DirectoryImageSource::new(&dir);
        let brush = create_brush_from_json(r#"{"image":"tile.png"}"#, &source).unwrap();
        assert_eq!(brush.image().unwrap(), img);

        for key in ["missing.png", "../tile.png", "/etc/passwd"] {
            assert!(matches!(
                source.load(key),
                Err(BrushError::ImageNotFound(_))
            ));
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
