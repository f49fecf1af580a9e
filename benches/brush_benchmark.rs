//! Texture brush benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use texture_brush::{apply_script, Matrix, MatrixOrder, Rect, TextureBrush};

fn generate_image(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8, 255])
    })
}

fn benchmark_brush_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Brush Creation");

    for size in [16u32, 64, 256, 1024].iter() {
        let image = generate_image(*size);

        group.bench_with_input(BenchmarkId::new("full", size), &image, |b, image| {
            b.iter(|| TextureBrush::new(image))
        });

        let half = (*size / 2) as i32;
        group.bench_with_input(BenchmarkId::new("region", size), &image, |b, image| {
            b.iter(|| TextureBrush::with_region(image, Rect::new(0, 0, half, half), None))
        });
    }

    group.finish();
}

fn benchmark_transform_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transform Composition");

    let mut brush = match TextureBrush::new(&generate_image(16)) {
        Ok(brush) => brush,
        Err(e) => panic!("failed to create brush: {}", e),
    };
    let skew = Matrix::new(1.0, 0.1, 0.2, 1.0, 3.0, 4.0);

    // Reset every iteration so repeated composition cannot drift to inf/NaN
    group.bench_function("rotate", |b| {
        b.iter(|| {
            (
                brush.reset_transform(),
                brush.rotate_transform(15.0, MatrixOrder::Prepend),
            )
        })
    });
    group.bench_function("multiply", |b| {
        b.iter(|| {
            (
                brush.reset_transform(),
                brush.multiply_transform(&skew, MatrixOrder::Append),
            )
        })
    });
    group.bench_function("scale_translate", |b| {
        b.iter(|| {
            (
                brush.reset_transform(),
                brush.scale_transform(1.01, 0.99, MatrixOrder::Prepend),
                brush.translate_transform(0.5, -0.5, MatrixOrder::Append),
            )
        })
    });

    let script = r#"[
        {"op":"rotateTransform","angle":30},
        {"op":"scaleTransform","sx":2,"sy":2},
        {"op":"translateTransform","dx":4,"dy":4,"order":1},
        {"op":"resetTransform"}
    ]"#;
    group.bench_function("script", |b| b.iter(|| apply_script(&mut brush, script)));

    group.finish();
}

criterion_group!(
    benches,
    benchmark_brush_creation,
    benchmark_transform_composition
);
criterion_main!(benches);
