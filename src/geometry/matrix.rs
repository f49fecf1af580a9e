//! 2D affine matrix
//!
//! Six coefficients in row-vector convention:
//!
//! ```text
//! x' = m11 * x + m21 * y + dx
//! y' = m12 * x + m22 * y + dy
//! ```
//!
//! `Matrix` is `Copy`, so every getter hands out an independent value and
//! every setter stores one.

use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::core::errors::BrushError;

/// Per-coefficient tolerance used by [`Matrix::is_identity`]
pub const IDENTITY_EPSILON: f32 = 1e-5;

/// Whether a new transform is applied before or after the existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixOrder {
    /// New transform applied first
    #[default]
    Prepend = 0,
    /// New transform applied last
    Append = 1,
}

impl MatrixOrder {
    /// Lenient decoding: unknown codes fall back to the default order.
    pub fn from_code_or_default(code: i32) -> Self {
        Self::try_from(code).unwrap_or_else(|_| {
            tracing::warn!("Unknown matrix order {}, using {:?}", code, Self::default());
            Self::default()
        })
    }
}

impl TryFrom<i32> for MatrixOrder {
    type Error = BrushError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Prepend),
            1 => Ok(Self::Append),
            value => Err(BrushError::InvalidEnum {
                name: "MatrixOrder",
                value,
            }),
        }
    }
}

/// Affine transform: scale-x, shear-y, shear-x, scale-y, translate-x, translate-y
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn new(m11: f32, m12: f32, m21: f32, m22: f32, dx: f32, dy: f32) -> Self {
        Self {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn from_elements(e: [f32; 6]) -> Self {
        Self::new(e[0], e[1], e[2], e[3], e[4], e[5])
    }

    /// `[m11, m12, m21, m22, dx, dy]`
    pub const fn elements(&self) -> [f32; 6] {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
    }

    pub fn is_identity(&self) -> bool {
        let close = |a: f32, b: f32| (a - b).abs() <= IDENTITY_EPSILON;
        self.elements()
            .iter()
            .zip(Self::identity().elements().iter())
            .all(|(&a, &b)| close(a, b))
    }

    /// Determinant of the linear part, evaluated in f64
    pub fn determinant(&self) -> f64 {
        self.m11 as f64 * self.m22 as f64 - self.m12 as f64 * self.m21 as f64
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det != 0.0 && det.is_finite()
    }

    pub fn invert(&self) -> Option<Matrix> {
        if !self.is_invertible() {
            return None;
        }
        let det = self.determinant();
        let (m11, m12, m21, m22) = (
            self.m11 as f64,
            self.m12 as f64,
            self.m21 as f64,
            self.m22 as f64,
        );
        let (dx, dy) = (self.dx as f64, self.dy as f64);

        Some(Matrix::new(
            (m22 / det) as f32,
            (-m12 / det) as f32,
            (-m21 / det) as f32,
            (m11 / det) as f32,
            ((m21 * dy - m22 * dx) / det) as f32,
            ((m12 * dx - m11 * dy) / det) as f32,
        ))
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Compose with `other`
    pub fn multiply(&mut self, other: &Matrix, order: MatrixOrder) {
        *self = match order {
            MatrixOrder::Prepend => *other * *self,
            MatrixOrder::Append => *self * *other,
        };
    }

    /// Rotate by `angle` degrees, clockwise in y-down device space
    pub fn rotate(&mut self, angle: f32, order: MatrixOrder) {
        let (sin, cos) = (angle as f64).to_radians().sin_cos();
        let rotation = Matrix::new(cos as f32, sin as f32, -sin as f32, cos as f32, 0.0, 0.0);
        self.multiply(&rotation, order);
    }

    /// Scale rows (prepend) or columns (append) in place. No cross terms are
    /// formed, so extreme factors only touch the cells they scale.
    pub fn scale(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        match order {
            MatrixOrder::Prepend => {
                self.m11 *= sx;
                self.m12 *= sx;
                self.m21 *= sy;
                self.m22 *= sy;
            }
            MatrixOrder::Append => {
                self.m11 *= sx;
                self.m21 *= sx;
                self.dx *= sx;
                self.m12 *= sy;
                self.m22 *= sy;
                self.dy *= sy;
            }
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32, order: MatrixOrder) {
        match order {
            MatrixOrder::Prepend => {
                self.dx += tx * self.m11 + ty * self.m21;
                self.dy += tx * self.m12 + ty * self.m22;
            }
            MatrixOrder::Append => {
                self.dx += tx;
                self.dy += ty;
            }
        }
    }

    pub fn shear(&mut self, shear_x: f32, shear_y: f32, order: MatrixOrder) {
        let shear = Matrix::new(1.0, shear_y, shear_x, 1.0, 0.0, 0.0);
        self.multiply(&shear, order);
    }

    pub fn transform_point(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (
            self.m11 * x + self.m21 * y + self.dx,
            self.m12 * x + self.m22 * y + self.dy,
        )
    }
}

/// `a * b` applies `a` first, then `b`.
impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, b: Matrix) -> Matrix {
        let a = self;
        let f = |v: f32| v as f64;
        Matrix::new(
            (f(a.m11) * f(b.m11) + f(a.m12) * f(b.m21)) as f32,
            (f(a.m11) * f(b.m12) + f(a.m12) * f(b.m22)) as f32,
            (f(a.m21) * f(b.m11) + f(a.m22) * f(b.m21)) as f32,
            (f(a.m21) * f(b.m12) + f(a.m22) * f(b.m22)) as f32,
            (f(a.dx) * f(b.m11) + f(a.dy) * f(b.m21) + f(b.dx)) as f32,
            (f(a.dx) * f(b.m12) + f(a.dy) * f(b.m22) + f(b.dy)) as f32,
        )
    }
}
