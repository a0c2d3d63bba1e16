//! 2D affine transformations.
//!
//! Canvas-changing operations (shadows, padding, resizing) move the image
//! content. They report that movement by appending to a caller supplied
//! [`Transform2D`], so overlay elements positioned in the old coordinate
//! space can be mapped onto the new image.

/// A 2D affine transformation matrix.
///
/// Stored as a 3x2 matrix in column-major order:
/// ```text
/// | m00 m10 m20 |   | scale_x  skew_x   translate_x |
/// | m01 m11 m21 | = | skew_y   scale_y  translate_y |
/// ```
///
/// # Examples
///
/// ```
/// use pixelshot_gfx::Transform2D;
///
/// // Transforms are composed right-to-left with `then`
/// // (first translate, then scale)
/// let transform = Transform2D::scale(2.0)
///     .then(&Transform2D::translate(10.0, 0.0));
/// assert_eq!(transform.transform_point(5.0, 0.0), (30.0, 0.0));
///
/// // `append_*` applies the new operation after everything already recorded
/// let mut recorded = Transform2D::translate(10.0, 0.0);
/// recorded.append_scale(2.0, 2.0);
/// assert_eq!(recorded.transform_point(5.0, 0.0), (30.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Matrix elements in column-major order.
    m: [f32; 6],
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    /// The identity transform (no transformation).
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Create a translation transform.
    #[inline]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    /// Create a uniform scaling transform.
    #[inline]
    pub const fn scale(s: f32) -> Self {
        Self::scale_xy(s, s)
    }

    /// Create a non-uniform scaling transform.
    #[inline]
    pub const fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Concatenate this transform with another (self * other).
    ///
    /// The resulting transform first applies `other`, then `self`.
    #[inline]
    pub fn then(&self, other: &Self) -> Self {
        let a = &self.m;
        let b = &other.m;
        Self {
            m: [
                a[0] * b[0] + a[2] * b[1],
                a[1] * b[0] + a[3] * b[1],
                a[0] * b[2] + a[2] * b[3],
                a[1] * b[2] + a[3] * b[3],
                a[0] * b[4] + a[2] * b[5] + a[4],
                a[1] * b[4] + a[3] * b[5] + a[5],
            ],
        }
    }

    /// Record a translation applied after the current transform.
    #[inline]
    pub fn append_translation(&mut self, tx: f32, ty: f32) {
        *self = Self::translate(tx, ty).then(self);
    }

    /// Record a scale applied after the current transform.
    #[inline]
    pub fn append_scale(&mut self, sx: f32, sy: f32) {
        *self = Self::scale_xy(sx, sy).then(self);
    }

    /// Transform a point.
    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.m[0] * x + self.m[2] * y + self.m[4],
            self.m[1] * x + self.m[3] * y + self.m[5],
        )
    }

    /// Get the translation component.
    #[inline]
    pub fn translation(&self) -> (f32, f32) {
        (self.m[4], self.m[5])
    }

    /// Check if this is the identity transform.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}
