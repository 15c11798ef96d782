use {
    macroquad::math::{DAffine2, DVec2},
    std::fmt,
};

// Tolerance used when comparing matrices element by element
const EPSILON: f64 = 1e-6;

/// An affine transform with coefficients `[a, b, c, d, e, f]`.
///
/// A point is mapped as `x' = a·x + c·y + e` and `y' = b·x + d·y + f`.
#[derive(Clone, Copy, Debug)]
pub struct Matrix(pub DAffine2);

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<DAffine2> for Matrix {
    fn from(affine: DAffine2) -> Self {
        Self(affine)
    }
}

impl Matrix {
    #[inline]
    #[must_use]
    pub fn identity() -> Self {
        Self(DAffine2::IDENTITY)
    }

    #[inline]
    #[must_use]
    pub fn from_coefficients(coefficients: [f64; 6]) -> Self {
        Self(DAffine2::from_cols_array(&coefficients))
    }

    #[inline]
    #[must_use]
    pub fn coefficients(&self) -> [f64; 6] {
        self.0.to_cols_array()
    }

    #[inline]
    #[must_use]
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self(DAffine2::from_translation(DVec2::new(tx, ty)))
    }

    #[inline]
    #[must_use]
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self(DAffine2::from_scale(DVec2::new(sx, sy)))
    }

    #[must_use]
    pub fn rotation(angle: f64) -> Self {
        Self(DAffine2::from_angle(angle))
    }

    #[must_use]
    pub fn from_rects(src: [f64; 4], dst: [f64; 4]) -> Self {
        let x_scale = (dst[2] - dst[0]) / (src[2] - src[0]);
        let y_scale = (dst[3] - dst[1]) / (src[3] - src[1]);
        let x_offset = dst[0] - src[0] * x_scale;
        let y_offset = dst[1] - src[1] * y_scale;
        Self::from_coefficients([x_scale, 0.0, 0.0, y_scale, x_offset, y_offset])
    }

    #[inline]
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.0.matrix2.determinant()
    }

    #[inline]
    #[must_use]
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.0.transform_point2(DVec2::new(x, y)).into()
    }

    pub fn transform(&self, points: &mut [f64]) {
        for point in points.chunks_exact_mut(2) {
            (point[0], point[1]) = self.transform_point(point[0], point[1]);
        }
    }

    #[inline]
    #[must_use]
    pub fn vector_transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.0.transform_vector2(DVec2::new(x, y)).into()
    }

    pub fn vector_transform(&self, points: &mut [f64]) {
        for point in points.chunks_exact_mut(2) {
            (point[0], point[1]) = self.vector_transform_point(point[0], point[1]);
        }
    }

    #[must_use]
    pub fn transform_rectangle(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> (f64, f64, f64, f64) {
        let corners = [
            self.transform_point(x0, y0),
            self.transform_point(x1, y0),
            self.transform_point(x1, y1),
            self.transform_point(x0, y1),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    #[must_use]
    pub fn inverse_transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.0.inverse().transform_point2(DVec2::new(x, y)).into()
    }

    pub fn inverse_transform(&self, points: &mut [f64]) {
        let inverse = self.inverted();
        inverse.transform(points);
    }

    pub fn inverse(&mut self) {
        self.0 = self.0.inverse();
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.inverse();
        self
    }

    /// Compose `other` onto this transform so that `other` is applied first:
    /// afterwards `self.transform_point(p) == old_self(other(p))`.
    pub fn compose(&mut self, other: &Matrix) {
        self.0 = self.0 * other.0;
    }

    #[must_use]
    pub fn then(mut self, other: &Matrix) -> Self {
        self.compose(other);
        self
    }

    #[inline]
    pub fn rotate(&mut self, angle: f64) {
        self.compose(&Self::rotation(angle));
    }

    #[inline]
    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.compose(&Self::translation(tx, ty));
    }

    #[inline]
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.compose(&Self::scaling(sx, sy));
    }

    #[inline]
    #[must_use]
    pub fn translation_offset(&self) -> (f64, f64) {
        self.0.translation.into()
    }

    #[inline]
    #[must_use]
    pub fn scale_factors(&self) -> (f64, f64) {
        (self.0.matrix2.x_axis.x, self.0.matrix2.y_axis.y)
    }

    #[must_use]
    pub fn get_scale(&self) -> f64 {
        let [a, b, c, d, ..] = self.coefficients();
        ((a * a + b * b + c * c + d * d) / 2.0).sqrt()
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    #[must_use]
    pub fn is_translation(&self) -> bool {
        let [a, b, c, d, ..] = self.coefficients();
        fequals(a, 1.0) && fequals(b, 0.0) && fequals(c, 0.0) && fequals(d, 1.0)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

#[inline]
fn fequals(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        let (lhs, rhs) = (self.coefficients(), other.coefficients());
        lhs.iter().zip(rhs.iter()).all(|(a, b)| fequals(*a, *b))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.coefficients();
        write!(f, "[{a}, {b}, {c}, {d}, {e}, {g}]")
    }
}
