//! Dimension-specific math for the transform tree.
//!
//! A [`Space`] bundles the vector, angle and homogeneous matrix types for one
//! dimensionality together with the handful of operations the tree needs. The
//! tree itself is written once against this trait.
use std::{
    f32::consts::TAU,
    fmt,
    ops::{Index, IndexMut, Mul},
};

use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector1, Vector2, Vector3};

pub trait Space: Copy + PartialEq + fmt::Debug + 'static {
    /// Positions and scales.
    type Vector: Copy
        + PartialEq
        + fmt::Debug
        + Index<usize, Output = f32>
        + IndexMut<usize>;
    /// One angle per rotation plane.
    type Angles: Copy
        + PartialEq
        + fmt::Debug
        + Index<usize, Output = f32>
        + IndexMut<usize>;
    /// Homogeneous transformation matrix.
    type Matrix: Copy + PartialEq + fmt::Debug + Mul<Output = Self::Matrix>;

    /// Number of axes.
    const AXES: usize;
    /// Number of rotation planes.
    const PLANES: usize;

    fn zero() -> Self::Vector;
    fn unit_scale() -> Self::Vector;
    fn zero_angles() -> Self::Angles;
    fn identity() -> Self::Matrix;

    /// Identity with `scale` on the diagonal and `position` in the translation
    /// column.
    fn scale_translation(scale: &Self::Vector, position: &Self::Vector) -> Self::Matrix;

    /// Composes the per-plane rotations in this space's fixed plane order.
    fn rotation(angles: &Self::Angles) -> Self::Matrix;

    fn transform_point(matrix: &Self::Matrix, point: &Self::Vector) -> Self::Vector;
    fn try_inverse(matrix: &Self::Matrix) -> Option<Self::Matrix>;
    fn is_finite(matrix: &Self::Matrix) -> bool;
}

/// Reduces an angle into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Wraps every component of an angle set.
pub fn wrap_angles<S: Space>(mut angles: S::Angles) -> S::Angles {
    for plane in 0..S::PLANES {
        angles[plane] = wrap_angle(angles[plane]);
    }
    angles
}

/// Three axes, rotations about x, y and z. Planes are applied z first, then y,
/// then x.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Space3;

impl Space for Space3 {
    type Vector = Vector3<f32>;
    type Angles = Vector3<f32>;
    type Matrix = Matrix4<f32>;

    const AXES: usize = 3;
    const PLANES: usize = 3;

    fn zero() -> Vector3<f32> {
        Vector3::zeros()
    }

    fn unit_scale() -> Vector3<f32> {
        Vector3::repeat(1.0)
    }

    fn zero_angles() -> Vector3<f32> {
        Vector3::zeros()
    }

    fn identity() -> Matrix4<f32> {
        Matrix4::identity()
    }

    fn scale_translation(scale: &Vector3<f32>, position: &Vector3<f32>) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        for axis in 0..3 {
            matrix[(axis, axis)] = scale[axis];
            matrix[(axis, 3)] = position[axis];
        }
        matrix
    }

    fn rotation(angles: &Vector3<f32>) -> Matrix4<f32> {
        let planes = [
            (Vector3::z_axis(), angles.z),
            (Vector3::y_axis(), angles.y),
            (Vector3::x_axis(), angles.x),
        ];
        planes
            .iter()
            .filter(|(_, angle)| *angle != 0.0)
            .fold(Matrix4::identity(), |acc, (axis, angle)| {
                Matrix4::from_axis_angle(axis, *angle) * acc
            })
    }

    fn transform_point(matrix: &Matrix4<f32>, point: &Vector3<f32>) -> Vector3<f32> {
        matrix.transform_point(&Point3::from(*point)).coords
    }

    fn try_inverse(matrix: &Matrix4<f32>) -> Option<Matrix4<f32>> {
        matrix.try_inverse()
    }

    fn is_finite(matrix: &Matrix4<f32>) -> bool {
        matrix.iter().all(|f| f32::is_finite(*f))
    }
}

/// Two axes, a single rotation plane.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Space2;

impl Space for Space2 {
    type Vector = Vector2<f32>;
    type Angles = Vector1<f32>;
    type Matrix = Matrix3<f32>;

    const AXES: usize = 2;
    const PLANES: usize = 1;

    fn zero() -> Vector2<f32> {
        Vector2::zeros()
    }

    fn unit_scale() -> Vector2<f32> {
        Vector2::repeat(1.0)
    }

    fn zero_angles() -> Vector1<f32> {
        Vector1::zeros()
    }

    fn identity() -> Matrix3<f32> {
        Matrix3::identity()
    }

    fn scale_translation(scale: &Vector2<f32>, position: &Vector2<f32>) -> Matrix3<f32> {
        let mut matrix = Matrix3::identity();
        for axis in 0..2 {
            matrix[(axis, axis)] = scale[axis];
            matrix[(axis, 2)] = position[axis];
        }
        matrix
    }

    fn rotation(angles: &Vector1<f32>) -> Matrix3<f32> {
        if angles.x == 0.0 {
            Matrix3::identity()
        } else {
            Matrix3::new_rotation(angles.x)
        }
    }

    fn transform_point(matrix: &Matrix3<f32>, point: &Vector2<f32>) -> Vector2<f32> {
        matrix.transform_point(&Point2::from(*point)).coords
    }

    fn try_inverse(matrix: &Matrix3<f32>) -> Option<Matrix3<f32>> {
        matrix.try_inverse()
    }

    fn is_finite(matrix: &Matrix3<f32>) -> bool {
        matrix.iter().all(|f| f32::is_finite(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPSILON: f32 = 1e-5;

    fn close3(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).norm() < EPSILON
    }

    #[test]
    fn angles_wrap_into_one_turn() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!((wrap_angle(TAU + 1.0) - 1.0).abs() < EPSILON);
        assert!((wrap_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < EPSILON);
        assert!(wrap_angle(-1e-9) < TAU);

        let wrapped = wrap_angles::<Space3>(Vector3::new(3.0 * PI, -PI, 0.5));
        assert!(close3(wrapped, Vector3::new(PI, PI, 0.5)));
    }

    #[test]
    fn scale_translation_layout() {
        let m = Space3::scale_translation(&Vector3::new(2.0, 3.0, 4.0), &Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(1, 1)], 3.0);
        assert_eq!(m[(2, 2)], 4.0);
        assert_eq!(m[(3, 3)], 1.0);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
        assert_eq!(m[(0, 1)], 0.0);
    }

    #[test]
    fn zero_angles_give_identity() {
        assert_eq!(Space3::rotation(&Vector3::zeros()), Matrix4::identity());
        assert_eq!(Space2::rotation(&Vector1::zeros()), Matrix3::identity());
    }

    #[test]
    fn single_plane_rotations_are_counter_clockwise() {
        let about_z = Space3::rotation(&Vector3::new(0.0, 0.0, FRAC_PI_2));
        let p = Space3::transform_point(&about_z, &Vector3::x());
        assert!(close3(p, Vector3::y()));

        let about_x = Space3::rotation(&Vector3::new(FRAC_PI_2, 0.0, 0.0));
        let p = Space3::transform_point(&about_x, &Vector3::y());
        assert!(close3(p, Vector3::z()));

        let flat = Space2::rotation(&Vector1::new(FRAC_PI_2));
        let p = Space2::transform_point(&flat, &Vector2::x());
        assert!((p - Vector2::y()).norm() < EPSILON);
    }

    #[test]
    fn planes_compose_z_then_y_then_x() {
        let angles = Vector3::new(0.3, 0.7, 1.1);
        let expected = Matrix4::from_axis_angle(&Vector3::x_axis(), 0.3)
            * Matrix4::from_axis_angle(&Vector3::y_axis(), 0.7)
            * Matrix4::from_axis_angle(&Vector3::z_axis(), 1.1);
        let built = Space3::rotation(&angles);
        assert!((built - expected).norm() < EPSILON);
    }

    #[test]
    fn z_plane_reaches_the_point_first() {
        let both = Space3::rotation(&Vector3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        // x -> y about z, then y -> z about x
        let p = Space3::transform_point(&both, &Vector3::x());
        assert!(close3(p, Vector3::z()));
    }

    #[test]
    fn singular_matrices_have_no_inverse() {
        let flat = Space3::scale_translation(&Vector3::new(1.0, 0.0, 1.0), &Vector3::zeros());
        assert!(Space3::try_inverse(&flat).is_none());
        assert!(Space3::is_finite(&flat));
    }
}
