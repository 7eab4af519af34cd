//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Quaternion;
use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Produce `num` evenly spaced values over `[start, end]`, inclusive of both
/// endpoints.
///
/// Both endpoints are produced exactly rather than by accumulation. With
/// `num == 1` only `start` is returned, and `num == 0` gives an empty vector.
pub fn linspace<T>(start: T, end: T, num: usize) -> Vec<T>
where
    T: Float
{
    if num == 0 {
        return Vec::new();
    }
    if num == 1 {
        return vec![start];
    }

    let first = T::from(0).unwrap();
    let last = T::from(num - 1).unwrap();

    let mut values = Vec::with_capacity(num);

    for i in 0..num {
        if i == num - 1 {
            values.push(end);
        }
        else {
            values.push(lin_map(
                (first, last),
                (start, end),
                T::from(i).unwrap(),
            ));
        }
    }

    values
}

/// Hamilton product `q1 * q0` of two quaternions, in that order.
///
/// The product is written out in components so that the operand order is
/// explicit. Quaternion multiplication is not commutative: `quat_mul(a, b)`
/// composes `b` followed by `a`. No normalisation is applied to either the
/// inputs or the result.
pub fn quat_mul(q1: &Quaternion<f64>, q0: &Quaternion<f64>) -> Quaternion<f64> {
    Quaternion::new(
        q1.w * q0.w - q1.i * q0.i - q1.j * q0.j - q1.k * q0.k,
        q1.w * q0.i + q1.i * q0.w + q1.j * q0.k - q1.k * q0.j,
        q1.w * q0.j - q1.i * q0.k + q1.j * q0.w + q1.k * q0.i,
        q1.w * q0.k + q1.i * q0.j - q1.j * q0.i + q1.k * q0.w,
    )
}

#[cfg(test)]
mod test {
    use super::*;

    const FLOAT_TOL: f64 = 1e-12;

    #[test]
    fn test_linspace_endpoints() {
        let vals = linspace(0.8488f64, 0.88f64, 10);

        assert_eq!(vals.len(), 10);
        assert_eq!(vals[0], 0.8488);
        assert_eq!(vals[9], 0.88);

        // Spacing should be uniform to within float tolerance
        let step = (0.88f64 - 0.8488f64) / 9f64;
        for i in 1..10 {
            assert!((vals[i] - vals[i - 1] - step).abs() < FLOAT_TOL);
        }
    }

    #[test]
    fn test_linspace_degenerate() {
        assert_eq!(linspace(1f64, 2f64, 1), vec![1f64]);
        assert!(linspace(1f64, 2f64, 0).is_empty());
    }

    #[test]
    fn test_quat_mul_identity() {
        let ident = Quaternion::new(1f64, 0f64, 0f64, 0f64);
        let q = Quaternion::new(0.5f64, -0.5f64, 0.5f64, 0.5f64);

        assert_eq!(quat_mul(&ident, &q), q);
        assert_eq!(quat_mul(&q, &ident), q);
    }

    #[test]
    fn test_quat_mul_non_commutative() {
        // Quarter turns about x and about y compose differently depending on
        // order
        let half_sqrt_2 = 0.5f64.sqrt();
        let qx = Quaternion::new(half_sqrt_2, half_sqrt_2, 0f64, 0f64);
        let qy = Quaternion::new(half_sqrt_2, 0f64, half_sqrt_2, 0f64);

        let xy = quat_mul(&qx, &qy);
        let yx = quat_mul(&qy, &qx);

        assert!((xy.k - yx.k).abs() > FLOAT_TOL);
    }

    #[test]
    fn test_quat_mul_matches_nalgebra() {
        // The written-out formula should agree with nalgebra's own product
        let a = Quaternion::new(0.2f64, -1.3f64, 0.7f64, 2.1f64);
        let b = Quaternion::new(-0.4f64, 0.5f64, 1.9f64, -0.8f64);

        let ours = quat_mul(&a, &b);
        let theirs = a * b;

        assert!((ours.w - theirs.w).abs() < FLOAT_TOL);
        assert!((ours.i - theirs.i).abs() < FLOAT_TOL);
        assert!((ours.j - theirs.j).abs() < FLOAT_TOL);
        assert!((ours.k - theirs.k).abs() < FLOAT_TOL);
    }
}
