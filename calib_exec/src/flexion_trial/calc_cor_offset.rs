//! Centre of rotation offset calculation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Quaternion, Vector3};
use util::maths::quat_mul;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Express the offset of the human joint centre from the device joint centre in the device
/// body's frame.
///
/// The world displacement (human minus device) is composed with the device body orientation by a
/// single quaternion product, taking the vector part of `q * (0, d)` as the local offset. The
/// orientation quaternion is used as recieved from the simulation, without renormalisation.
pub fn local_cor_offset(
    human_centre_m: &Vector3<f64>,
    act_centre_m: &Vector3<f64>,
    act_body_quat: &Quaternion<f64>,
) -> Vector3<f64> {
    let displacement_m = human_centre_m - act_centre_m;

    let pure = Quaternion::new(
        0.0,
        displacement_m.x,
        displacement_m.y,
        displacement_m.z,
    );

    let composed = quat_mul(act_body_quat, &pure);

    Vector3::new(composed.i, composed.j, composed.k)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Maximum allowed error in floating point comparisons
    const FLOAT_TOL: f64 = 1e-12;

    #[test]
    fn test_zero_displacement() {
        let centre_m = Vector3::new(0.1, -0.2, 0.3);
        let quat = Quaternion::new(0.5, 0.5, 0.5, 0.5);

        let offset_m = local_cor_offset(&centre_m, &centre_m, &quat);

        assert_eq!(offset_m, Vector3::zeros());
    }

    #[test]
    fn test_identity_orientation_passthrough() {
        let human_m = Vector3::new(0.31, 0.02, -0.05);
        let act_m = Vector3::new(0.30, 0.00, -0.05);

        let offset_m = local_cor_offset(&human_m, &act_m, &Quaternion::identity());

        assert!((offset_m.x - 0.01).abs() < FLOAT_TOL);
        assert!((offset_m.y - 0.02).abs() < FLOAT_TOL);
        assert!(offset_m.z.abs() < FLOAT_TOL);
    }

    #[test]
    fn test_single_composition_semantics() {
        // A quarter turn about z applied to a unit x displacement by a single product gives
        // components (cos 45, sin 45, 0), not the rotated vector a full conjugation would give.
        let half = std::f64::consts::FRAC_PI_4;
        let quat = Quaternion::new(half.cos(), 0.0, 0.0, half.sin());

        let human_m = Vector3::new(1.0, 0.0, 0.0);
        let act_m = Vector3::zeros();

        let offset_m = local_cor_offset(&human_m, &act_m, &quat);

        assert!((offset_m.x - half.cos()).abs() < FLOAT_TOL);
        assert!((offset_m.y - half.sin()).abs() < FLOAT_TOL);
        assert!(offset_m.z.abs() < FLOAT_TOL);
    }

    #[test]
    fn test_conjugate_round_trip() {
        // Multiplying by the conjugate recovers the original displacement, provided the full
        // quaternion product is kept rather than just its vector part.
        let axis = Vector3::new(1.0, 2.0, -0.5).normalize();
        let half_angle = 0.6f64;
        let quat = Quaternion::new(
            half_angle.cos(),
            half_angle.sin() * axis.x,
            half_angle.sin() * axis.y,
            half_angle.sin() * axis.z,
        );

        let displacement_m = Vector3::new(0.01, -0.02, 0.005);
        let pure = Quaternion::new(
            0.0,
            displacement_m.x,
            displacement_m.y,
            displacement_m.z,
        );

        let composed = quat_mul(&quat, &pure);
        let recovered = quat_mul(&quat.conjugate(), &composed);

        assert!(recovered.w.abs() < FLOAT_TOL);
        assert!((recovered.i - displacement_m.x).abs() < FLOAT_TOL);
        assert!((recovered.j - displacement_m.y).abs() < FLOAT_TOL);
        assert!((recovered.k - displacement_m.z).abs() < FLOAT_TOL);
    }
}
