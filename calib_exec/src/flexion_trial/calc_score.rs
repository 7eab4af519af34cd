//! Trajectory scoring.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Get the component-wise mean of a trajectory of offset samples.
///
/// An empty trajectory is rejected upstream by the parameter validation, so the sample count is
/// always at least one here.
///
/// Units: meters
pub fn mean_offset(trajectory: &[Vector3<f64>]) -> Vector3<f64> {
    let mut sum_m = Vector3::zeros();

    for sample_m in trajectory {
        sum_m += sample_m;
    }

    sum_m / trajectory.len() as f64
}

/// Score a trajectory as the norm of its mean offset.
///
/// Lower is better. A trial whose offsets cancel over the motion scores near zero even if the
/// individual samples are large.
///
/// Units: meters
pub fn score_trajectory(trajectory: &[Vector3<f64>]) -> f64 {
    mean_offset(trajectory).norm()
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
    fn test_score_order_invariant() {
        let trajectory = vec![
            Vector3::new(0.01, 0.0, -0.02),
            Vector3::new(0.03, -0.01, 0.0),
            Vector3::new(-0.02, 0.02, 0.01),
        ];

        let mut reversed = trajectory.clone();
        reversed.reverse();

        assert!((score_trajectory(&trajectory) - score_trajectory(&reversed)).abs() < FLOAT_TOL);
    }

    #[test]
    fn test_score_negation_invariant() {
        let trajectory = vec![Vector3::new(0.01, -0.02, 0.03), Vector3::new(0.02, 0.0, 0.01)];
        let negated: Vec<_> = trajectory.iter().map(|v| -v).collect();

        assert!((score_trajectory(&trajectory) - score_trajectory(&negated)).abs() < FLOAT_TOL);
    }

    #[test]
    fn test_constant_trajectory_scores_its_norm() {
        let offset_m = Vector3::new(0.003, -0.004, 0.0);
        let trajectory = vec![offset_m; 10];

        assert!((score_trajectory(&trajectory) - offset_m.norm()).abs() < FLOAT_TOL);
    }

    #[test]
    fn test_cancelling_offsets_score_zero() {
        let offset_m = Vector3::new(0.01, 0.02, -0.01);
        let trajectory = vec![offset_m, -offset_m];

        assert!(score_trajectory(&trajectory).abs() < FLOAT_TOL);
    }
}
