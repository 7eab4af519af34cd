//! Trajectory sampling for the flexion motion.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use nalgebra::{Quaternion, Vector3};

use crate::sim_client::{ActuatorRef, BodyRef, ResolvedRefs, SimClientError};

use super::calc_cor_offset::local_cor_offset;
use super::QUAT_NORM_WARN_TOL;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A sampled trajectory of centre of rotation offsets.
///
/// Each sample is the offset of the human elbow centre of rotation from the device joint centre,
/// expressed in the device body's frame.
///
/// Units: meters
pub type Trajectory = Vec<Vector3<f64>>;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The simulation operations a flexion trial needs.
///
/// [`crate::sim_client::SimSession`] implements this over the server link. Tests implement it
/// with local stubs.
pub trait FlexionSim {
    /// Get the world position and orientation of a body.
    fn body_pose(
        &mut self,
        body: &BodyRef,
    ) -> Result<(Vector3<f64>, Quaternion<f64>), SimClientError>;

    /// Set an actuator's control value. The value persists until overwritten.
    fn set_ctrl(&mut self, actuator: &ActuatorRef, value: f64) -> Result<(), SimClientError>;

    /// Advance the simulation by one step.
    fn step(&mut self) -> Result<(), SimClientError>;
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Drive the flexion motion and sample the centre of rotation offset at each step.
///
/// The drive value is applied once before the motion; the simulation holds it for all steps. At
/// each step the offset is sampled from the current state first and the simulation stepped
/// afterwards, so the first sample sees the freshly loaded model before any integration.
pub fn sample_trajectory<S: FlexionSim>(
    sim: &mut S,
    refs: &ResolvedRefs,
    drive_value: f64,
    num_steps: usize,
) -> Result<Trajectory, SimClientError> {
    let mut trajectory = Trajectory::with_capacity(num_steps);

    sim.set_ctrl(&refs.actuator, drive_value)?;

    for _ in 0..num_steps {
        let (human_body_pos_m, _) = sim.body_pose(&refs.human_body)?;
        let (act_body_pos_m, act_body_quat) = sim.body_pose(&refs.actuator_body)?;

        check_quat_norm(&act_body_quat, &refs.actuator_body);

        // World positions of the two joint centres
        let human_centre_m = human_body_pos_m + refs.human_joint.pos_local_m;
        let act_centre_m = act_body_pos_m + refs.actuator_joint.pos_local_m;

        let sample_m = local_cor_offset(&human_centre_m, &act_centre_m, &act_body_quat);

        sim.step()?;

        trajectory.push(sample_m);
    }

    Ok(trajectory)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Warn if a body orientation quaternion has drifted away from unit norm.
fn check_quat_norm(quat: &Quaternion<f64>, body: &BodyRef) {
    let norm_error = (quat.norm() - 1.0).abs();

    if norm_error > QUAT_NORM_WARN_TOL {
        warn!(
            "Orientation quaternion of body {:?} has norm error {:.3e}",
            body.name, norm_error
        );
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_client::JointRef;

    /// Simulation stub whose human body slides along x by a millimeter per step.
    struct StubSim {
        steps_taken: usize,
        ctrl: Option<f64>,
        fail_at_step: Option<usize>,
    }

    impl StubSim {
        fn new(fail_at_step: Option<usize>) -> Self {
            Self {
                steps_taken: 0,
                ctrl: None,
                fail_at_step,
            }
        }
    }

    impl FlexionSim for StubSim {
        fn body_pose(
            &mut self,
            body: &BodyRef,
        ) -> Result<(Vector3<f64>, Quaternion<f64>), SimClientError> {
            if let Some(fail_at) = self.fail_at_step {
                if self.steps_taken >= fail_at {
                    return Err(SimClientError::EngineFault("stub fault".into()));
                }
            }

            let pos_m = if body.name == "human" {
                Vector3::new(0.001 * self.steps_taken as f64, 0.0, 0.0)
            } else {
                Vector3::zeros()
            };

            Ok((pos_m, Quaternion::identity()))
        }

        fn set_ctrl(
            &mut self,
            _actuator: &ActuatorRef,
            value: f64,
        ) -> Result<(), SimClientError> {
            assert!(self.ctrl.is_none(), "control value set more than once");
            self.ctrl = Some(value);
            Ok(())
        }

        fn step(&mut self) -> Result<(), SimClientError> {
            assert!(self.ctrl.is_some(), "stepped before the drive was applied");
            self.steps_taken += 1;
            Ok(())
        }
    }

    fn test_refs() -> ResolvedRefs {
        ResolvedRefs {
            human_joint: JointRef {
                id: 0,
                pos_local_m: Vector3::zeros(),
            },
            human_body: BodyRef {
                id: 0,
                name: "human".into(),
            },
            actuator_joint: JointRef {
                id: 1,
                pos_local_m: Vector3::zeros(),
            },
            actuator_body: BodyRef {
                id: 1,
                name: "device".into(),
            },
            actuator: ActuatorRef {
                id: 0,
                name: "drive".into(),
            },
        }
    }

    #[test]
    fn test_sample_count_and_order() {
        let mut sim = StubSim::new(None);
        let refs = test_refs();

        let trajectory = sample_trajectory(&mut sim, &refs, 0.3, 5).unwrap();

        assert_eq!(trajectory.len(), 5);
        assert_eq!(sim.ctrl, Some(0.3));
        assert_eq!(sim.steps_taken, 5);

        // Sample i must be taken before step i, so it sees i steps of motion
        for (i, sample_m) in trajectory.iter().enumerate() {
            assert!((sample_m.x - 0.001 * i as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fault_aborts() {
        let mut sim = StubSim::new(Some(3));
        let refs = test_refs();

        let result = sample_trajectory(&mut sim, &refs, 0.3, 10);

        assert!(matches!(result, Err(SimClientError::EngineFault(_))));
    }
}
