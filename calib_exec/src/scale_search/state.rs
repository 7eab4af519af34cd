//! Scale search state machine.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Serialize;

use util::{archive::Archiver, maths::linspace, params, session::Session};

use crate::flexion_trial::{TrialError, TrialReport};

use super::{Params, ScaleSearchError};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Grid search over the scale range.
pub struct ScaleSearch {
    params: Params,

    /// Archive of every candidate evaluation in this session.
    arch_candidates: Archiver,
}

/// The outcome of a completed search.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    /// The candidate with the lowest score.
    pub best_scale: f64,

    /// The score of the best candidate.
    ///
    /// Units: meters
    pub best_score_m: f64,

    /// Number of candidates evaluated.
    pub num_candidates: usize,
}

/// One archived candidate evaluation.
#[derive(Serialize)]
struct CandidateRecord {
    candidate: usize,
    scale: f64,
    score_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ScaleSearch {
    /// Initialise the search from its parameter file.
    pub fn init(params_path: &str, session: &Session) -> Result<Self, ScaleSearchError> {
        let params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(ScaleSearchError::ParamLoadError(e)),
        };

        let arch_candidates = Archiver::from_path(session, "scale_search/candidates.csv")
            .map_err(|e| ScaleSearchError::ArchiveInitError(e.to_string()))?;

        Ok(Self {
            params,
            arch_candidates,
        })
    }

    /// Override parts of the configured range with values from the command line.
    pub fn set_range(
        &mut self,
        scale_lb: Option<f64>,
        scale_ub: Option<f64>,
        num_candidates: Option<usize>,
    ) {
        if let Some(lb) = scale_lb {
            self.params.scale_lb = lb;
        }
        if let Some(ub) = scale_ub {
            self.params.scale_ub = ub;
        }
        if let Some(n) = num_candidates {
            self.params.num_candidates = n;
        }
    }

    /// Run the sweep, evaluating each candidate with the given closure.
    ///
    /// Candidates are evaluated in ascending order, and of equally scoring minima the lowest
    /// scale wins. A failed trial aborts the whole sweep, since later candidates would be
    /// compared against an incomplete picture.
    pub fn run<F>(&mut self, mut eval_candidate: F) -> Result<SearchResult, ScaleSearchError>
    where
        F: FnMut(f64) -> Result<(f64, TrialReport), TrialError>,
    {
        if self.params.num_candidates == 0 {
            return Err(ScaleSearchError::NoCandidates);
        }

        if self.params.scale_lb > self.params.scale_ub {
            return Err(ScaleSearchError::InvalidScaleRange {
                lb: self.params.scale_lb,
                ub: self.params.scale_ub,
            });
        }

        let candidates = linspace(
            self.params.scale_lb,
            self.params.scale_ub,
            self.params.num_candidates,
        );

        let mut best_scale = self.params.scale_lb;
        let mut best_score_m = std::f64::INFINITY;

        for (candidate, &scale) in candidates.iter().enumerate() {
            let (score_m, report) =
                eval_candidate(scale).map_err(ScaleSearchError::TrialFailed)?;

            info!("Scale: {}; score: {}", scale, score_m);
            debug!(
                "Mean offset over {} steps: {:?}",
                report.num_steps, report.mean_cor_offset_m
            );

            // A failed archive write loses a record, not the sweep
            if let Err(e) = self.arch_candidates.serialise(CandidateRecord {
                candidate,
                scale,
                score_m,
            }) {
                warn!("Could not archive candidate {}: {}", candidate, e);
            }

            if score_m < best_score_m {
                best_scale = scale;
                best_score_m = score_m;
            }
        }

        info!("Best scale: {}", best_scale);

        Ok(SearchResult {
            best_scale,
            best_score_m,
            num_candidates: self.params.num_candidates,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::flexion_trial::{sample_trajectory, score_trajectory, FlexionSim};
    use crate::sim_client::{ActuatorRef, BodyRef, JointRef, ResolvedRefs, SimClientError};
    use nalgebra::{Quaternion, Vector3};
    use std::path::PathBuf;

    fn search_with(params: Params) -> ScaleSearch {
        ScaleSearch {
            params,
            arch_candidates: Archiver::default(),
        }
    }

    fn dummy_report(scale: f64) -> TrialReport {
        TrialReport {
            scale,
            mean_cor_offset_m: [0.0; 3],
            num_steps: 1,
            model_path: PathBuf::new(),
        }
    }

    #[test]
    fn test_first_of_equal_minima_wins() {
        let mut search = search_with(Params {
            scale_lb: 0.0,
            scale_ub: 1.0,
            num_candidates: 2,
        });

        let result = search.run(|scale| Ok((1.0, dummy_report(scale)))).unwrap();

        assert_eq!(result.best_scale, 0.0);
        assert_eq!(result.best_score_m, 1.0);
    }

    #[test]
    fn test_single_candidate() {
        let mut search = search_with(Params {
            scale_lb: 0.86,
            scale_ub: 0.86,
            num_candidates: 1,
        });

        let result = search.run(|scale| Ok((0.5, dummy_report(scale)))).unwrap();

        assert_eq!(result.best_scale, 0.86);
        assert_eq!(result.num_candidates, 1);
    }

    #[test]
    fn test_rejects_empty_and_inverted() {
        let mut search = search_with(Params {
            scale_lb: 0.8,
            scale_ub: 0.9,
            num_candidates: 0,
        });

        assert!(matches!(
            search.run(|scale| Ok((0.0, dummy_report(scale)))),
            Err(ScaleSearchError::NoCandidates)
        ));

        let mut search = search_with(Params {
            scale_lb: 0.9,
            scale_ub: 0.8,
            num_candidates: 2,
        });

        assert!(matches!(
            search.run(|scale| Ok((0.0, dummy_report(scale)))),
            Err(ScaleSearchError::InvalidScaleRange { .. })
        ));
    }

    #[test]
    fn test_trial_failure_aborts() {
        let mut search = search_with(Params {
            scale_lb: 0.8,
            scale_ub: 0.9,
            num_candidates: 3,
        });

        let result = search.run(|_| Err(TrialError::NotInit));

        assert!(matches!(result, Err(ScaleSearchError::TrialFailed(_))));
    }

    /// Simulation stub whose human body sits at a fixed offset from the device body.
    struct ConstOffsetSim {
        offset_x_m: f64,
    }

    impl FlexionSim for ConstOffsetSim {
        fn body_pose(
            &mut self,
            body: &BodyRef,
        ) -> Result<(Vector3<f64>, Quaternion<f64>), SimClientError> {
            let pos_m = if body.name == "human" {
                Vector3::new(self.offset_x_m, 0.0, 0.0)
            } else {
                Vector3::zeros()
            };

            Ok((pos_m, Quaternion::identity()))
        }

        fn set_ctrl(
            &mut self,
            _actuator: &ActuatorRef,
            _value: f64,
        ) -> Result<(), SimClientError> {
            Ok(())
        }

        fn step(&mut self) -> Result<(), SimClientError> {
            Ok(())
        }
    }

    fn stub_refs() -> ResolvedRefs {
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
    fn test_search_selects_minimum_with_stubbed_trials() {
        let mut search = search_with(Params {
            scale_lb: 0.0,
            scale_ub: 1.0,
            num_candidates: 3,
        });

        let refs = stub_refs();

        // Map each candidate onto a fixed offset, lowest in the middle of the range. The grid
        // over [0, 1] with 3 candidates hits 0, 0.5 and 1 exactly.
        let result = search
            .run(|scale| {
                let offset_x_m = if scale == 0.0 {
                    2.0
                } else if scale == 0.5 {
                    0.1
                } else {
                    3.0
                };

                let mut sim = ConstOffsetSim { offset_x_m };
                let trajectory = sample_trajectory(&mut sim, &refs, 0.3, 4)
                    .map_err(TrialError::SimulationError)?;

                Ok((score_trajectory(&trajectory), dummy_report(scale)))
            })
            .unwrap();

        assert!((result.best_scale - 0.5).abs() < 1e-12);
        assert!((result.best_score_m - 0.1).abs() < 1e-12);
    }
}
