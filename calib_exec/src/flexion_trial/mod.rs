//! # Flexion Trial Module
//!
//! This module runs a single calibration trial: generate the model description for one scale
//! candidate, load it into the simulation, drive the elbow through a flexion motion, and score
//! the drift between the human elbow centre of rotation and the device joint centre.
//!
//! [`TrialRunner`] is the module state machine. One `proc` call evaluates one candidate, making
//! each trial an independent unit with no state carried between candidates beyond the trial
//! index used to name staged files and reports.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod calc_cor_offset;
mod calc_score;
mod params;
mod sampler;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use calc_cor_offset::local_cor_offset;
pub use calc_score::{mean_offset, score_trajectory};
pub use params::Params;
pub use sampler::{sample_trajectory, FlexionSim, Trajectory};
pub use state::{TrialReport, TrialRunner};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tolerance on the norm of body orientation quaternions read from the simulation.
///
/// Quaternions are used as recieved, without renormalisation. A norm further than this from one
/// is logged as a warning since it indicates the simulation state is degrading.
pub const QUAT_NORM_WARN_TOL: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum TrialError {
    #[error("Could not load the trial parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("The software root environment variable (EXO_CALIB_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("The module has not been initialised")]
    NotInit,

    #[error("The configured number of flexion steps must be at least 1")]
    InvalidStepCount,

    #[error("Could not generate the candidate model description: {0}")]
    GenerationError(crate::model_gen::ModelGenError),

    #[error("Could not manage the scratch area: {0}")]
    ScratchError(crate::model_gen::ModelGenError),

    #[error("Could not resolve a model reference: {0}")]
    ResolutionError(crate::sim_client::SimClientError),

    #[error("Simulation failed: {0}")]
    SimulationError(crate::sim_client::SimClientError),
}
