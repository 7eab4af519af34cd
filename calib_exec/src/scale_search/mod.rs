//! # Scale Search Module
//!
//! This module sweeps the upper arm scale factor over a uniform grid and selects the candidate
//! whose flexion trial scores lowest. Candidates are evaluated in ascending order and every
//! candidate's score is archived, so a sweep can be analysed offline even when the minimum sits
//! at an endpoint.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::Params;
pub use state::{ScaleSearch, SearchResult};

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ScaleSearchError {
    #[error("Could not load the search parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not initialise the candidate archive: {0}")]
    ArchiveInitError(String),

    #[error("The scale range [{lb}, {ub}] is inverted")]
    InvalidScaleRange { lb: f64, ub: f64 },

    #[error("The search needs at least one candidate")]
    NoCandidates,

    #[error("A trial failed, aborting the search: {0}")]
    TrialFailed(crate::flexion_trial::TrialError),
}
