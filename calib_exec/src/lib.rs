//! # Calibration library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items
//! defined inside the calibration executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulation client - drives the physics server over the sim_if protocol
pub mod sim_client;

/// Model generation - renders candidate model descriptions and stages them in the scratch area
pub mod model_gen;

/// Flexion trial module - runs one simulated flexion per candidate scale and scores it
pub mod flexion_trial;

/// Scale search module - grid search over the candidate scales
pub mod scale_search;
