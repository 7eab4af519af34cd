//! Parameters for the scale search module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Scale search parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Lower bound of the scale range, inclusive.
    pub scale_lb: f64,

    /// Upper bound of the scale range, inclusive.
    pub scale_ub: f64,

    /// Number of candidates spread uniformly over the range.
    pub num_candidates: usize,
}
