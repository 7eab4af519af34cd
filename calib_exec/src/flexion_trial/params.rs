//! Parameters for the flexion trial module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Flexion trial parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Path to the parametric model template, relative to the software root.
    pub template_path: String,

    /// Directory staged model descriptions are written into, relative to the software root.
    pub scratch_dir: String,

    /// Name of the template property carrying the scale candidate.
    pub scale_property: String,

    /// Fixed template properties substituted into every candidate, such as the path from the
    /// staged model back to the asset root.
    pub extra_properties: BTreeMap<String, String>,

    /// Name of the human elbow flexion joint in the model.
    pub human_joint_name: String,

    /// Name of the body the human elbow joint sits in.
    pub human_body_name: String,

    /// Name of the device joint actuating elbow flexion.
    pub actuator_joint_name: String,

    /// Name of the body the device joint sits in.
    pub actuator_body_name: String,

    /// Name of the actuator driving the flexion motion.
    pub actuator_name: String,

    /// Control value applied to the actuator for the whole motion.
    pub drive_value: f64,

    /// Number of simulation steps the motion is sampled over.
    pub num_steps: usize,
}
