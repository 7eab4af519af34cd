//! Flexion trial state machine.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use std::path::PathBuf;

use util::{
    host,
    module::State,
    params,
    session::{self, Session},
};

use crate::model_gen::{ModelTemplate, ScratchArea};
use crate::sim_client::SimClient;

use super::{mean_offset, sample_trajectory, score_trajectory, Params, TrialError};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Runs one flexion trial per `proc` call.
#[derive(Default)]
pub struct TrialRunner {
    params: Params,

    template: Option<ModelTemplate>,

    scratch: Option<ScratchArea>,

    sim_client: Option<SimClient>,

    /// Index of the next trial, used to name staged models and saved reports.
    trial_index: usize,
}

/// Status report for a completed trial.
#[derive(Clone, Debug, Serialize)]
pub struct TrialReport {
    /// The scale candidate this trial evaluated.
    pub scale: f64,

    /// Component-wise mean of the sampled centre of rotation offsets.
    ///
    /// Units: meters
    pub mean_cor_offset_m: [f64; 3],

    /// Number of samples in the trajectory.
    pub num_steps: usize,

    /// Path of the staged model description the trial ran against.
    pub model_path: PathBuf,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl State for TrialRunner {
    type InitData = (&'static str, SimClient);
    type InitError = TrialError;

    type InputData = f64;
    type OutputData = f64;
    type StatusReport = TrialReport;
    type ProcError = TrialError;

    /// Initialise the trial runner.
    ///
    /// Loads the parameters, the model template and opens the scratch area. The scratch area is
    /// purged here so that staged files left by an aborted previous run cannot be mistaken for
    /// this run's output.
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let (params_path, sim_client) = init_data;

        // Load the parameters
        self.params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(TrialError::ParamLoadError(e)),
        };

        if self.params.num_steps == 0 {
            return Err(TrialError::InvalidStepCount);
        }

        let root = match host::get_exo_calib_sw_root() {
            Ok(r) => r,
            Err(_) => return Err(TrialError::SwRootNotSet),
        };

        let template = ModelTemplate::from_file(&root.join(&self.params.template_path))
            .map_err(TrialError::GenerationError)?;

        let scratch =
            ScratchArea::new(root.join(&self.params.scratch_dir)).map_err(TrialError::ScratchError)?;

        scratch.purge().map_err(TrialError::ScratchError)?;

        self.template = Some(template);
        self.scratch = Some(scratch);
        self.sim_client = Some(sim_client);
        self.trial_index = 0;

        Ok(())
    }

    /// Evaluate one scale candidate.
    ///
    /// Renders and stages the candidate model, loads it into the simulation, samples the flexion
    /// motion and scores the trajectory. The output is the score and the report carries the mean
    /// offset behind it.
    fn proc(
        &mut self,
        scale: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let template = match &self.template {
            Some(t) => t,
            None => return Err(TrialError::NotInit),
        };
        let scratch = match &self.scratch {
            Some(s) => s,
            None => return Err(TrialError::NotInit),
        };
        let sim_client = match self.sim_client.as_mut() {
            Some(c) => c,
            None => return Err(TrialError::NotInit),
        };

        // The scale candidate plus the fixed properties form the full property list
        let mut properties: Vec<(&str, String)> =
            vec![(self.params.scale_property.as_str(), format!("{}", scale))];

        for (name, value) in &self.params.extra_properties {
            properties.push((name.as_str(), value.clone()));
        }

        let description = template
            .render(&properties)
            .map_err(TrialError::GenerationError)?;

        let model_path = scratch
            .stage(self.trial_index, &description)
            .map_err(TrialError::GenerationError)?;

        debug!(
            "Trial {}: scale {} staged at {:?}",
            self.trial_index, scale, model_path
        );

        let mut sim_session = sim_client
            .load_model(&model_path)
            .map_err(TrialError::SimulationError)?;

        let refs = sim_session
            .resolve_refs(
                &self.params.human_joint_name,
                &self.params.human_body_name,
                &self.params.actuator_joint_name,
                &self.params.actuator_body_name,
                &self.params.actuator_name,
            )
            .map_err(TrialError::ResolutionError)?;

        let trajectory = sample_trajectory(
            &mut sim_session,
            &refs,
            self.params.drive_value,
            self.params.num_steps,
        )
        .map_err(TrialError::SimulationError)?;

        sim_session.close().map_err(TrialError::SimulationError)?;

        let score_m = score_trajectory(&trajectory);
        let mean_m = mean_offset(&trajectory);

        let report = TrialReport {
            scale: *scale,
            mean_cor_offset_m: [mean_m.x, mean_m.y, mean_m.z],
            num_steps: trajectory.len(),
            model_path,
        };

        session::save(
            format!("trial_reports/trial_{:03}.json", self.trial_index),
            report.clone(),
        );

        self.trial_index += 1;

        Ok((score_m, report))
    }
}

impl TrialRunner {
    /// Remove the staged models once the whole search has succeeded.
    ///
    /// Called on the success path only. An aborted run keeps its staged files so the failing
    /// model can be inspected; they are purged at the start of the next run instead.
    pub fn finish(&mut self) -> Result<usize, TrialError> {
        match &self.scratch {
            Some(scratch) => scratch.purge().map_err(TrialError::ScratchError),
            None => Err(TrialError::NotInit),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proc_before_init_rejected() {
        let mut runner = TrialRunner::default();

        assert!(matches!(runner.proc(&0.86), Err(TrialError::NotInit)));
        assert!(matches!(runner.finish(), Err(TrialError::NotInit)));
    }
}
