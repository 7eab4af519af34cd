//! Main calibration executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Connect the simulation client to the simulation server
//!     - Initialise the flexion trial and scale search modules
//!     - Run the search, one flexion trial per scale candidate:
//!         - Render and stage the candidate model
//!         - Load it into the simulation
//!         - Drive the elbow flexion and sample the joint centre offset
//!         - Score the trajectory
//!     - Save the search result and clean the scratch area
//!
//! # Modules
//!
//! All modules (e.g. `flexion_trial`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use calib_lib::{flexion_trial::TrialRunner, scale_search::ScaleSearch, sim_client::SimClient};
use sim_if::net::NetParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info};
use structopt::StructOpt;

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
///
/// Each option overrides the value loaded from `scale_search.toml`, so a narrowed range can be
/// swept without editing the parameter files.
#[derive(Debug, StructOpt)]
#[structopt(name = "calib_exec")]
struct CliOptions {
    /// Override the lower bound of the scale range.
    #[structopt(long)]
    scale_lb: Option<f64>,

    /// Override the upper bound of the scale range.
    #[structopt(long)]
    scale_ub: Option<f64>,

    /// Override the number of scale candidates.
    #[structopt(long)]
    num_candidates: Option<usize>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("calib_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Exoskeleton CoR Scale Calibration\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- CLI OPTIONS ----

    let cli_options = CliOptions::from_args();

    debug!("CLI options: {:?}", cli_options);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- CONNECT TO THE SIMULATION SERVER ----

    let zmq_ctx = sim_if::net::zmq::Context::new();

    let sim_client = SimClient::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to connect to the simulation server")?;

    info!(
        "Connected to the simulation server at {:?}",
        net_params.sim_endpoint
    );

    // ---- MODULE INITIALISATION ----

    let mut trial_runner = TrialRunner::default();
    trial_runner
        .init(("flexion_trial.toml", sim_client), &session)
        .wrap_err("Failed to initialise the flexion trial module")?;

    let mut scale_search = ScaleSearch::init("scale_search.toml", &session)
        .wrap_err("Failed to initialise the scale search module")?;

    scale_search.set_range(
        cli_options.scale_lb,
        cli_options.scale_ub,
        cli_options.num_candidates,
    );

    info!("Module initialisation complete\n");

    // ---- RUN THE SEARCH ----

    let result = scale_search
        .run(|scale| trial_runner.proc(&scale))
        .wrap_err("Scale search failed")?;

    info!(
        "Search complete: best scale {} with score {} m over {} candidates",
        result.best_scale, result.best_score_m, result.num_candidates
    );

    session.save("search_result.json", result);

    // ---- CLEANUP ----

    // Staged models are only removed once the whole search has succeeded
    let num_removed = trial_runner
        .finish()
        .wrap_err("Failed to clean the scratch area")?;

    debug!("Removed {} staged model(s)", num_removed);

    session.exit();

    Ok(())
}
