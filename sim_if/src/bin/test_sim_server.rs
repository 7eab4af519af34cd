//! Canned simulation server for manual testing
//!
//! Serves the simulation protocol with a built-in single-hinge arm so that the calibration
//! executable can be exercised end-to-end without a physics engine. This is not a physics
//! simulation: both bodies swing about the world z axis following a simple analytic flexion.

use sim_if::{
    net::{MonitoredSocket, SocketOptions},
    sim::{ActuatorInfo, BodyInfo, BodyPose, ItemKind, JointInfo, SimRequest, SimResponse},
};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Names of the canned model's joints, bodies and actuators. Indices double as handles.
const JOINT_NAMES: [&str; 2] = ["el_x", "J4"];
const BODY_NAMES: [&str; 2] = ["ulna_r", "Link4"];
const ACTUATOR_NAMES: [&str; 1] = ["eFE"];

/// Local joint centre positions, one per entry of `JOINT_NAMES`.
const JOINT_POS_LOCAL_M: [[f64; 3]; 2] = [[0.012, 0.0, 0.0], [-0.008, 0.0, 0.0]];

/// Swing radii of the bodies, one per entry of `BODY_NAMES`. The radii differ slightly so the
/// joint centres drift apart over the flexion.
const BODY_RADIUS_M: [f64; 2] = [0.30, 0.31];

/// Integration step of the canned flexion.
const STEP_S: f64 = 0.005;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "test_sim_server",
    about = "Canned simulation server for manual testing"
)]
struct Opt {
    /// Endpoint to bind the reply socket to
    #[structopt(long, default_value = "tcp://*:5011")]
    endpoint: String,
}

/// State of the canned model, created fresh on every `LoadModel`.
struct CannedModel {
    angle_rad: f64,
    ctrl: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CannedModel {
    fn new() -> Self {
        Self {
            angle_rad: 0.0,
            ctrl: 0.0,
        }
    }

    /// Advance the flexion by one step, treating the control as an angular rate demand.
    fn step(&mut self) {
        self.angle_rad += self.ctrl * STEP_S;
    }

    /// Current world pose of the given body, or `None` for an unknown handle.
    fn body_pose(&self, body_id: u32) -> Option<BodyPose> {
        let radius_m = *BODY_RADIUS_M.get(body_id as usize)?;

        let (sin_a, cos_a) = self.angle_rad.sin_cos();
        let half_angle_rad = self.angle_rad / 2.0;

        Some(BodyPose {
            pos_m: [radius_m * cos_a, radius_m * sin_a, 0.0],
            quat: [half_angle_rad.cos(), 0.0, 0.0, half_angle_rad.sin()],
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::from_args();

    // Create the context for zmq
    let ctx = zmq::Context::new();

    // Set the socket options
    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };

    // Create the socket
    let socket = MonitoredSocket::new(&ctx, zmq::REP, socket_options, &opt.endpoint)?;

    println!("Canned simulation server listening on {}", opt.endpoint);

    let mut model: Option<CannedModel> = None;

    // Respond to client requests
    loop {
        // Wait for the client to send us a request
        let msg = socket.recv_msg(0)?;

        let response = match msg.as_str() {
            Some(r) => match serde_json::from_str::<SimRequest>(r) {
                Ok(request) => handle_request(request, &mut model),
                Err(e) => SimResponse::Fault(format!("could not parse request: {}", e)),
            },
            None => SimResponse::Fault("request was not valid UTF-8".into()),
        };

        let response_str = serde_json::to_string(&response)?;
        socket.send(&response_str, 0)?;
    }
}

fn handle_request(request: SimRequest, model: &mut Option<CannedModel>) -> SimResponse {
    // Loading is the only request which can be served without a model
    let request = match request {
        SimRequest::LoadModel { model_path } => {
            println!("Loading model {:?}", model_path);
            *model = Some(CannedModel::new());
            return SimResponse::ModelLoaded;
        }
        other => other,
    };

    let loaded = match model {
        Some(m) => m,
        None => return SimResponse::Fault("no model loaded".into()),
    };

    match request {
        SimRequest::LoadModel { .. } => unreachable!(),
        SimRequest::ResolveJoint { name } => {
            match JOINT_NAMES.iter().position(|n| *n == name) {
                Some(idx) => SimResponse::Joint(JointInfo {
                    id: idx as u32,
                    pos_local_m: JOINT_POS_LOCAL_M[idx],
                }),
                None => SimResponse::NameNotFound {
                    kind: ItemKind::Joint,
                    name,
                },
            }
        }
        SimRequest::ResolveBody { name } => {
            match BODY_NAMES.iter().position(|n| *n == name) {
                Some(idx) => SimResponse::Body(BodyInfo { id: idx as u32 }),
                None => SimResponse::NameNotFound {
                    kind: ItemKind::Body,
                    name,
                },
            }
        }
        SimRequest::ResolveActuator { name } => {
            match ACTUATOR_NAMES.iter().position(|n| *n == name) {
                Some(idx) => SimResponse::Actuator(ActuatorInfo { id: idx as u32 }),
                None => SimResponse::NameNotFound {
                    kind: ItemKind::Actuator,
                    name,
                },
            }
        }
        SimRequest::BodyPose { body_id } => match loaded.body_pose(body_id) {
            Some(pose) => SimResponse::Pose(pose),
            None => SimResponse::Fault(format!("unknown body id {}", body_id)),
        },
        SimRequest::SetCtrl { actuator_id, value } => {
            if actuator_id as usize >= ACTUATOR_NAMES.len() {
                SimResponse::Fault(format!("unknown actuator id {}", actuator_id))
            } else {
                loaded.ctrl = value;
                SimResponse::CtrlSet
            }
        }
        SimRequest::Step => {
            loaded.step();
            SimResponse::Stepped
        }
        SimRequest::Close => {
            println!("Closing model");
            *model = None;
            SimResponse::Closed
        }
    }
}
