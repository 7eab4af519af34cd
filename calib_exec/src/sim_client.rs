//! # Simulation Client
//!
//! This module provides the client side of the simulation server link. A [`SimClient`] owns the
//! request socket; loading a model yields a [`SimSession`] scoped to that model, through which
//! references are resolved, poses read, controls written and the integrator stepped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use nalgebra::{Quaternion, Vector3};
use std::path::Path;

use sim_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    sim::{ItemKind, SimRequest, SimResponse},
};

use crate::flexion_trial::FlexionSim;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum time to wait for the server to answer a request. Loading a model compiles the
/// description on the server side, which can take seconds on large models.
const RECV_TIMEOUT_MS: i32 = 60_000;

/// Maximum time to wait for a request to be handed to the transport.
const SEND_TIMEOUT_MS: i32 = 1_000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the simulation server.
pub struct SimClient {
    socket: MonitoredSocket,
}

/// A loaded model on the simulation server.
///
/// The session exclusively borrows the client, so at most one model is live at a time. Dropping
/// the session closes the model on the server; use [`SimSession::close`] on the success path to
/// observe close failures.
pub struct SimSession<'c> {
    client: &'c mut SimClient,
    closed: bool,
}

/// A joint resolved in the loaded model.
#[derive(Debug, Clone)]
pub struct JointRef {
    pub id: u32,

    /// Position of the joint centre in its parent body's frame.
    ///
    /// Units: meters
    pub pos_local_m: Vector3<f64>,
}

/// A body resolved in the loaded model.
#[derive(Debug, Clone)]
pub struct BodyRef {
    pub id: u32,
    pub name: String,
}

/// An actuator resolved in the loaded model.
#[derive(Debug, Clone)]
pub struct ActuatorRef {
    pub id: u32,
    pub name: String,
}

/// All model references needed by a flexion trial, resolved once per loaded model.
#[derive(Debug, Clone)]
pub struct ResolvedRefs {
    /// The human elbow flexion joint.
    pub human_joint: JointRef,

    /// The body the human elbow joint sits in.
    pub human_body: BodyRef,

    /// The device joint actuating elbow flexion.
    pub actuator_joint: JointRef,

    /// The body the device joint sits in.
    pub actuator_body: BodyRef,

    /// The actuator driving the flexion.
    pub actuator: ActuatorRef,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum SimClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the server")]
    NotConnected,

    #[error("Could not send the request to the server: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the server: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),

    #[error("No {0} named {1:?} in the loaded model")]
    NotFound(ItemKind, String),

    #[error("The simulation server reported a fault: {0}")]
    EngineFault(String),

    #[error("Unexpected response from the server: {0}")]
    UnexpectedResponse(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClient {
    /// Create a new instance of the simulation client.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, SimClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: RECV_TIMEOUT_MS,
            send_timeout: SEND_TIMEOUT_MS,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        // Create the socket
        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, &params.sim_endpoint)
            .map_err(SimClientError::SocketError)?;

        // Create self
        Ok(Self { socket })
    }

    /// Load a model description into the simulation, returning a session scoped to it.
    ///
    /// Loading includes a forward propagation of the initial state on the server side, so body
    /// poses are valid before the first step. Any previously loaded model is discarded by the
    /// server; the exclusive borrow held by the returned session keeps a second load from being
    /// issued while one model is live.
    pub fn load_model(&mut self, model_path: &Path) -> Result<SimSession<'_>, SimClientError> {
        let request = SimRequest::LoadModel {
            model_path: model_path.to_string_lossy().into_owned(),
        };

        match self.request(&request)? {
            SimResponse::ModelLoaded => Ok(SimSession {
                client: self,
                closed: false,
            }),
            resp => Err(unexpected(resp)),
        }
    }

    /// Perform one request/response round trip with the server.
    fn request(&mut self, request: &SimRequest) -> Result<SimResponse, SimClientError> {
        // If not connected return now
        if !self.socket.connected() {
            return Err(SimClientError::NotConnected);
        }

        // Serialize the request
        let request_str =
            serde_json::to_string(request).map_err(SimClientError::SerializationError)?;

        // Send the request to the server
        self.socket
            .send(&request_str, 0)
            .map_err(SimClientError::SendError)?;

        // Recieve the response back from the server
        let msg = match self.socket.recv_msg(0) {
            Ok(m) => m,
            Err(e) => return Err(SimClientError::RecvError(e)),
        };

        serde_json::from_str(msg.as_str().unwrap_or(""))
            .map_err(SimClientError::DeserializeError)
    }
}

impl<'c> SimSession<'c> {
    /// Resolve all the named references needed by a flexion trial.
    ///
    /// Resolution happens once per loaded model. A missing name means the model and the
    /// parameters disagree, which is fatal for the run rather than retryable.
    pub fn resolve_refs(
        &mut self,
        human_joint: &str,
        human_body: &str,
        actuator_joint: &str,
        actuator_body: &str,
        actuator: &str,
    ) -> Result<ResolvedRefs, SimClientError> {
        Ok(ResolvedRefs {
            human_joint: self.resolve_joint(human_joint)?,
            human_body: self.resolve_body(human_body)?,
            actuator_joint: self.resolve_joint(actuator_joint)?,
            actuator_body: self.resolve_body(actuator_body)?,
            actuator: self.resolve_actuator(actuator)?,
        })
    }

    /// Close the loaded model, consuming the session.
    pub fn close(mut self) -> Result<(), SimClientError> {
        self.closed = true;

        match self.client.request(&SimRequest::Close)? {
            SimResponse::Closed => Ok(()),
            resp => Err(unexpected(resp)),
        }
    }

    fn resolve_joint(&mut self, name: &str) -> Result<JointRef, SimClientError> {
        let request = SimRequest::ResolveJoint { name: name.into() };

        match self.client.request(&request)? {
            SimResponse::Joint(info) => Ok(JointRef {
                id: info.id,
                pos_local_m: Vector3::new(
                    info.pos_local_m[0],
                    info.pos_local_m[1],
                    info.pos_local_m[2],
                ),
            }),
            resp => Err(unexpected(resp)),
        }
    }

    fn resolve_body(&mut self, name: &str) -> Result<BodyRef, SimClientError> {
        let request = SimRequest::ResolveBody { name: name.into() };

        match self.client.request(&request)? {
            SimResponse::Body(info) => Ok(BodyRef {
                id: info.id,
                name: name.into(),
            }),
            resp => Err(unexpected(resp)),
        }
    }

    fn resolve_actuator(&mut self, name: &str) -> Result<ActuatorRef, SimClientError> {
        let request = SimRequest::ResolveActuator { name: name.into() };

        match self.client.request(&request)? {
            SimResponse::Actuator(info) => Ok(ActuatorRef {
                id: info.id,
                name: name.into(),
            }),
            resp => Err(unexpected(resp)),
        }
    }
}

impl FlexionSim for SimSession<'_> {
    fn body_pose(
        &mut self,
        body: &BodyRef,
    ) -> Result<(Vector3<f64>, Quaternion<f64>), SimClientError> {
        let request = SimRequest::BodyPose { body_id: body.id };

        match self.client.request(&request)? {
            SimResponse::Pose(pose) => Ok((
                Vector3::new(pose.pos_m[0], pose.pos_m[1], pose.pos_m[2]),
                // The wire carries quaternions scalar-first
                Quaternion::new(pose.quat[0], pose.quat[1], pose.quat[2], pose.quat[3]),
            )),
            resp => Err(unexpected(resp)),
        }
    }

    fn set_ctrl(&mut self, actuator: &ActuatorRef, value: f64) -> Result<(), SimClientError> {
        let request = SimRequest::SetCtrl {
            actuator_id: actuator.id,
            value,
        };

        match self.client.request(&request)? {
            SimResponse::CtrlSet => Ok(()),
            resp => Err(unexpected(resp)),
        }
    }

    fn step(&mut self) -> Result<(), SimClientError> {
        match self.client.request(&SimRequest::Step)? {
            SimResponse::Stepped => Ok(()),
            resp => Err(unexpected(resp)),
        }
    }
}

impl Drop for SimSession<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        // The model must be released on every exit path. Errors can only be reported from a
        // drop, not propagated.
        match self.client.request(&SimRequest::Close) {
            Ok(SimResponse::Closed) => (),
            Ok(resp) => warn!("Unexpected response while closing the model: {:?}", resp),
            Err(e) => warn!("Could not close the model: {}", e),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map an off-nominal response onto the matching client error.
fn unexpected(response: SimResponse) -> SimClientError {
    match response {
        SimResponse::NameNotFound { kind, name } => SimClientError::NotFound(kind, name),
        SimResponse::Fault(msg) => SimClientError::EngineFault(msg),
        resp => SimClientError::UnexpectedResponse(format!("{:?}", resp)),
    }
}
