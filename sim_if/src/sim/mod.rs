//! # Simulation Server Commands
//!
//! Requests and responses exchanged with the physics simulation server. The server is a separate
//! process wrapping the engine, so these types define the JSON wire format rather than sharing
//! code with it.
//!
//! A calibration run drives the server through a simple lifecycle: load a concrete model
//! description, resolve named items to handles, then repeatedly read body poses, write actuator
//! controls and step the integrator, and finally close the model. Loading a model includes a
//! forward propagation of the initial state, so poses are valid before the first step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A joint resolved by the server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointInfo {
    /// The server's handle for this joint.
    pub id: u32,

    /// Position of the joint centre in the frame of its parent body, in meters. This is fixed by
    /// the model description and does not change as the simulation steps.
    pub pos_local_m: [f64; 3],
}

/// A body resolved by the server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BodyInfo {
    /// The server's handle for this body.
    pub id: u32,
}

/// An actuator resolved by the server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ActuatorInfo {
    /// The server's handle for this actuator.
    pub id: u32,
}

/// World-frame pose of a body at the current simulation state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Position of the body frame origin in the world frame, in meters.
    pub pos_m: [f64; 3],

    /// Orientation of the body frame in the world frame, as a quaternion in `(w, x, y, z)`
    /// order. The server maintains this as a unit quaternion.
    pub quat: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Requests sent from the client to the simulation server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SimRequest {
    /// Load the model description at the given path and forward propagate its initial state. Any
    /// previously loaded model is discarded.
    LoadModel {
        /// Path of the model description, in a form the server can open.
        model_path: String,
    },

    /// Resolve a named joint to a handle and its local position.
    ResolveJoint { name: String },

    /// Resolve a named body to a handle.
    ResolveBody { name: String },

    /// Resolve a named actuator to a handle.
    ResolveActuator { name: String },

    /// Read the current world-frame pose of a body.
    BodyPose { body_id: u32 },

    /// Set an actuator's control input. The value persists across steps until overwritten.
    SetCtrl { actuator_id: u32, value: f64 },

    /// Advance the simulation by one step.
    Step,

    /// Discard the loaded model and release its resources.
    Close,
}

/// Responses returned by the simulation server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SimResponse {
    /// The model was loaded and its initial state propagated.
    ModelLoaded,

    /// A joint was resolved.
    Joint(JointInfo),

    /// A body was resolved.
    Body(BodyInfo),

    /// An actuator was resolved.
    Actuator(ActuatorInfo),

    /// The requested body's current pose.
    Pose(BodyPose),

    /// The control input was set.
    CtrlSet,

    /// The simulation advanced by one step.
    Stepped,

    /// The model was closed.
    Closed,

    /// The named item does not exist in the loaded model.
    NameNotFound {
        kind: ItemKind,
        name: String,
    },

    /// The server could not complete the request, for example a malformed model description or an
    /// engine failure while stepping.
    Fault(String),
}

/// The kinds of named item which can be resolved in a model.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Joint,
    Body,
    Actuator,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ItemKind::Joint => write!(f, "joint"),
            ItemKind::Body => write!(f, "body"),
            ItemKind::Actuator => write!(f, "actuator"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// The server side is implemented against the JSON text of these messages, so the encoding
    /// must stay stable.
    #[test]
    fn test_wire_format_stable() {
        assert_eq!(
            serde_json::to_string(&SimRequest::Step).unwrap(),
            r#""Step""#
        );
        assert_eq!(
            serde_json::to_string(&SimRequest::SetCtrl {
                actuator_id: 2,
                value: 0.3
            })
            .unwrap(),
            r#"{"SetCtrl":{"actuator_id":2,"value":0.3}}"#
        );

        let resp: SimResponse = serde_json::from_str(
            r#"{"NameNotFound":{"kind":"Joint","name":"el_x"}}"#,
        )
        .unwrap();
        assert_eq!(
            resp,
            SimResponse::NameNotFound {
                kind: ItemKind::Joint,
                name: "el_x".into()
            }
        );
    }

    #[test]
    fn test_pose_quat_order() {
        // Quaternions travel scalar-first
        let pose: BodyPose = serde_json::from_str(
            r#"{"pos_m":[0.1,0.2,0.3],"quat":[1.0,0.0,0.0,0.0]}"#,
        )
        .unwrap();
        assert_eq!(pose.quat[0], 1.0);
    }
}
