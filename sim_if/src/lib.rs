//! # Simulation interface crate.
//!
//! Provides the wire protocol and networking abstractions used to talk to the
//! physics simulation server.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Network module
pub mod net;

/// Request and response definitions for the simulation server
pub mod sim;
