//! # Navigation interface crate.
//!
//! Provides the common message and frame definitions for the waypoint
//! navigation software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Inbound message definitions
pub mod msg;

/// Equipment stream definitions (drive demands, marker detections, encoders)
pub mod eqpt;

/// Coordinate frame and rigid transform wire definitions
pub mod frames;
