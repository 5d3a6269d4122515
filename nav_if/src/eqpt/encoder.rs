//! # Wheel encoder samples

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single sample from the wheel encoder stream.
///
/// Tick counts are free running and may wrap in the driver, the consumer only
/// ever uses deltas between consecutive samples.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct EncoderSample {
    /// Instantaneous linear velocity of the robot body.
    ///
    /// Units: meters/second
    pub lin_vel_ms: f64,

    /// Instantaneous angular velocity of the robot body about Z.
    ///
    /// Units: radians/second
    pub ang_vel_rads: f64,

    /// Cumulative tick count of the left wheel.
    pub left_ticks: i64,

    /// Cumulative tick count of the right wheel.
    pub right_ticks: i64
}
