//! # Drive demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Velocity demands sent to the drive electronics.
///
/// The linear demand acts along the robot body X+ (forwards) axis. The
/// angular demands act about the body X (roll), Y (pitch) and Z (yaw) axes
/// following the right hand rule.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
pub struct VelDems {
    /// Linear velocity demand along body X+.
    ///
    /// Units: meters/second
    pub lin_x_ms: f64,

    /// Angular velocity demand about body X (roll).
    ///
    /// Units: radians/second
    pub ang_x_rads: f64,

    /// Angular velocity demand about body Y (pitch).
    ///
    /// Units: radians/second
    pub ang_y_rads: f64,

    /// Angular velocity demand about body Z (yaw).
    ///
    /// Units: radians/second
    pub ang_z_rads: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelDems {
    /// An all-zero demand, bringing the robot to a stop.
    pub fn zero() -> Self {
        Self::default()
    }

    /// True if all axes of the demand are zero.
    pub fn is_zero(&self) -> bool {
        self.lin_x_ms == 0.0
            && self.ang_x_rads == 0.0
            && self.ang_y_rads == 0.0
            && self.ang_z_rads == 0.0
    }
}
