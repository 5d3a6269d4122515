//! Parameters structure for WaypointCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for waypoint control.
///
/// All of these are runtime-tunable through the parameter update messages.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- GAINS ----

    /// Proportional gain mapping distance to linear velocity demand
    pub k_rho: f64,

    /// Proportional gain mapping roll error to angular velocity demand
    pub k_roll: f64,

    /// Proportional gain mapping pitch error to angular velocity demand
    pub k_pitch: f64,

    /// Proportional gain mapping yaw error to angular velocity demand
    pub k_yaw: f64,

    // ---- SHAPING LIMITS ----

    /// Maximum change in the linear demand per control cycle.
    ///
    /// Units: meters/second per cycle
    pub acc_lin_ms: f64,

    /// Maximum change in any angular demand per control cycle.
    ///
    /// Units: radians/second per cycle
    pub acc_ang_rads: f64,

    /// Linear velocity ceiling.
    ///
    /// Units: meters/second
    pub vel_max_lin_ms: f64,

    /// Angular velocity ceiling, per axis.
    ///
    /// Units: radians/second
    pub vel_max_ang_rads: f64,

    // ---- SWITCH THRESHOLDS ----

    /// Distance below which the goal counts as reached.
    ///
    /// Units: meters
    pub forwarding_thres_m: f64,

    /// Yaw error below which turning gives way to forwarding.
    ///
    /// Units: radians
    pub turning_thres_rad: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_rho: 0.3,
            k_roll: 0.8,
            k_pitch: 0.8,
            k_yaw: 0.8,
            acc_lin_ms: 0.2,
            acc_ang_rads: 0.2,
            vel_max_lin_ms: 1.0,
            vel_max_ang_rads: 1.0,
            forwarding_thres_m: 0.1,
            turning_thres_rad: 0.2
        }
    }
}
