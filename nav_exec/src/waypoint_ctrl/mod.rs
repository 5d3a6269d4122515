//! # Waypoint control module
//!
//! Waypoint control is responsible for driving the robot towards the active
//! goal. It runs a small motion state machine every control cycle:
//!
//! - `Idle` - No motion is commanded.
//! - `Turning` - The robot turns in place until the yaw error towards the
//!   goal falls below the turning threshold.
//! - `Forwarding` - The robot drives towards the goal, steering out the
//!   remaining pitch/yaw error. A large heading error (above pi/2) aborts the
//!   straight line and falls back to `Turning`.
//! - `Arrived` - The goal has been reached, demands are zero until a new
//!   goal arrives.
//!
//! Demands are shaped with the ramp/clamp helpers in `util::maths`: each axis
//! is ramped towards gain times error with a per-cycle acceleration limit,
//! then clamped to its velocity ceiling before publication. Only `Forwarding`
//! persists between cycles, every other state re-enters `Turning` at the
//! start of a running cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during WaypointCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum WaypointCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError)
}
