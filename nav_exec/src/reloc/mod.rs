//! # Relocalization manager module
//!
//! This module implements the [`RelocMgr`] state machine, which corrects the
//! robot's dead-reckoned/GPS pose from visual fiducial marker detections. The
//! machine is broken down into a number of states:
//!
//! - `Idle` - No marker is being processed.
//! - `AwaitingStop` - A mapped marker has been sighted, navigation has been
//!   paused, and the manager is waiting for the robot to physically stop.
//! - `Settling` - The robot has stopped, the manager dwells for a fixed
//!   number of periods so the detection image stabilises.
//! - `Correcting` - The corrected global pose is being recomputed through
//!   the frame graph. Unresolvable chains are retried on later steps.
//!
//! The manager is a hybrid: detection and encoder events are handled as they
//! arrive (mutating state only, never blocking), while the waits above are
//! carried across invocations of the low rate periodic [`RelocMgr::step`].
//! Once a correction has been applied, re-triggering off the same marker is
//! suppressed until both wheels have accumulated enough displacement.

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

/// Possible errors that can occur in the relocalization manager.
#[derive(Debug, thiserror::Error)]
pub enum RelocError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError)
}
