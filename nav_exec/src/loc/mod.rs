//! # Localisation module
//!
//! This module provides the robot pose representation and the geodetic to
//! local-planar projection used to bring goals and fiducial map entries into
//! the frame the controller works in.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod projection;
pub use projection::LocalProjection;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use nav_if::msg::PoseFix;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the local planar frame) of the
/// robot.
///
/// Poses are only ever replaced whole, a new fix overwrites the previous one.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default)]
pub struct Pose {

    /// The position in the local planar frame
    pub position_m: Vector3<f64>,

    /// The attitude of the robot in the local planar frame.
    pub attitude_q: UnitQuaternion<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {

    /// Return the heading (rotation about the planar Z axis) of the robot in
    /// radians.
    pub fn get_heading(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }

    /// Return the pitch (rotation about the planar Y axis) of the robot in
    /// radians.
    pub fn get_pitch(&self) -> f64 {
        self.attitude_q.euler_angles().1
    }
}

impl From<&PoseFix> for Pose {
    fn from(fix: &PoseFix) -> Self {
        let q = fix.attitude_q;
        Self {
            position_m: Vector3::new(
                fix.position_m[0],
                fix.position_m[1],
                fix.position_m[2]
            ),
            attitude_q: UnitQuaternion::from_quaternion(
                Quaternion::new(q[3], q[0], q[1], q[2])
            )
        }
    }
}
