//! # Coordinate frame and rigid transform wire definitions
//!
//! These are the plain serialisable shapes carried by messages. The maths
//! types used for actual transform composition live in the exec's `tf`
//! module.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A rigid transform between two frames.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Transform {
    /// Translation component in meters, `[x, y, z]`.
    pub translation_m: [f64; 3],

    /// Rotation component as a unit quaternion, `[x, y, z, w]`.
    pub rotation_q: [f64; 4]
}

/// A transform tagged with the frames it connects.
///
/// The transform maps points expressed in the child frame into the parent
/// frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformStamped {
    /// The frame this transform is expressed in
    pub parent_frame: String,

    /// The frame this transform leads to
    pub child_frame: String,

    /// The transform itself
    pub transform: Transform
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation_m: [0.0; 3],
            rotation_q: [0.0, 0.0, 0.0, 1.0]
        }
    }
}
