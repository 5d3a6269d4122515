//! # Transform buffer module
//!
//! This module is the exec's client-side rendition of the shared frame graph.
//! Components publish rigid transforms between named frames into the buffer,
//! and resolve multi-hop chains out of it with [`TfBuffer::lookup`].
//!
//! A lookup between frames that are not (yet) connected is not a failure, it
//! is the recoverable [`TfError::NotYetConnected`] outcome. Callers that
//! depend on external publishers are expected to retry on a later cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use std::collections::{HashMap, HashSet, VecDeque};

// Internal
use nav_if::frames;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rigid transform between two frames.
///
/// Maps points expressed in the child frame into the parent frame.
#[derive(Debug, Copy, Clone)]
pub struct Transform {
    /// Translation component.
    ///
    /// Units: meters
    pub translation_m: Vector3<f64>,

    /// Rotation component.
    pub rotation_q: UnitQuaternion<f64>
}

/// A buffer of published transforms, resolvable between any pair of connected
/// frames.
#[derive(Debug, Default)]
pub struct TfBuffer {
    /// Directed edges keyed by (parent, child)
    edges: HashMap<(String, String), Transform>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors from transform buffer operations.
#[derive(Debug, thiserror::Error)]
pub enum TfError {
    /// The two frames are not joined by any chain of published transforms.
    /// This is a recoverable outcome, the chain may appear once external
    /// publishers have run.
    #[error("Frames {0:?} and {1:?} are not yet connected in the frame graph")]
    NotYetConnected(String, String),

    #[error("Frame names must not be empty")]
    EmptyFrameName
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Transform {

    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            translation_m: Vector3::zeros(),
            rotation_q: UnitQuaternion::identity()
        }
    }

    /// Compose this transform with another, such that the result maps from
    /// the other's child frame into this one's parent frame.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            translation_m: self.translation_m
                + self.rotation_q * other.translation_m,
            rotation_q: self.rotation_q * other.rotation_q
        }
    }

    /// The inverse of this transform, mapping parent into child.
    pub fn inverse(&self) -> Transform {
        let rotation_inv = self.rotation_q.inverse();
        Transform {
            translation_m: -(rotation_inv * self.translation_m),
            rotation_q: rotation_inv
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<&frames::Transform> for Transform {
    fn from(wire: &frames::Transform) -> Self {
        let t = wire.translation_m;
        let q = wire.rotation_q;
        Self {
            translation_m: Vector3::new(t[0], t[1], t[2]),
            rotation_q: UnitQuaternion::from_quaternion(
                Quaternion::new(q[3], q[0], q[1], q[2])
            )
        }
    }
}

impl TfBuffer {

    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (upsert) the transform leading from `parent` to `child`.
    pub fn set_transform(
        &mut self, parent: &str, child: &str, tf: Transform
    ) -> Result<(), TfError> {
        if parent.is_empty() || child.is_empty() {
            return Err(TfError::EmptyFrameName)
        }

        self.edges.insert(
            (String::from(parent), String::from(child)),
            tf
        );

        Ok(())
    }

    /// Resolve the transform leading from the `from` frame to the `to` frame,
    /// composing published edges (in either direction) along the way.
    pub fn lookup(&self, from: &str, to: &str) -> Result<Transform, TfError> {
        if from.is_empty() || to.is_empty() {
            return Err(TfError::EmptyFrameName)
        }
        if from == to {
            return Ok(Transform::identity())
        }

        // Build the undirected adjacency out of the directed edges, the
        // reverse direction gets the inverted transform.
        let mut adjacency: HashMap<&str, Vec<(&str, Transform)>> =
            HashMap::new();
        for ((parent, child), tf) in self.edges.iter() {
            adjacency.entry(parent.as_str())
                .or_insert_with(Vec::new)
                .push((child.as_str(), *tf));
            adjacency.entry(child.as_str())
                .or_insert_with(Vec::new)
                .push((parent.as_str(), tf.inverse()));
        }

        // Breadth first search from `from`, accumulating the composed
        // transform along each path.
        let mut queue: VecDeque<(&str, Transform)> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();

        queue.push_back((from, Transform::identity()));
        visited.insert(from);

        while let Some((frame, acc)) = queue.pop_front() {
            if frame == to {
                return Ok(acc)
            }

            if let Some(neighbours) = adjacency.get(frame) {
                for (next, tf) in neighbours.iter() {
                    if visited.insert(*next) {
                        queue.push_back((*next, acc.compose(tf)));
                    }
                }
            }
        }

        Err(TfError::NotYetConnected(
            String::from(from),
            String::from(to)
        ))
    }
}

impl TfError {
    /// True if this error is the recoverable "chain not published yet"
    /// outcome rather than a hard failure.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, TfError::NotYetConnected(_, _))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn translation(x: f64, y: f64, z: f64) -> Transform {
        Transform {
            translation_m: Vector3::new(x, y, z),
            rotation_q: UnitQuaternion::identity()
        }
    }

    #[test]
    fn test_lookup_chain() {
        let mut buffer = TfBuffer::new();
        buffer.set_transform("map", "base", translation(1.0, 0.0, 0.0))
            .unwrap();
        buffer.set_transform("base", "camera", translation(0.0, 2.0, 0.0))
            .unwrap();

        // Two hop composition
        let tf = buffer.lookup("map", "camera").unwrap();
        assert!((tf.translation_m - Vector3::new(1.0, 2.0, 0.0)).norm() < 1e-12);

        // Reverse direction is the inverse
        let tf = buffer.lookup("camera", "map").unwrap();
        assert!((tf.translation_m - Vector3::new(-1.0, -2.0, 0.0)).norm() < 1e-12);

        // Same frame is the identity
        let tf = buffer.lookup("base", "base").unwrap();
        assert!(tf.translation_m.norm() < 1e-12);
    }

    #[test]
    fn test_lookup_with_rotation() {
        let mut buffer = TfBuffer::new();

        // Base is 1 m ahead of map and yawed 90 degrees left
        let yaw_90 = UnitQuaternion::from_euler_angles(
            0.0, 0.0, std::f64::consts::FRAC_PI_2);
        buffer.set_transform("map", "base", Transform {
            translation_m: Vector3::new(1.0, 0.0, 0.0),
            rotation_q: yaw_90
        }).unwrap();

        // Camera is 1 m ahead of base, which in map coordinates is 90
        // degrees to the left
        buffer.set_transform("base", "camera", translation(1.0, 0.0, 0.0))
            .unwrap();

        let tf = buffer.lookup("map", "camera").unwrap();
        assert!((tf.translation_m - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_lookup_not_connected() {
        let mut buffer = TfBuffer::new();
        buffer.set_transform("map", "base", translation(1.0, 0.0, 0.0))
            .unwrap();

        match buffer.lookup("map", "camera") {
            Err(e) => assert!(e.is_not_ready()),
            Ok(_) => panic!("Expected a NotYetConnected error")
        }

        // Once the missing edge is published the lookup succeeds
        buffer.set_transform("base", "camera", translation(0.0, 1.0, 0.0))
            .unwrap();
        assert!(buffer.lookup("map", "camera").is_ok());
    }

    #[test]
    fn test_empty_frame_names_rejected() {
        let mut buffer = TfBuffer::new();
        assert!(buffer
            .set_transform("", "base", Transform::identity())
            .is_err());
        // An empty name is a hard error, not a "not ready" outcome
        match buffer.lookup("", "base") {
            Err(e) => assert!(!e.is_not_ready()),
            Ok(_) => panic!("Expected an EmptyFrameName error")
        }
    }
}
