//! # Goal tracker module
//!
//! Holds the current goal position and the latest position/orientation error
//! relative to it. The error is recomputed whenever a new pose fix arrives or
//! a new goal is set, never in between, so the waypoint controller always
//! reads a consistent snapshot.
//!
//! The very first position observation to arrive (by goal message, before any
//! pose fix) does not become a goal, it seeds the robot's assumed starting
//! pose instead. See [`GoalTracker::set_goal`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

// Internal
use crate::loc::Pose;
use util::maths::wrap_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracker for the active goal and the error towards it.
#[derive(Debug, Default)]
pub struct GoalTracker {
    /// The active goal position in the local planar frame, if any
    goal_m: Option<Vector3<f64>>,

    /// The latest robot pose, if any
    pose: Option<Pose>,

    /// True once a trusted attitude has been observed. Until then the
    /// attitude held in `pose` is a placeholder.
    attitude_known: bool,

    /// The latest computed error snapshot
    error: GoalSnapshot
}

/// Snapshot of the goal state consumed by the waypoint controller.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct GoalSnapshot {
    /// True if a goal is active
    pub goal_set: bool,

    /// Euclidean (3D) distance to the goal.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Pitch error towards the goal, in (-pi, pi].
    ///
    /// Units: radians
    pub pitch_err_rad: f64,

    /// Yaw error towards the goal, in (-pi, pi].
    ///
    /// Units: radians
    pub yaw_err_rad: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The result of a goal message being applied to the tracker.
#[derive(Debug)]
pub enum GoalOutcome {
    /// No pose was known yet, the goal position seeded the robot's assumed
    /// starting position instead of becoming a goal.
    SeededStartPose,

    /// The goal was set. If the robot's attitude was not yet known it has
    /// been bootstrapped by pointing the robot from its start position
    /// towards this goal, and the contained pose should be published as an
    /// initial fix.
    GoalSet {
        attitude_bootstrap: Option<Pose>
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoalTracker {

    /// Create a new tracker with no pose and no goal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a goal message.
    ///
    /// If no pose has been observed yet the position seeds the robot's
    /// assumed start position and no goal is set. Otherwise the goal is
    /// replaced, and if the attitude was still unknown it is bootstrapped by
    /// pointing from the start position towards the goal.
    pub fn set_goal(&mut self, pos_m: Vector3<f64>) -> GoalOutcome {
        let pose = match self.pose {
            Some(ref mut p) => p,
            None => {
                self.pose = Some(Pose {
                    position_m: pos_m,
                    attitude_q: UnitQuaternion::identity()
                });
                return GoalOutcome::SeededStartPose
            }
        };

        self.goal_m = Some(pos_m);

        let mut attitude_bootstrap = None;

        if !self.attitude_known {
            let delta_m = pos_m - pose.position_m;

            // Roll is not controlled and stays zero
            let pitch_rad = delta_m[2]
                .atan2((delta_m[0].powi(2) + delta_m[1].powi(2)).sqrt());
            let yaw_rad = delta_m[1].atan2(delta_m[0]);

            pose.attitude_q =
                UnitQuaternion::from_euler_angles(0.0, pitch_rad, yaw_rad);
            self.attitude_known = true;

            attitude_bootstrap = Some(*pose);
        }

        self.recompute_error();

        GoalOutcome::GoalSet { attitude_bootstrap }
    }

    /// Replace the current pose with a new fix and recompute the error.
    pub fn update_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
        self.attitude_known = true;
        self.recompute_error();
    }

    /// Get the latest error snapshot.
    pub fn snapshot(&self) -> GoalSnapshot {
        self.error
    }

    /// Get the current pose, if one is known.
    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// True if a goal is active.
    pub fn goal_set(&self) -> bool {
        self.goal_m.is_some()
    }

    /// Recompute the error snapshot from the current pose and goal.
    fn recompute_error(&mut self) {
        let (goal_m, pose) = match (self.goal_m, self.pose) {
            (Some(g), Some(p)) => (g, p),
            _ => {
                self.error = GoalSnapshot::default();
                return
            }
        };

        let delta_m = goal_m - pose.position_m;
        let horizontal_m =
            (delta_m[0].powi(2) + delta_m[1].powi(2)).sqrt();

        let (_, robot_pitch_rad, robot_yaw_rad) =
            pose.attitude_q.euler_angles();

        self.error = GoalSnapshot {
            goal_set: true,
            distance_m: delta_m.norm(),
            pitch_err_rad: wrap_angle(
                delta_m[2].atan2(horizontal_m) - robot_pitch_rad),
            yaw_err_rad: wrap_angle(
                delta_m[1].atan2(delta_m[0]) - robot_yaw_rad)
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_first_goal_seeds_pose() {
        let mut tracker = GoalTracker::new();

        // The first goal message seeds the start position, no goal is set
        match tracker.set_goal(Vector3::new(10.0, 5.0, 0.0)) {
            GoalOutcome::SeededStartPose => (),
            o => panic!("Expected SeededStartPose, got {:?}", o)
        }
        assert!(!tracker.goal_set());
        assert!(!tracker.snapshot().goal_set);

        // The second one becomes a goal and bootstraps the attitude towards
        // it
        let outcome = tracker.set_goal(Vector3::new(20.0, 5.0, 0.0));
        let bootstrap = match outcome {
            GoalOutcome::GoalSet { attitude_bootstrap: Some(p) } => p,
            o => panic!("Expected a GoalSet with bootstrap, got {:?}", o)
        };

        assert!(tracker.goal_set());

        // Start at (10, 5), goal at (20, 5): heading is along X+, so zero yaw
        assert!(bootstrap.get_heading().abs() < 1e-9);
        assert!((bootstrap.position_m - Vector3::new(10.0, 5.0, 0.0)).norm() < 1e-12);

        // With the bootstrapped attitude the goal is dead ahead
        let snap = tracker.snapshot();
        assert!((snap.distance_m - 10.0).abs() < 1e-9);
        assert!(snap.yaw_err_rad.abs() < 1e-9);
        assert!(snap.pitch_err_rad.abs() < 1e-9);
    }

    #[test]
    fn test_error_recomputed_on_pose_update() {
        let mut tracker = GoalTracker::new();
        tracker.update_pose(Pose {
            position_m: Vector3::new(0.0, 0.0, 0.0),
            attitude_q: UnitQuaternion::identity()
        });

        // Pose was known, so this is a real goal, no bootstrap needed
        match tracker.set_goal(Vector3::new(0.0, 4.0, 0.0)) {
            GoalOutcome::GoalSet { attitude_bootstrap: None } => (),
            o => panic!("Expected a GoalSet without bootstrap, got {:?}", o)
        }

        // Goal due north while facing east: yaw error +pi/2
        let snap = tracker.snapshot();
        assert!((snap.distance_m - 4.0).abs() < 1e-9);
        assert!((snap.yaw_err_rad - PI / 2.0).abs() < 1e-9);

        // Turn to face the goal, error collapses to zero
        tracker.update_pose(Pose {
            position_m: Vector3::new(0.0, 0.0, 0.0),
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, PI / 2.0)
        });
        assert!(tracker.snapshot().yaw_err_rad.abs() < 1e-9);

        // Goal directly behind the robot wraps onto the +pi boundary
        tracker.update_pose(Pose {
            position_m: Vector3::new(0.0, 8.0, 0.0),
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, PI / 2.0)
        });
        let snap = tracker.snapshot();
        assert!((snap.distance_m - 4.0).abs() < 1e-9);
        assert!((snap.yaw_err_rad - PI).abs() < 1e-9);
    }

    #[test]
    fn test_elevated_goal_has_pitch_error() {
        let mut tracker = GoalTracker::new();
        tracker.update_pose(Pose::default());
        tracker.set_goal(Vector3::new(3.0, 0.0, 4.0));

        let snap = tracker.snapshot();
        assert!((snap.distance_m - 5.0).abs() < 1e-9);
        assert!((snap.pitch_err_rad - (4f64 / 3f64).atan()).abs() < 1e-9);
    }
}
