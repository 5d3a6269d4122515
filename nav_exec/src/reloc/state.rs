//! Implementations for the RelocMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::UnitQuaternion;

// Internal
use super::{Params, RelocError};
use crate::fiducial_map::FiducialMap;
use crate::loc::{LocalProjection, Pose};
use crate::tf::{TfBuffer, Transform};
use nav_if::eqpt::encoder::EncoderSample;
use nav_if::eqpt::marker::FiducialTransformArray;
use nav_if::msg::{GeoPoint, NavMode};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Relocalization manager state
pub struct RelocMgr {
    pub(crate) params: Params,

    /// The current state of the machine
    state: RelocState,

    /// The marker currently locked as the correction reference
    reference_id: Option<u32>,

    /// The marker used for the last successful correction. Detections of it
    /// are suppressed until the wheels have moved far enough.
    last_corrected_id: Option<u32>,

    /// Latest acceptable camera-relative observation of the reference marker
    observed_tf: Option<Transform>,

    /// The navigation mode to restore when the pause ends. Captured exactly
    /// once, on the first pause.
    prestate: Option<NavMode>,

    /// True while navigation is paused for a correction
    paused: bool,

    /// Number of periodic steps dwelled in Settling
    settle_count: u32,

    /// True if the most recent encoder sample showed the robot stopped
    robot_stopped: bool,

    /// Most recent cumulative tick counts
    left_counts: i64,
    right_counts: i64,
    counts_init: bool,

    /// Accumulated absolute tick deltas per side since the last successful
    /// correction
    left_disp_counts: f64,
    right_disp_counts: f64
}

/// Output of a periodic step.
#[derive(Debug, Default)]
pub struct StepOutput {
    /// Navigation mode override to apply, if any
    pub mode_override: Option<NavMode>,

    /// Corrected pose fix to inject into the pose input, if any
    pub corrected_fix: Option<Pose>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The states of the relocalization machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RelocState {
    Idle,
    AwaitingStop,
    Settling,
    Correcting
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl std::fmt::Display for RelocState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelocState::Idle => write!(f, "IDLE"),
            RelocState::AwaitingStop => write!(f, "AWAITING_STOP"),
            RelocState::Settling => write!(f, "SETTLING"),
            RelocState::Correcting => write!(f, "CORRECTING")
        }
    }
}

impl Default for RelocMgr {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl RelocMgr {

    /// Initialise the relocalization manager.
    ///
    /// Expected init data is the path to the parameter file.
    pub fn init(params_path: &str) -> Result<Self, RelocError> {
        let params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(RelocError::ParamLoadError(e))
        };

        Ok(Self::with_params(params))
    }

    /// Build a manager directly from a parameter set.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            state: RelocState::Idle,
            reference_id: None,
            last_corrected_id: None,
            observed_tf: None,
            prestate: None,
            paused: false,
            settle_count: 0,
            robot_stopped: false,
            left_counts: 0,
            right_counts: 0,
            counts_init: false,
            left_disp_counts: 0.0,
            right_disp_counts: 0.0
        }
    }

    /// Get the manager's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get the current state of the machine.
    pub fn state(&self) -> RelocState {
        self.state
    }

    /// Get the accumulated per-side displacement since the last correction.
    ///
    /// Units: meters, (left, right)
    pub fn displacement_m(&self) -> (f64, f64) {
        (
            self.left_disp_counts * self.params.distance_per_count_m,
            self.right_disp_counts * self.params.distance_per_count_m
        )
    }

    // ---- EVENT HANDLERS ----

    /// Handle a batch of marker detections.
    ///
    /// Mutates state only, any waiting is carried across periodic steps.
    /// Returns a navigation mode override if the batch caused a pause or a
    /// resume.
    pub fn handle_detections(
        &mut self,
        batch: &FiducialTransformArray,
        map: &FiducialMap,
        current_mode: NavMode
    ) -> Option<NavMode> {

        let reference_in_view = batch.transforms.iter()
            .any(|t| Some(t.id) == self.reference_id);
        let prev_in_view = batch.transforms.iter()
            .any(|t| Some(t.id) == self.last_corrected_id);

        // Suppression: the marker we last corrected from is still in view
        // and the wheels have barely moved since, nothing useful can come of
        // reprocessing it
        if prev_in_view {
            let (left_m, right_m) = self.displacement_m();
            if left_m < self.params.displacement_thres_m
                && right_m < self.params.displacement_thres_m
            {
                return None
            }
        }
        // Stale lock eviction: the last corrected marker has left the view
        else {
            self.last_corrected_id = None;
        }

        // If we are paused and the reference marker has left the view there
        // is nothing left to correct from, resume navigation
        if self.paused && !reference_in_view {
            info!("Reference marker left view, resuming navigation");

            let restore = self.prestate.take().unwrap_or_default();
            self.paused = false;
            self.state = RelocState::Idle;
            self.reference_id = None;
            self.observed_tf = None;

            return Some(restore)
        }

        let mut mode_override = None;

        for detection in batch.transforms.iter() {
            // Detections with too much image error are skipped, no state
            // change
            if detection.image_error > self.params.image_error_max {
                continue;
            }

            // Only markers present in the map are processed
            if map.lookup(detection.id).is_none() {
                continue;
            }

            // Keep the freshest acceptable observation of the locked marker
            if Some(detection.id) == self.reference_id {
                self.observed_tf = Some(Transform::from(&detection.transform));
            }

            if self.state == RelocState::Idle {
                self.reference_id = Some(detection.id);
                self.observed_tf = Some(Transform::from(&detection.transform));

                // Capture the mode to restore exactly once, on the first
                // pause
                if !self.paused {
                    self.prestate = Some(current_mode);
                    self.paused = true;
                }

                info!(
                    "Marker {} sighted, pausing navigation for relocalization",
                    detection.id
                );

                mode_override = Some(NavMode::Stop);
                self.state = RelocState::AwaitingStop;
                self.settle_count = 0;
            }
        }

        mode_override
    }

    /// Handle a wheel encoder sample.
    pub fn handle_encoder(&mut self, sample: &EncoderSample) {
        self.robot_stopped =
            sample.lin_vel_ms.abs() < self.params.stop_lin_thres_ms
            && sample.ang_vel_rads.abs() < self.params.stop_ang_thres_rads;

        if self.counts_init {
            self.left_disp_counts +=
                (sample.left_ticks - self.left_counts).abs() as f64;
            self.right_disp_counts +=
                (sample.right_ticks - self.right_counts).abs() as f64;
        }

        self.left_counts = sample.left_ticks;
        self.right_counts = sample.right_ticks;
        self.counts_init = true;
    }

    // ---- PERIODIC PROCESSING ----

    /// Step the state machine, called at the manager's own low rate.
    pub fn step(
        &mut self,
        tf: &mut TfBuffer,
        map: &FiducialMap,
        projection: &LocalProjection
    ) -> StepOutput {
        match self.state {
            RelocState::Idle => StepOutput::none(),

            RelocState::AwaitingStop => {
                if self.robot_stopped {
                    debug!("Robot stopped, settling");
                    self.state = RelocState::Settling;
                }
                else {
                    self.settle_count = 0;
                }
                StepOutput::none()
            },

            RelocState::Settling => {
                // Movement during the dwell restarts the wait
                if !self.robot_stopped {
                    self.settle_count = 0;
                    self.state = RelocState::AwaitingStop;
                }
                else {
                    self.settle_count += 1;
                    if self.settle_count >= self.params.settle_periods {
                        debug!("Settle complete, correcting");
                        self.state = RelocState::Correcting;
                    }
                }
                StepOutput::none()
            },

            RelocState::Correcting => self.step_correcting(tf, map, projection)
        }
    }

    /// Recompute the robot's global pose from the locked marker.
    ///
    /// Unresolvable transform chains are not failures, the step simply
    /// returns and the resolution is retried on the next periodic step.
    fn step_correcting(
        &mut self,
        tf: &mut TfBuffer,
        map: &FiducialMap,
        projection: &LocalProjection
    ) -> StepOutput {
        // The lock and the map entry may have gone away since the trigger
        // (map hot swap), in which case there is nothing to correct from
        let (reference_id, observed_tf) =
            match (self.reference_id, self.observed_tf) {
                (Some(id), Some(t)) => (id, t),
                _ => {
                    self.state = RelocState::Idle;
                    return StepOutput::none()
                }
            };
        let entry = match map.lookup(reference_id) {
            Some(e) => e.clone(),
            None => {
                warn!(
                    "Marker {} disappeared from the map during correction",
                    reference_id
                );
                self.state = RelocState::Idle;
                return StepOutput::none()
            }
        };

        let observed_frame = format!("fid{}", reference_id);
        let map_frame = format!("fiducial{}", reference_id);

        // 1. The marker as observed by the camera
        if let Err(e) = tf.set_transform(
            &self.params.camera_frame, &observed_frame, observed_tf)
        {
            warn!("Could not publish the observed marker transform: {}", e);
            return StepOutput::none()
        }

        // 2. The map's surveyed marker pose in the global frame. The map
        //    stores degree Euler angles with the opposite sign convention.
        let marker_pos_m = projection.forward(&GeoPoint {
            longitude_deg: entry.longitude_deg,
            latitude_deg: entry.latitude_deg,
            altitude_m: entry.altitude_m
        });
        let marker_rot = UnitQuaternion::from_euler_angles(
            -entry.rot_east_deg.to_radians(),
            -entry.rot_north_deg.to_radians(),
            -entry.rot_heading_deg.to_radians()
        );
        if let Err(e) = tf.set_transform(
            &self.params.gps_frame,
            &map_frame,
            Transform {
                translation_m: marker_pos_m,
                rotation_q: marker_rot
            })
        {
            warn!("Could not publish the map marker transform: {}", e);
            return StepOutput::none()
        }

        // 3. The robot relative to the observed marker, resolved through the
        //    live chain (the robot description publishes base to camera)
        let marker_to_base = match tf.lookup(
            &observed_frame, &self.params.base_frame)
        {
            Ok(t) => t,
            Err(e) => {
                // Not yet connected is a recoverable wait, retry on the next
                // step
                if e.is_not_ready() {
                    debug!("Robot chain not resolvable yet: {}", e);
                }
                else {
                    warn!("Robot chain lookup failed: {}", e);
                }
                return StepOutput::none()
            }
        };

        // Re-anchor the robot onto the surveyed marker and resolve the
        // composed global pose
        if let Err(e) = tf.set_transform(&map_frame, "robot_fid", marker_to_base)
        {
            warn!("Could not publish the re-anchored robot transform: {}", e);
            return StepOutput::none()
        }

        let global_to_robot = match tf.lookup(&self.params.gps_frame, "robot_fid")
        {
            Ok(t) => t,
            Err(e) => {
                if e.is_not_ready() {
                    debug!("Global chain not resolvable yet: {}", e);
                }
                else {
                    warn!("Global chain lookup failed: {}", e);
                }
                return StepOutput::none()
            }
        };

        // Success: emit the corrected fix, reset the displacement
        // accumulators and keep the marker as the suppression reference
        info!(
            "Relocalization correction from marker {} complete",
            reference_id
        );

        self.left_disp_counts = 0.0;
        self.right_disp_counts = 0.0;
        self.last_corrected_id = Some(reference_id);
        self.state = RelocState::Idle;

        StepOutput {
            mode_override: None,
            corrected_fix: Some(Pose {
                position_m: global_to_robot.translation_m,
                attitude_q: global_to_robot.rotation_q
            })
        }
    }
}

impl StepOutput {
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;
    use nav_if::eqpt::marker::{FiducialTransform, FiducialTransformArray};
    use nav_if::frames;

    /// Map with marker 5 surveyed at the projection origin, heading east.
    const MAP_JSON: &str = r#"{
        "FiducialCollections": [
            {
                "SavedFiducials": [
                    {
                        "Id": 5,
                        "Position": {
                            "longitude": 0.0,
                            "latitude": 0.0,
                            "altitude": 0.0
                        },
                        "Rotation": {
                            "east": 0.0,
                            "north": 0.0,
                            "heading": 0.0
                        }
                    }
                ]
            }
        ]
    }"#;

    fn detection_of(id: u32) -> FiducialTransformArray {
        FiducialTransformArray {
            timestamp: chrono::Utc::now(),
            transforms: vec![FiducialTransform {
                id,
                transform: frames::Transform {
                    translation_m: [2.0, 0.0, 0.0],
                    rotation_q: [0.0, 0.0, 0.0, 1.0]
                },
                image_error: 0.1
            }]
        }
    }

    fn empty_batch() -> FiducialTransformArray {
        FiducialTransformArray {
            timestamp: chrono::Utc::now(),
            transforms: vec![]
        }
    }

    fn encoder(lin: f64, ang: f64, left: i64, right: i64) -> EncoderSample {
        EncoderSample {
            lin_vel_ms: lin,
            ang_vel_rads: ang,
            left_ticks: left,
            right_ticks: right
        }
    }

    fn loaded_map() -> FiducialMap {
        let mut map = FiducialMap::new();
        map.load_str(MAP_JSON).unwrap();
        map
    }

    /// Drive a manager through trigger, stop and settle, leaving it in
    /// Correcting.
    fn settle(mgr: &mut RelocMgr, tf: &mut TfBuffer, map: &FiducialMap) {
        let proj = LocalProjection::default();

        let over = mgr.handle_detections(&detection_of(5), map, NavMode::Running);
        assert_eq!(over, Some(NavMode::Stop));
        assert_eq!(mgr.state(), RelocState::AwaitingStop);

        mgr.handle_encoder(&encoder(0.0, 0.0, 0, 0));
        mgr.step(tf, map, &proj);
        assert_eq!(mgr.state(), RelocState::Settling);

        for _ in 0..5 {
            mgr.step(tf, map, &proj);
        }
        assert_eq!(mgr.state(), RelocState::Correcting);
    }

    #[test]
    fn test_unmapped_marker_ignored() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();

        // Marker 7 is not in the map, nothing happens
        let over = mgr.handle_detections(&detection_of(7), &map, NavMode::Running);
        assert!(over.is_none());
        assert_eq!(mgr.state(), RelocState::Idle);
    }

    #[test]
    fn test_high_image_error_ignored() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();

        let mut batch = detection_of(5);
        batch.transforms[0].image_error = 0.5;

        let over = mgr.handle_detections(&batch, &map, NavMode::Running);
        assert!(over.is_none());
        assert_eq!(mgr.state(), RelocState::Idle);
    }

    #[test]
    fn test_awaiting_stop_velocity_gate() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();
        let mut tf = TfBuffer::new();
        let proj = LocalProjection::default();

        mgr.handle_detections(&detection_of(5), &map, NavMode::Running);
        assert_eq!(mgr.state(), RelocState::AwaitingStop);

        // Still rolling: stays in AwaitingStop
        mgr.handle_encoder(&encoder(0.5, 0.0, 10, 10));
        mgr.step(&mut tf, &map, &proj);
        assert_eq!(mgr.state(), RelocState::AwaitingStop);

        // Both components below the threshold: advances on the next step
        mgr.handle_encoder(&encoder(0.01, 0.01, 10, 10));
        mgr.step(&mut tf, &map, &proj);
        assert_eq!(mgr.state(), RelocState::Settling);
    }

    #[test]
    fn test_settling_dwells_before_correcting() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();
        let mut tf = TfBuffer::new();
        let proj = LocalProjection::default();

        mgr.handle_detections(&detection_of(5), &map, NavMode::Running);
        mgr.handle_encoder(&encoder(0.0, 0.0, 0, 0));
        mgr.step(&mut tf, &map, &proj);
        assert_eq!(mgr.state(), RelocState::Settling);

        // Four steps in, still settling
        for _ in 0..4 {
            mgr.step(&mut tf, &map, &proj);
            assert_ne!(mgr.state(), RelocState::Correcting);
        }

        // The fifth completes the dwell
        mgr.step(&mut tf, &map, &proj);
        assert_eq!(mgr.state(), RelocState::Correcting);
    }

    #[test]
    fn test_correction_retries_until_chain_connects() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();
        let mut tf = TfBuffer::new();
        let proj = LocalProjection::default();

        settle(&mut mgr, &mut tf, &map);

        // The robot description has not published base to camera yet, so the
        // correction cannot resolve. The manager stays in Correcting and
        // retries, this is not an error.
        for _ in 0..3 {
            let out = mgr.step(&mut tf, &map, &proj);
            assert!(out.corrected_fix.is_none());
            assert_eq!(mgr.state(), RelocState::Correcting);
        }

        // Publish the missing extrinsic and the retry succeeds
        tf.set_transform("base_footprint", "camera", Transform::identity())
            .unwrap();
        let out = mgr.step(&mut tf, &map, &proj);
        assert!(out.corrected_fix.is_some());
        assert_eq!(mgr.state(), RelocState::Idle);
    }

    #[test]
    fn test_correction_emits_fix_and_resets_displacement() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();
        let mut tf = TfBuffer::new();
        let proj = LocalProjection::default();

        // Camera sits on the base frame origin
        tf.set_transform("base_footprint", "camera", Transform::identity())
            .unwrap();

        // Accumulate some displacement before the correction
        mgr.handle_encoder(&encoder(0.3, 0.0, 0, 0));
        mgr.handle_encoder(&encoder(0.3, 0.0, 500, 500));

        settle(&mut mgr, &mut tf, &map);

        let out = mgr.step(&mut tf, &map, &proj);
        let fix = out.corrected_fix.expect("Expected a corrected fix");

        // Marker surveyed at the global origin, observed 2 m ahead of the
        // camera: the robot must be at x = -2
        assert!((fix.position_m - Vector3::new(-2.0, 0.0, 0.0)).norm() < 1e-9);

        // Displacement accumulators are reset by the success
        let (left_m, right_m) = mgr.displacement_m();
        assert_eq!(left_m, 0.0);
        assert_eq!(right_m, 0.0);
        assert_eq!(mgr.state(), RelocState::Idle);
    }

    #[test]
    fn test_suppression_of_recently_corrected_marker() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();
        let mut tf = TfBuffer::new();
        let proj = LocalProjection::default();

        tf.set_transform("base_footprint", "camera", Transform::identity())
            .unwrap();
        settle(&mut mgr, &mut tf, &map);
        mgr.step(&mut tf, &map, &proj);
        assert_eq!(mgr.state(), RelocState::Idle);

        // Seeing the same marker again with (almost) no wheel movement must
        // not re-trigger a pause
        mgr.handle_encoder(&encoder(0.0, 0.0, 10, 10));
        let over = mgr.handle_detections(&detection_of(5), &map, NavMode::Stop);
        assert!(over.is_none());
        assert_eq!(mgr.state(), RelocState::Idle);

        // Enough displacement on both sides lifts the suppression even with
        // the marker still in view (1000 ticks at 3.38 mm per tick is over
        // the 3 m threshold)
        mgr.handle_encoder(&encoder(0.3, 0.0, 1010, 1010));
        let over = mgr.handle_detections(&detection_of(5), &map, NavMode::Stop);
        assert_eq!(over, Some(NavMode::Stop));
        assert_eq!(mgr.state(), RelocState::AwaitingStop);
    }

    #[test]
    fn test_resume_after_correction_when_marker_leaves_view() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();
        let mut tf = TfBuffer::new();
        let proj = LocalProjection::default();

        tf.set_transform("base_footprint", "camera", Transform::identity())
            .unwrap();
        settle(&mut mgr, &mut tf, &map);
        mgr.step(&mut tf, &map, &proj);
        assert_eq!(mgr.state(), RelocState::Idle);

        // Navigation stays paused until the marker leaves the view, at which
        // point the mode captured at the first pause is restored
        let over = mgr.handle_detections(&empty_batch(), &map, NavMode::Stop);
        assert_eq!(over, Some(NavMode::Running));
        assert_eq!(mgr.state(), RelocState::Idle);
    }

    #[test]
    fn test_prestate_restored_after_marker_leaves_view() {
        let mut mgr = RelocMgr::default();
        let map = loaded_map();

        // Pause captures the pre-pause mode (Running)
        let over = mgr.handle_detections(&detection_of(5), &map, NavMode::Running);
        assert_eq!(over, Some(NavMode::Stop));

        // Marker lost before the robot even stopped: the pause is abandoned
        // and the captured mode restored
        let over = mgr.handle_detections(&empty_batch(), &map, NavMode::Stop);
        assert_eq!(over, Some(NavMode::Running));
        assert_eq!(mgr.state(), RelocState::Idle);
    }
}
