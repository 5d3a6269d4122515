//! Parameters structure for the relocalization manager

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the relocalization manager.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- TRIGGERING ----

    /// Detections with an image error above this value are ignored.
    pub image_error_max: f64,

    /// Linear velocity below which the robot counts as stopped.
    ///
    /// Units: meters/second
    pub stop_lin_thres_ms: f64,

    /// Angular velocity below which the robot counts as stopped.
    ///
    /// Units: radians/second
    pub stop_ang_thres_rads: f64,

    /// Number of periodic steps to dwell after stopping before the detection
    /// image is trusted.
    pub settle_periods: u32,

    /// Accumulated displacement both wheels must exceed before the same
    /// marker may trigger another correction.
    ///
    /// Units: meters
    pub displacement_thres_m: f64,

    /// Distance travelled per encoder tick.
    ///
    /// Units: meters
    pub distance_per_count_m: f64,

    // ---- FRAMES ----

    /// The robot body frame published by the robot description
    pub base_frame: String,

    /// The global frame the corrected pose is expressed in
    pub gps_frame: String,

    /// The frame marker detections are expressed in
    pub camera_frame: String,

    /// Pose of the camera on the robot body, published into the frame graph
    /// at startup.
    pub camera_mount: CameraMount,

    // ---- MAP ----

    /// Path to the fiducial map file, relative to the software root
    pub map_file: String
}

/// The fixed mounting pose of the camera on the robot body.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraMount {
    /// Translation from the base frame origin.
    ///
    /// Units: meters
    pub translation_m: [f64; 3],

    /// Roll, pitch, yaw of the camera relative to the base frame.
    ///
    /// Units: degrees
    pub rotation_rpy_deg: [f64; 3]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            image_error_max: 0.3,
            stop_lin_thres_ms: 0.05,
            stop_ang_thres_rads: 0.05,
            settle_periods: 5,
            displacement_thres_m: 3.0,
            distance_per_count_m: 0.00338,
            base_frame: String::from("base_footprint"),
            gps_frame: String::from("utm"),
            camera_frame: String::from("camera"),
            camera_mount: CameraMount {
                translation_m: [0.1, 0.0, 0.2],
                rotation_rpy_deg: [0.0, 0.0, 0.0]
            },
            map_file: String::from("maps/fiducials.json")
        }
    }
}
