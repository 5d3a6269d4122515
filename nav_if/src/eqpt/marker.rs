//! # Fiducial marker detection and map messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::frames::Transform;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single detected fiducial marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiducialTransform {
    /// Identifier of the detected marker
    pub id: u32,

    /// The pose of the marker relative to the camera frame
    pub transform: Transform,

    /// Object/image error of the detection, unitless. Smaller is better.
    pub image_error: f64
}

/// A batch of fiducial detections from one camera frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiducialTransformArray {
    /// The time the source image was acquired
    #[serde(default = "default_stamp")]
    pub timestamp: DateTime<Utc>,

    /// All detections in the image, possibly empty
    pub transforms: Vec<FiducialTransform>
}

/// The surveyed pose of one fiducial marker, in geodetic coordinates.
///
/// Entries are immutable once loaded, the whole map is replaced instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiducialMapEntry {
    /// Identifier of the marker
    pub id: u32,

    /// Longitude of the marker.
    ///
    /// Units: degrees
    pub longitude_deg: f64,

    /// Latitude of the marker.
    ///
    /// Units: degrees
    pub latitude_deg: f64,

    /// Altitude of the marker.
    ///
    /// Units: meters
    pub altitude_m: f64,

    /// Rotation of the marker about the east axis.
    ///
    /// Units: degrees
    pub rot_east_deg: f64,

    /// Rotation of the marker about the north axis.
    ///
    /// Units: degrees
    pub rot_north_deg: f64,

    /// Heading rotation of the marker.
    ///
    /// Units: degrees
    pub rot_heading_deg: f64
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_stamp() -> DateTime<Utc> {
    Utc::now()
}
