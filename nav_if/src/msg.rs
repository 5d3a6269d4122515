//! # Inbound message module
//!
//! This module defines every message the navigation exec consumes, along with
//! the JSON parsing used by the script interpreter and any future transport.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// Internal
use crate::eqpt::encoder::EncoderSample;
use crate::eqpt::marker::{FiducialMapEntry, FiducialTransformArray};
use crate::frames::TransformStamped;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A message inbound to the navigation exec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Msg {
    /// A new waypoint goal in geodetic coordinates.
    Goal(GeoPoint),

    /// A pose fix in the local planar frame, either GPS-derived or a
    /// relocalization correction.
    PoseFix(PoseFix),

    /// A navigation mode command. Carried as text on the wire, mapped onto
    /// [`NavMode`] with unrecognised values falling back to `Stop`.
    NavMode(String),

    /// Control gain update: `[k_rho, k_roll, k_pitch, k_yaw]`.
    CtrlGains([f64; 4]),

    /// Acceleration limit update: `[linear m/s^2, angular rad/s^2]`.
    AccLimits([f64; 2]),

    /// Velocity ceiling update: `[linear m/s, angular rad/s]`.
    VelLimits([f64; 2]),

    /// Switch threshold update: `[forwarding m, turning rad]`.
    CtrlThresholds([f64; 2]),

    /// Bulk replacement of the fiducial map.
    FiducialMap(Vec<FiducialMapEntry>),

    /// A static transform published into the frame graph by an external
    /// description (for example the robot description's extrinsics).
    StaticTransform(TransformStamped),

    /// A batch of fiducial detections from the camera.
    MarkerDetections(FiducialTransformArray),

    /// A wheel encoder sample.
    EncoderSample(EncoderSample)
}

/// The commanded navigation mode.
///
/// `Running` enables motion, `Park` forces a stop-and-hold, and `Stop` (the
/// default for anything unrecognised or uncommanded) halts motion.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum NavMode {
    Stop,
    Running,
    Park
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum MsgParseError {
    #[error("Message contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error)
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A geodetic position.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees
    pub longitude_deg: f64,

    /// Latitude in degrees
    pub latitude_deg: f64,

    /// Altitude in meters
    pub altitude_m: f64
}

/// A pose fix in the local planar frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct PoseFix {
    /// Position in the local planar frame, `[x, y, z]`.
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Attitude as a unit quaternion, `[x, y, z, w]`.
    pub attitude_q: [f64; 4]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Msg {
    /// Parse a new message from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, MsgParseError> {
        match serde_json::from_str(json_str) {
            Ok(m) => Ok(m),
            Err(e) => Err(MsgParseError::InvalidJson(e))
        }
    }
}

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Stop
    }
}

impl NavMode {
    /// Map a textual mode command onto the closed enumeration.
    ///
    /// Any unrecognised value maps to `Stop`.
    pub fn from_cmd(s: &str) -> Self {
        match s {
            "RUNNING" => NavMode::Running,
            "PARK" => NavMode::Park,
            _ => NavMode::Stop
        }
    }

    /// The wire representation of this mode.
    pub fn as_cmd(&self) -> &'static str {
        match self {
            NavMode::Stop => "STOP",
            NavMode::Running => "RUNNING",
            NavMode::Park => "PARK"
        }
    }
}

impl std::fmt::Display for NavMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_cmd())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nav_mode_from_cmd() {
        assert_eq!(NavMode::from_cmd("RUNNING"), NavMode::Running);
        assert_eq!(NavMode::from_cmd("PARK"), NavMode::Park);
        assert_eq!(NavMode::from_cmd("STOP"), NavMode::Stop);

        // Anything unrecognised is a stop
        assert_eq!(NavMode::from_cmd(""), NavMode::Stop);
        assert_eq!(NavMode::from_cmd("running"), NavMode::Stop);
        assert_eq!(NavMode::from_cmd("GO_FASTER"), NavMode::Stop);
    }

    #[test]
    fn test_msg_from_json() {
        let msg = Msg::from_json(
            r#"{"Goal": {"longitude_deg": 10.2, "latitude_deg": 56.1, "altitude_m": 40.0}}"#
        ).unwrap();

        match msg {
            Msg::Goal(g) => {
                assert_eq!(g.longitude_deg, 10.2);
                assert_eq!(g.latitude_deg, 56.1);
                assert_eq!(g.altitude_m, 40.0);
            },
            m => panic!("Expected Msg::Goal, got {:?}", m)
        }

        // Malformed messages are rejected, not panicked on
        assert!(Msg::from_json("{\"NoSuchMsg\": 1}").is_err());
        assert!(Msg::from_json("not even json").is_err());
    }
}
