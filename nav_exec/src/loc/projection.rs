//! Geodetic to local-planar projection
//!
//! A simple equirectangular tangent-plane projection anchored at a configured
//! origin. Adequate over the operating areas this software is deployed in
//! (hundreds of meters around the origin).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::Deserialize;

// Internal
use nav_if::msg::GeoPoint;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// WGS84 semi-major axis.
///
/// Units: meters
const EARTH_RADIUS_M: f64 = 6_378_137.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Projection between geodetic coordinates and the local planar frame.
///
/// X+ points east, Y+ north, Z+ up, with the configured origin at (0, 0, 0).
#[derive(Debug, Clone, Deserialize)]
pub struct LocalProjection {
    /// Longitude of the planar frame origin.
    ///
    /// Units: degrees
    pub origin_longitude_deg: f64,

    /// Latitude of the planar frame origin.
    ///
    /// Units: degrees
    pub origin_latitude_deg: f64,

    /// Altitude of the planar frame origin.
    ///
    /// Units: meters
    pub origin_altitude_m: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LocalProjection {
    fn default() -> Self {
        Self {
            origin_longitude_deg: 0.0,
            origin_latitude_deg: 0.0,
            origin_altitude_m: 0.0
        }
    }
}

impl LocalProjection {

    /// Project a geodetic position into the local planar frame.
    pub fn forward(&self, geo: &GeoPoint) -> Vector3<f64> {
        let lat_0_rad = self.origin_latitude_deg.to_radians();

        let x_m = (geo.longitude_deg - self.origin_longitude_deg).to_radians()
            * lat_0_rad.cos()
            * EARTH_RADIUS_M;
        let y_m = (geo.latitude_deg - self.origin_latitude_deg).to_radians()
            * EARTH_RADIUS_M;
        let z_m = geo.altitude_m - self.origin_altitude_m;

        Vector3::new(x_m, y_m, z_m)
    }

    /// Project a local planar position back into geodetic coordinates.
    pub fn inverse(&self, pos_m: &Vector3<f64>) -> GeoPoint {
        let lat_0_rad = self.origin_latitude_deg.to_radians();

        GeoPoint {
            longitude_deg: self.origin_longitude_deg
                + (pos_m[0] / (lat_0_rad.cos() * EARTH_RADIUS_M)).to_degrees(),
            latitude_deg: self.origin_latitude_deg
                + (pos_m[1] / EARTH_RADIUS_M).to_degrees(),
            altitude_m: pos_m[2] + self.origin_altitude_m
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_projection_round_trip() {
        let proj = LocalProjection {
            origin_longitude_deg: 10.19,
            origin_latitude_deg: 56.17,
            origin_altitude_m: 40.0
        };

        // The origin maps to the planar origin
        let origin = proj.forward(&GeoPoint {
            longitude_deg: 10.19,
            latitude_deg: 56.17,
            altitude_m: 40.0
        });
        assert!(origin.norm() < 1e-9);

        // Round trip of a nearby point
        let geo = GeoPoint {
            longitude_deg: 10.1925,
            latitude_deg: 56.1687,
            altitude_m: 42.5
        };
        let planar = proj.forward(&geo);
        let back = proj.inverse(&planar);

        assert!((back.longitude_deg - geo.longitude_deg).abs() < 1e-9);
        assert!((back.latitude_deg - geo.latitude_deg).abs() < 1e-9);
        assert!((back.altitude_m - geo.altitude_m).abs() < 1e-9);

        // A point north of the origin is at positive Y
        let north = proj.forward(&GeoPoint {
            longitude_deg: 10.19,
            latitude_deg: 56.18,
            altitude_m: 40.0
        });
        assert!(north[1] > 0.0);
        assert!(north[0].abs() < 1e-6);
    }
}
