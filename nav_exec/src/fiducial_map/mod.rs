//! # Fiducial map module
//!
//! Static (but reloadable) mapping from marker identifier to surveyed
//! geodetic pose. The map is loaded once from a JSON file at startup and can
//! be hot-swapped whole through a bulk update message, lookups never observe
//! a partially applied update.
//!
//! A load failure is not fatal: the map is left unchanged (empty at startup)
//! and relocalization simply never triggers until a valid map arrives.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

// Internal
use nav_if::eqpt::marker::FiducialMapEntry;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The fiducial map.
#[derive(Debug, Default)]
pub struct FiducialMap {
    entries: HashMap<u32, FiducialMapEntry>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while loading a fiducial map.
#[derive(Debug, thiserror::Error)]
pub enum FiducialMapError {
    #[error("Cannot load the fiducial map file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the fiducial map: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("The fiducial map contains no collections")]
    NoCollections
}

// ---------------------------------------------------------------------------
// FILE SHAPE
// ---------------------------------------------------------------------------

// Serde mirror of the consumed JSON shape. Only the first collection in the
// file is used.

#[derive(Deserialize)]
struct MapFile {
    #[serde(rename = "FiducialCollections")]
    collections: Vec<MapCollection>
}

#[derive(Deserialize)]
struct MapCollection {
    #[serde(rename = "SavedFiducials")]
    fiducials: Vec<SavedFiducial>
}

#[derive(Deserialize)]
struct SavedFiducial {
    #[serde(rename = "Id")]
    id: u32,

    #[serde(rename = "Position")]
    position: SavedPosition,

    #[serde(rename = "Rotation")]
    rotation: SavedRotation
}

#[derive(Deserialize)]
struct SavedPosition {
    longitude: f64,
    latitude: f64,
    altitude: f64
}

#[derive(Deserialize)]
struct SavedRotation {
    east: f64,
    north: f64,
    heading: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FiducialMap {

    /// Create a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the map from a JSON file, replacing the current entries.
    ///
    /// On any structural failure the current entries are left unchanged and
    /// the error returned. Returns the number of entries loaded.
    pub fn load<P: AsRef<Path>>(
        &mut self, path: P
    ) -> Result<usize, FiducialMapError> {
        let json = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => return Err(FiducialMapError::FileLoadError(e))
        };

        self.load_str(&json)
    }

    /// Load the map from a JSON string, replacing the current entries.
    pub fn load_str(&mut self, json: &str) -> Result<usize, FiducialMapError> {
        let file: MapFile = match serde_json::from_str(json) {
            Ok(f) => f,
            Err(e) => return Err(FiducialMapError::DeserialiseError(e))
        };

        let collection = match file.collections.get(0) {
            Some(c) => c,
            None => return Err(FiducialMapError::NoCollections)
        };

        // The new map is built fully before being swapped in, lookups never
        // observe a partial update
        let mut entries = HashMap::new();
        for fid in collection.fiducials.iter() {
            entries.insert(fid.id, FiducialMapEntry {
                id: fid.id,
                longitude_deg: fid.position.longitude,
                latitude_deg: fid.position.latitude,
                altitude_m: fid.position.altitude,
                rot_east_deg: fid.rotation.east,
                rot_north_deg: fid.rotation.north,
                rot_heading_deg: fid.rotation.heading
            });
        }

        self.entries = entries;

        Ok(self.entries.len())
    }

    /// Replace the whole map with the given entries.
    pub fn replace(&mut self, entries: Vec<FiducialMapEntry>) {
        self.entries = entries
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
    }

    /// Look an entry up by marker id.
    pub fn lookup(&self, id: u32) -> Option<&FiducialMapEntry> {
        self.entries.get(&id)
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MAP_JSON: &str = r#"{
        "FiducialCollections": [
            {
                "SavedFiducials": [
                    {
                        "Id": 5,
                        "Position": {
                            "longitude": 10.1906,
                            "latitude": 56.1704,
                            "altitude": 41.2
                        },
                        "Rotation": {
                            "east": 0.0,
                            "north": 0.0,
                            "heading": 90.0
                        }
                    },
                    {
                        "Id": 8,
                        "Position": {
                            "longitude": 10.1911,
                            "latitude": 56.1709,
                            "altitude": 40.8
                        },
                        "Rotation": {
                            "east": 0.0,
                            "north": 0.0,
                            "heading": 180.0
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_and_lookup() {
        let mut map = FiducialMap::new();
        assert_eq!(map.load_str(MAP_JSON).unwrap(), 2);

        let entry = map.lookup(5).unwrap();
        assert_eq!(entry.longitude_deg, 10.1906);
        assert_eq!(entry.rot_heading_deg, 90.0);

        assert!(map.lookup(8).is_some());
        assert!(map.lookup(42).is_none());
    }

    #[test]
    fn test_load_failure_leaves_map_unchanged() {
        let mut map = FiducialMap::new();
        map.load_str(MAP_JSON).unwrap();

        // A bad update must not clobber the previous map
        assert!(map.load_str("this is not json").is_err());
        assert_eq!(map.len(), 2);

        assert!(map.load_str(r#"{"FiducialCollections": []}"#).is_err());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_replace_swaps_whole_map() {
        let mut map = FiducialMap::new();
        map.load_str(MAP_JSON).unwrap();

        map.replace(vec![FiducialMapEntry {
            id: 99,
            longitude_deg: 0.0,
            latitude_deg: 0.0,
            altitude_m: 0.0,
            rot_east_deg: 0.0,
            rot_north_deg: 0.0,
            rot_heading_deg: 0.0
        }]);

        assert_eq!(map.len(), 1);
        assert!(map.lookup(5).is_none());
        assert!(map.lookup(99).is_some());
    }
}
