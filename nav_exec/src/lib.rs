//! # Navigation exec library
//!
//! Library portion of the waypoint navigation executable. See `main.rs` for
//! the executable architecture.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod data_store;
pub mod fiducial_map;
pub mod goal_tracker;
pub mod loc;
pub mod reloc;
pub mod tf;
pub mod waypoint_ctrl;
