//! # Equipment Interface
//!
//! This module defines the interface structures for the equipment streams the
//! exec consumes (marker detections, wheel encoders) and produces (drive
//! demands).

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;
pub mod encoder;
pub mod marker;
