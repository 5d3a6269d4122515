//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nav_if::eqpt::drive::VelDems;
use nav_if::msg::NavMode;

use crate::{
    fiducial_map::FiducialMap,
    goal_tracker::GoalTracker,
    loc::LocalProjection,
    reloc::RelocMgr,
    tf::TfBuffer,
    waypoint_ctrl
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// All shared state lives here. Inbound messages are applied to the store at
/// the start of a cycle, after which each module's periodic processing reads
/// a consistent snapshot out of it.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1hz_cycle: bool,

    // Navigation mode
    /// The commanded navigation mode, possibly overridden by the
    /// relocalization manager
    pub nav_mode: NavMode,

    // Goal tracking
    pub goal_tracker: GoalTracker,

    /// True if a goal message arrived since the last controller cycle
    pub new_goal: bool,

    // Frames and projection
    pub tf: TfBuffer,
    pub projection: LocalProjection,

    // Fiducials
    pub fiducial_map: FiducialMap,
    pub reloc: RelocMgr,

    // WaypointCtrl
    pub waypoint_ctrl: waypoint_ctrl::WaypointCtrl,
    pub waypoint_ctrl_input: waypoint_ctrl::InputData,
    pub waypoint_ctrl_output: Option<VelDems>,
    pub waypoint_ctrl_status_rpt: waypoint_ctrl::StatusReport,

    // Monitoring counters
    /// Number of successful relocalization corrections
    pub num_corrections: u64,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1hz_cycle =
            self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.waypoint_ctrl_input = waypoint_ctrl::InputData::default();
        self.waypoint_ctrl_output = None;
        self.waypoint_ctrl_status_rpt =
            waypoint_ctrl::StatusReport::default();
    }

    /// Build the waypoint controller's input for this cycle, consuming the
    /// new goal flag.
    pub fn build_ctrl_input(&mut self) {
        self.waypoint_ctrl_input = waypoint_ctrl::InputData {
            mode: self.nav_mode,
            new_goal: std::mem::take(&mut self.new_goal),
            goal: self.goal_tracker.snapshot()
        };
    }
}
