//! Implementations for the WaypointCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use serde::Serialize;

// Internal
use super::{Params, WaypointCtrlError};
use crate::goal_tracker::GoalSnapshot;
use nav_if::eqpt::drive::VelDems;
use nav_if::msg::NavMode;
use util::{
    archive::{Archived, Archiver},
    maths::{clamp_sym, ramp_toward},
    module::State,
    params,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Waypoint control module state
#[derive(Default)]
pub struct WaypointCtrl {

    pub(crate) params: Params,

    /// The motion state, owned by this module and mutated only in `proc`
    motion_state: MotionState,

    /// The mode observed on the previous cycle, used to detect the
    /// Running to Stop transition
    prev_mode: NavMode,

    /// The demands published on the previous cycle, ramping continues from
    /// these
    dems: VelDems,

    pub(crate) report: StatusReport,

    arch_dems: Archiver,
    arch_report: Archiver
}

/// Input data to Waypoint Control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// The commanded navigation mode this cycle
    pub mode: NavMode,

    /// True if a new goal arrived since the last cycle
    pub new_goal: bool,

    /// Snapshot of the goal tracker state, read once at the start of the
    /// cycle
    pub goal: GoalSnapshot
}

/// Status report for WaypointCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// The motion state at the end of the cycle
    pub motion_state: MotionState,

    /// Distance remaining to the goal
    pub distance_m: f64,

    /// Pitch error remaining to the goal
    pub pitch_err_rad: f64,

    /// Yaw error remaining to the goal
    pub yaw_err_rad: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The motion state of the waypoint controller.
///
/// Only `Forwarding` persists from one running cycle to the next, any other
/// state re-enters `Turning` when running.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum MotionState {
    Idle,
    Turning,
    Forwarding,
    Arrived
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionState {
    fn default() -> Self {
        MotionState::Idle
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            motion_state: MotionState::Idle,
            distance_m: 0.0,
            pitch_err_rad: 0.0,
            yaw_err_rad: 0.0
        }
    }
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionState::Idle => write!(f, "IDLE"),
            MotionState::Turning => write!(f, "TURNING"),
            MotionState::Forwarding => write!(f, "FORWARDING"),
            MotionState::Arrived => write!(f, "ARRIVED")
        }
    }
}

impl State for WaypointCtrl {
    type InitData = &'static str;
    type InitError = WaypointCtrlError;

    type InputData = InputData;
    type OutputData = Option<VelDems>;
    type StatusReport = StatusReport;
    type ProcError = WaypointCtrlError;

    /// Initialise the WaypointCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(WaypointCtrlError::ParamLoadError(e))
        };

        // Create the arch folder for waypoint_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("waypoint_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_dems = Archiver::from_path(
            session, "waypoint_ctrl/dems.csv"
        ).unwrap();
        self.arch_report = Archiver::from_path(
            session, "waypoint_ctrl/status_report.csv"
        ).unwrap();

        Ok(())
    }

    /// Perform cyclic processing of Waypoint Control.
    ///
    /// Returns `Some(dems)` if a velocity demand is to be published this
    /// cycle, `None` otherwise.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // A new goal preempts whatever the state machine was doing,
        // including a terminal Arrived
        if input_data.new_goal {
            self.motion_state = MotionState::Idle;
        }

        let output: Option<VelDems>;

        if input_data.goal.goal_set {
            output = match input_data.mode {
                NavMode::Running => Some(self.proc_running(&input_data.goal)),
                NavMode::Park => Some(self.stop()),
                NavMode::Stop => {
                    // One stop demand on the Running to Stop transition,
                    // nothing afterwards
                    if self.prev_mode == NavMode::Running {
                        Some(self.stop())
                    }
                    else {
                        self.motion_state = MotionState::Idle;
                        None
                    }
                }
            };
        }
        else {
            // No goal, no demands
            output = None;
        }

        self.prev_mode = input_data.mode;

        self.report = StatusReport {
            motion_state: self.motion_state,
            distance_m: input_data.goal.distance_m,
            pitch_err_rad: input_data.goal.pitch_err_rad,
            yaw_err_rad: input_data.goal.yaw_err_rad
        };

        trace!(
            "WaypointCtrl: state {}, distance remaining {:.3} m",
            self.motion_state,
            input_data.goal.distance_m
        );

        Ok((output, self.report))
    }
}

impl Archived for WaypointCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_dems.serialise(self.dems)?;
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl WaypointCtrl {

    /// Build a controller directly from a parameter set, without archiving.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Get the current motion state.
    pub fn motion_state(&self) -> MotionState {
        self.motion_state
    }

    // ---- RUNTIME TUNING ----

    pub fn set_gains(&mut self, gains: &[f64; 4]) {
        self.params.k_rho = gains[0];
        self.params.k_roll = gains[1];
        self.params.k_pitch = gains[2];
        self.params.k_yaw = gains[3];
        info!(
            "Control gains updated: k_rho {}, k_roll {}, k_pitch {}, k_yaw {}",
            gains[0], gains[1], gains[2], gains[3]
        );
    }

    pub fn set_acc_limits(&mut self, limits: &[f64; 2]) {
        self.params.acc_lin_ms = limits[0];
        self.params.acc_ang_rads = limits[1];
        info!(
            "Acceleration limits updated: linear {}, angular {}",
            limits[0], limits[1]
        );
    }

    pub fn set_vel_limits(&mut self, limits: &[f64; 2]) {
        self.params.vel_max_lin_ms = limits[0];
        self.params.vel_max_ang_rads = limits[1];
        info!(
            "Velocity ceilings updated: linear {}, angular {}",
            limits[0], limits[1]
        );
    }

    pub fn set_thresholds(&mut self, thresholds: &[f64; 2]) {
        self.params.forwarding_thres_m = thresholds[0];
        self.params.turning_thres_rad = thresholds[1];
        info!(
            "Switch thresholds updated: forwarding {}, turning {}",
            thresholds[0], thresholds[1]
        );
    }

    // ---- STATE MACHINE ----

    /// Run the motion state machine for one running cycle and produce the
    /// demand to publish.
    fn proc_running(&mut self, goal: &GoalSnapshot) -> VelDems {
        // Entry condition, only Forwarding survives from the previous cycle
        if self.motion_state != MotionState::Forwarding {
            self.motion_state = MotionState::Turning;
        }

        match self.motion_state {
            MotionState::Turning => {
                self.dems.lin_x_ms = 0.0;

                // Roll is never controlled, its error is always zero, so the
                // channel decays towards zero at the ramp rate
                self.dems.ang_x_rads = ramp_toward(
                    self.dems.ang_x_rads,
                    0.0,
                    self.params.acc_ang_rads
                );
                self.dems.ang_y_rads = ramp_toward(
                    self.dems.ang_y_rads,
                    self.params.k_pitch * goal.pitch_err_rad,
                    self.params.acc_ang_rads
                );
                self.dems.ang_z_rads = ramp_toward(
                    self.dems.ang_z_rads,
                    self.params.k_yaw * goal.yaw_err_rad,
                    self.params.acc_ang_rads
                );

                if goal.yaw_err_rad.abs() < self.params.turning_thres_rad {
                    self.motion_state = MotionState::Forwarding;
                }
            },
            MotionState::Forwarding => {
                if goal.distance_m.abs() > self.params.forwarding_thres_m {
                    self.dems.lin_x_ms = ramp_toward(
                        self.dems.lin_x_ms,
                        self.params.k_rho * goal.distance_m,
                        self.params.acc_lin_ms
                    );
                    self.dems.ang_y_rads = ramp_toward(
                        self.dems.ang_y_rads,
                        self.params.k_pitch * goal.pitch_err_rad,
                        self.params.acc_ang_rads
                    );
                    self.dems.ang_z_rads = ramp_toward(
                        self.dems.ang_z_rads,
                        self.params.k_yaw * goal.yaw_err_rad,
                        self.params.acc_ang_rads
                    );

                    // Too much heading error to keep tracking the straight
                    // line, go back to turning in place
                    if goal.yaw_err_rad.abs() > std::f64::consts::FRAC_PI_2 {
                        self.motion_state = MotionState::Turning;
                    }
                }
                else {
                    self.dems.lin_x_ms = 0.0;
                    self.dems.ang_y_rads = 0.0;
                    self.dems.ang_z_rads = 0.0;
                    self.motion_state = MotionState::Arrived;
                }
            },
            // Cannot occur, the entry condition above maps everything else
            // onto Turning
            MotionState::Idle | MotionState::Arrived => ()
        }

        // Clamp every axis to its ceiling before publication
        self.dems.lin_x_ms =
            clamp_sym(self.dems.lin_x_ms, self.params.vel_max_lin_ms);
        self.dems.ang_x_rads =
            clamp_sym(self.dems.ang_x_rads, self.params.vel_max_ang_rads);
        self.dems.ang_y_rads =
            clamp_sym(self.dems.ang_y_rads, self.params.vel_max_ang_rads);
        self.dems.ang_z_rads =
            clamp_sym(self.dems.ang_z_rads, self.params.vel_max_ang_rads);

        self.dems
    }

    /// Bring the robot to an immediate stop: zero demands on all axes and
    /// the motion state forced back to Idle.
    fn stop(&mut self) -> VelDems {
        self.motion_state = MotionState::Idle;
        self.dems = VelDems::zero();
        self.dems
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn running_input(distance_m: f64, yaw_err_rad: f64) -> InputData {
        InputData {
            mode: NavMode::Running,
            new_goal: false,
            goal: GoalSnapshot {
                goal_set: true,
                distance_m,
                pitch_err_rad: 0.0,
                yaw_err_rad
            }
        }
    }

    #[test]
    fn test_turn_to_forward_and_ramp() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        // Distance 5 m, already facing the goal: the first cycle enters
        // Turning and immediately transitions on to Forwarding
        let input = running_input(5.0, 0.0);
        let (out, report) = ctrl.proc(&input).unwrap();
        assert_eq!(report.motion_state, MotionState::Forwarding);
        assert_eq!(out.unwrap().lin_x_ms, 0.0);

        // Each subsequent cycle ramps the linear demand monotonically by the
        // acceleration step until it hits the ceiling (the raw demand
        // k_rho * 5.0 = 1.5 is above the 1.0 ceiling)
        let mut prev_lin = 0.0;
        for _ in 0..10 {
            let (out, report) = ctrl.proc(&input).unwrap();
            let dems = out.unwrap();
            assert_eq!(report.motion_state, MotionState::Forwarding);
            assert!(dems.lin_x_ms >= prev_lin);
            assert!(dems.lin_x_ms <= 1.0);
            prev_lin = dems.lin_x_ms;
        }
        assert_eq!(prev_lin, 1.0);
    }

    #[test]
    fn test_arrival_zeroes_demands() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        // First cycle passes through Turning into Forwarding
        let (_, report) = ctrl.proc(&running_input(0.05, 0.0)).unwrap();
        assert_eq!(report.motion_state, MotionState::Forwarding);

        // Second cycle is inside the forwarding threshold: Arrived, with
        // linear and pitch/yaw demands exactly zero that cycle
        let (out, report) = ctrl.proc(&running_input(0.05, 0.0)).unwrap();
        let dems = out.unwrap();
        assert_eq!(report.motion_state, MotionState::Arrived);
        assert_eq!(dems.lin_x_ms, 0.0);
        assert_eq!(dems.ang_y_rads, 0.0);
        assert_eq!(dems.ang_z_rads, 0.0);
    }

    #[test]
    fn test_park_forces_stop_every_cycle() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        // Build up some speed first
        for _ in 0..5 {
            ctrl.proc(&running_input(5.0, 0.0)).unwrap();
        }
        assert_eq!(ctrl.motion_state(), MotionState::Forwarding);

        // Park: zero demand and Idle, every cycle, regardless of prior state
        let mut input = running_input(5.0, 0.0);
        input.mode = NavMode::Park;
        for _ in 0..3 {
            let (out, report) = ctrl.proc(&input).unwrap();
            assert!(out.unwrap().is_zero());
            assert_eq!(report.motion_state, MotionState::Idle);
        }
    }

    #[test]
    fn test_stop_transition_emits_single_zero_demand() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        for _ in 0..5 {
            ctrl.proc(&running_input(5.0, 0.0)).unwrap();
        }

        // Running to Stop: one zero demand
        let mut input = running_input(5.0, 0.0);
        input.mode = NavMode::Stop;
        let (out, report) = ctrl.proc(&input).unwrap();
        assert!(out.unwrap().is_zero());
        assert_eq!(report.motion_state, MotionState::Idle);

        // Still stopped: no further demands
        let (out, _) = ctrl.proc(&input).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_no_goal_no_demand() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        let input = InputData {
            mode: NavMode::Running,
            new_goal: false,
            goal: GoalSnapshot::default()
        };
        let (out, _) = ctrl.proc(&input).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_large_heading_error_aborts_forwarding() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        // Get into Forwarding facing the goal
        ctrl.proc(&running_input(5.0, 0.0)).unwrap();
        assert_eq!(ctrl.motion_state(), MotionState::Forwarding);

        // A heading error above pi/2 while forwarding falls back to Turning
        let (_, report) = ctrl.proc(&running_input(5.0, 2.0)).unwrap();
        assert_eq!(report.motion_state, MotionState::Turning);
    }

    #[test]
    fn test_new_goal_cancels_arrived() {
        let mut ctrl = WaypointCtrl::with_params(Params::default());

        // Arrive at a goal
        ctrl.proc(&running_input(0.05, 0.0)).unwrap();
        ctrl.proc(&running_input(0.05, 0.0)).unwrap();
        assert_eq!(ctrl.motion_state(), MotionState::Arrived);

        // A new goal re-enters Turning on the next cycle
        let mut input = running_input(3.0, 1.0);
        input.new_goal = true;
        let (_, report) = ctrl.proc(&input).unwrap();
        assert_eq!(report.motion_state, MotionState::Turning);
    }
}
