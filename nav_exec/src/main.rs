//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop (10 Hz):
//!         - Inbound message acquisition and processing:
//!             - Goals, pose fixes, mode commands, tuning updates
//!             - Marker detection batches and encoder samples
//!         - Relocalization manager step (on the 1 Hz sub-cycle)
//!         - Waypoint control processing
//!         - Archive writing and telemetry reporting
//!
//! Inbound messages are drained from a timed message script (the stand-in
//! for a live transport), and every module reads its inputs once at the
//! start of the cycle, so a cycle always observes a consistent snapshot of
//! the shared state.
//!
//! A navigation mode override commanded by the relocalization manager is
//! applied to the data store before waypoint control processing, so the
//! controller observes a STOP no later than the cycle it was commanded in.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use nav_lib::{
    data_store::DataStore,
    tf::Transform,
    loc::LocalProjection
};

mod msg_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, trace, warn};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use nav_lib::reloc::RelocMgr;
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingMsgs, ScriptInterpreter},
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Exec-level parameters.
#[derive(Debug, Deserialize)]
struct NavParams {
    /// The geodetic to local-planar projection configuration
    projection: LocalProjection
}

/// Summary saved into the session directory at the end of execution.
#[derive(Debug, Serialize)]
struct NavSummary {
    num_cycles: u128,
    num_corrections: u64,
    final_motion_state: String
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "nav_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Waypoint Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let nav_params: NavParams = util::params::load(
        "nav.toml"
    ).wrap_err("Could not load nav params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MESSAGE SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // The single argument is the message script to replay
    if args.len() != 2 {
        return Err(eyre!(
            "Expected exactly one argument (the message script), found {}",
            args.len() - 1)
        );
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(
        &args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} messages\n",
        script.get_duration(),
        script.get_num_msgs()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    ds.projection = nav_params.projection;

    // ---- INITIALISE MODULES ----

    ds.waypoint_ctrl.init("waypoint_ctrl.toml", &session)
        .wrap_err("Failed to initialise WaypointCtrl")?;
    info!("WaypointCtrl init complete");

    ds.reloc = RelocMgr::init("reloc.toml")
        .wrap_err("Failed to initialise RelocMgr")?;
    info!("RelocMgr init complete");

    // Load the fiducial map. A failure here is not fatal, the system runs
    // without relocalization until a valid map arrives.
    let map_path = host::get_sw_root()
        .map_err(|e| eyre!("Software root not set: {}", e))?
        .join(&ds.reloc.params().map_file);
    match ds.fiducial_map.load(&map_path) {
        Ok(n) => info!("Fiducial map initialised, {} entries", n),
        Err(e) => warn!(
            "Initialising the fiducial map from {:?} failed: {}. \
            Continuing without relocalization",
            map_path, e
        )
    }

    // Publish the robot description's static base to camera transform
    {
        let mount = &ds.reloc.params().camera_mount;
        let rpy = mount.rotation_rpy_deg;
        let tf = Transform {
            translation_m: nalgebra::Vector3::new(
                mount.translation_m[0],
                mount.translation_m[1],
                mount.translation_m[2]
            ),
            rotation_q: UnitQuaternion::from_euler_angles(
                rpy[0].to_radians(),
                rpy[1].to_radians(),
                rpy[2].to_radians()
            )
        };
        let base_frame = ds.reloc.params().base_frame.clone();
        let camera_frame = ds.reloc.params().camera_frame.clone();
        ds.tf.set_transform(&base_frame, &camera_frame, tf)
            .wrap_err("Failed to publish the camera mount transform")?;
        info!("Camera mount transform published");
    }

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- MESSAGE PROCESSING ----

        match script.get_pending_msgs() {
            PendingMsgs::None => (),
            PendingMsgs::Some(msg_vec) => {
                for msg in msg_vec.iter() {
                    msg_processor::exec(&mut ds, msg);
                }
            }
            // Exit if end of script reached
            PendingMsgs::EndOfScript => {
                info!("End of message script reached, stopping");
                break
            }
        }

        // ---- RELOCALIZATION PROCESSING ----

        // The manager steps at its own low rate, on the 1Hz sub-cycle. Its
        // overrides land in the store before waypoint control runs.
        if ds.is_1hz_cycle {
            let step_output = ds.reloc.step(
                &mut ds.tf,
                &ds.fiducial_map,
                &ds.projection
            );

            if let Some(mode) = step_output.mode_override {
                ds.nav_mode = mode;
                info!("Navigation mode override: {}", mode);
            }

            if let Some(fix) = step_output.corrected_fix {
                info!(
                    "Corrected pose fix applied: ({:.2}, {:.2}, {:.2})",
                    fix.position_m[0], fix.position_m[1], fix.position_m[2]
                );
                ds.goal_tracker.update_pose(fix);
                ds.num_corrections += 1;
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.build_ctrl_input();

        match ds.waypoint_ctrl.proc(&ds.waypoint_ctrl_input) {
            Ok((output, report)) => {
                ds.waypoint_ctrl_output = output;
                ds.waypoint_ctrl_status_rpt = report;
            },
            Err(e) => {
                // Controller errors degrade to a warning, the loop never
                // stops for them
                warn!("Error during WaypointCtrl processing: {}", e)
            }
        };

        // Publish the demands
        if let Some(dems) = ds.waypoint_ctrl_output {
            trace!(
                "VelDems: lin {:.3} m/s, ang ({:.3}, {:.3}, {:.3}) rad/s",
                dems.lin_x_ms,
                dems.ang_x_rads,
                dems.ang_y_rads,
                dems.ang_z_rads
            );
        }

        // Report the motion state on the 1Hz cycle
        if ds.is_1hz_cycle {
            debug!(
                "Motion state: {}, reloc state: {}, distance remaining: {:.2} m",
                ds.waypoint_ctrl_status_rpt.motion_state,
                ds.reloc.state(),
                ds.waypoint_ctrl_status_rpt.distance_m
            );
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.waypoint_ctrl.write() {
            warn!("Could not write WaypointCtrl archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64()
                        - Duration::from_secs_f64(CYCLE_PERIOD_S).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    session.save("nav_summary.json", NavSummary {
        num_cycles: ds.num_cycles,
        num_corrections: ds.num_corrections,
        final_motion_state: format!("{}", ds.waypoint_ctrl.motion_state())
    });

    session.exit();

    info!("End of execution");

    Ok(())
}
