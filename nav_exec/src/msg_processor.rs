//! # Message processor module
//!
//! The message processor applies inbound messages, from whatever source, to
//! the data store. No message is ever fatal: malformed or unexpected content
//! degrades into a diagnostic and the previous state is retained.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use nav_lib::data_store::DataStore;
use nav_lib::goal_tracker::GoalOutcome;
use nav_lib::loc::Pose;
use nav_lib::tf::Transform;
use nav_if::msg::{Msg, NavMode};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply an inbound message to the data store.
pub(crate) fn exec(ds: &mut DataStore, msg: &Msg) {

    match msg {
        Msg::Goal(geo) => {
            let goal_m = ds.projection.forward(geo);

            match ds.goal_tracker.set_goal(goal_m) {
                GoalOutcome::SeededStartPose => {
                    info!("First position received, seeding the start pose");
                }
                GoalOutcome::GoalSet { attitude_bootstrap } => {
                    info!("Waypoint received");
                    ds.new_goal = true;

                    if let Some(pose) = attitude_bootstrap {
                        info!(
                            "Initial attitude bootstrapped, heading {:.3} rad",
                            pose.get_heading()
                        );
                    }
                }
            }
        },

        Msg::PoseFix(fix) => {
            ds.goal_tracker.update_pose(Pose::from(fix));
        },

        Msg::NavMode(cmd) => {
            ds.nav_mode = NavMode::from_cmd(cmd);
            info!("Navigation mode updated: {}", ds.nav_mode);
        },

        Msg::CtrlGains(gains) => {
            ds.waypoint_ctrl.set_gains(gains);
        },

        Msg::AccLimits(limits) => {
            ds.waypoint_ctrl.set_acc_limits(limits);
        },

        Msg::VelLimits(limits) => {
            ds.waypoint_ctrl.set_vel_limits(limits);
        },

        Msg::CtrlThresholds(thresholds) => {
            ds.waypoint_ctrl.set_thresholds(thresholds);
        },

        Msg::FiducialMap(entries) => {
            ds.fiducial_map.replace(entries.clone());
            info!(
                "Fiducial map updated, {} entries",
                ds.fiducial_map.len()
            );
        },

        Msg::StaticTransform(ts) => {
            match ds.tf.set_transform(
                &ts.parent_frame,
                &ts.child_frame,
                Transform::from(&ts.transform)
            ) {
                Ok(()) => info!(
                    "Static transform published: {} -> {}",
                    ts.parent_frame, ts.child_frame
                ),
                Err(e) => warn!("Rejected static transform: {}", e)
            }
        },

        Msg::MarkerDetections(batch) => {
            debug!(
                "Marker detection batch with {} entries",
                batch.transforms.len()
            );

            let mode_override = ds.reloc.handle_detections(
                batch,
                &ds.fiducial_map,
                ds.nav_mode
            );

            if let Some(mode) = mode_override {
                ds.nav_mode = mode;
                info!("Navigation mode override: {}", mode);
            }
        },

        Msg::EncoderSample(sample) => {
            ds.reloc.handle_encoder(sample);
        }
    }
}
